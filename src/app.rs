use crate::api::sync::SyncClient;
use crate::api::types::PointOfView;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header, extract_domain};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::DemandListView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};

/// Main application state: the view stack plus the session-wide sync
/// client every view shares.
pub struct App {
  /// Navigation stack - root is always at index 0
  views: Vec<Box<dyn View>>,

  /// Command palette (after pressing :)
  command: CommandInput,

  /// Session-wide sync client and record store
  sync: SyncClient,

  config: Config,

  /// Acting role for queries; switched with :associate / :consumer
  point_of_view: PointOfView,

  /// Deferred refresh requested by a popped view (post-submit)
  pending_refresh: Option<Instant>,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config, point_of_view: PointOfView) -> Result<Self> {
    let sync = SyncClient::new(&config)?;
    let refresh_every = Duration::from_secs(config.refresh.interval_secs);

    Ok(Self {
      views: vec![Box::new(DemandListView::new(
        sync.clone(),
        point_of_view,
        refresh_every,
      ))],
      command: CommandInput::new(),
      sync,
      config,
      point_of_view,
      pending_refresh: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Footer breadcrumb
      ])
      .split(frame.area());

    let title = self
      .config
      .title
      .clone()
      .unwrap_or_else(|| extract_domain(&self.config.marketplace.url).to_string());
    let shortcuts = self
      .views
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default();
    draw_header(
      frame,
      chunks[0],
      &title,
      self.point_of_view.label(),
      &shortcuts,
    );

    if let Some(view) = self.views.last_mut() {
      view.render(frame, chunks[1]);
    }

    let breadcrumb: Vec<String> = self.views.iter().map(|v| v.breadcrumb_label()).collect();
    draw_footer(frame, chunks[2], &breadcrumb);

    self.command.render_overlay(frame, chunks[1]);
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
          self.should_quit = true;
          return;
        }

        // A view editing free-form text keeps ':' for itself; the
        // palette still gets keys once it is open.
        let editing = self
          .views
          .last()
          .is_some_and(|view| view.wants_text_input());
        let command_result = if self.command.is_active() || !editing {
          self.command.handle_key(key)
        } else {
          KeyResult::NotHandled
        };

        match command_result {
          KeyResult::Event(CommandEvent::Submitted(cmd)) => self.execute_command(&cmd),
          KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => {}
          KeyResult::NotHandled => {
            let action = match self.views.last_mut() {
              Some(view) => view.handle_key(key),
              None => ViewAction::None,
            };
            self.apply_action(action);
          }
        }
      }
      Event::Tick => {
        // Every stacked view polls its fetches; only the top view's
        // resulting action is applied (lower views never produce one).
        let mut action = ViewAction::None;
        for view in self.views.iter_mut() {
          action = view.tick();
        }
        self.apply_action(action);

        if self
          .pending_refresh
          .is_some_and(|due| Instant::now() >= due)
        {
          self.pending_refresh = None;
          if let Some(view) = self.views.last_mut() {
            view.refresh();
          }
        }
      }
    }
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.views.push(view),
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::PopAndRefresh(delay) => {
        if self.views.len() > 1 {
          self.views.pop();
        }
        self.pending_refresh = Some(Instant::now() + delay);
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    match cmd {
      "demands" => self.reset_root(),
      "refresh" => {
        if let Some(view) = self.views.last_mut() {
          view.refresh();
        }
      }
      "associate" => {
        self.point_of_view = PointOfView::SaleAssociate;
        self.reset_root();
      }
      "consumer" => {
        self.point_of_view = PointOfView::Consumer;
        self.reset_root();
      }
      "quit" => {
        self.should_quit = true;
      }
      _ => {
        // Unknown command
      }
    }
  }

  fn reset_root(&mut self) {
    let refresh_every = Duration::from_secs(self.config.refresh.interval_secs);
    self.views = vec![Box::new(DemandListView::new(
      self.sync.clone(),
      self.point_of_view,
      refresh_every,
    ))];
    self.pending_refresh = None;
  }
}
