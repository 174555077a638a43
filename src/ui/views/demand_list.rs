use crate::api::sync::SyncClient;
use crate::api::types::{key_list, Demand, PointOfView, State};
use crate::fetch::{Fetch, FetchState};
use crate::format;
use crate::ui::components::{AlertDialog, KeyResult, ProposalPicker, ProposalPickerEvent};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{demand_key_cell, proposal_keys_cell, state_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::ProposalFormView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use std::time::{Duration, Instant};

/// The demand grid: every cached demand, one row each, kept current by
/// incremental polling.
pub struct DemandListView {
  sync: SyncClient,
  point_of_view: PointOfView,
  demands: Fetch<Vec<Demand>>,
  table_state: TableState,
  alert: AlertDialog,
  picker: ProposalPicker,
  /// Key of the demand the picker is currently open for
  picker_demand_key: Option<u64>,
  refresh_every: Duration,
  last_refresh: Instant,
}

impl DemandListView {
  pub fn new(sync: SyncClient, point_of_view: PointOfView, refresh_every: Duration) -> Self {
    // The fetcher reads the watermark at request time: the first run
    // (empty store) loads all active demands, every later one only
    // those modified since.
    let fetch_sync = sync.clone();
    let demands = Fetch::spawn(move || {
      let sync = fetch_sync.clone();
      async move {
        sync
          .refresh_demands(Some(point_of_view))
          .await
          .map_err(|e| e.to_string())
      }
    });

    Self {
      sync,
      point_of_view,
      demands,
      table_state: TableState::default(),
      alert: AlertDialog::new(),
      picker: ProposalPicker::new(),
      picker_demand_key: None,
      refresh_every,
      last_refresh: Instant::now(),
    }
  }

  fn rows(&self) -> &[Demand] {
    self.demands.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected_demand(&self) -> Option<&Demand> {
    self.table_state.selected().and_then(|i| self.rows().get(i))
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.rows().len();
    if len == 0 {
      return;
    }
    let current = self.table_state.selected().unwrap_or(0) as i32;
    let next = (current + delta).rem_euclid(len as i32) as usize;
    self.table_state.select(Some(next));
  }

  fn open_form(&self, demand: Demand, proposal_key: Option<u64>) -> ViewAction {
    ViewAction::Push(Box::new(ProposalFormView::new(
      self.sync.clone(),
      self.point_of_view,
      demand,
      proposal_key,
    )))
  }

  /// Enter on a row: open its proposal when there is exactly one, the
  /// picker when there are several, and the create form when there are
  /// none and the demand still takes proposals.
  fn enter_selected(&mut self) -> ViewAction {
    let Some(demand) = self.selected_demand().cloned() else {
      return ViewAction::None;
    };
    let proposal_keys = key_list(demand.proposal_keys.as_ref());
    match proposal_keys.len() {
      0 if demand.state == State::Published => self.open_form(demand, None),
      0 => ViewAction::None,
      1 => {
        let only = proposal_keys[0];
        self.open_form(demand, Some(only))
      }
      _ => {
        self.picker_demand_key = Some(demand.key);
        self.picker.show(demand.key, demand.state, proposal_keys);
        ViewAction::None
      }
    }
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.rows().len();
    ensure_valid_selection(&mut self.table_state, len);

    let title = match self.demands.state() {
      FetchState::Busy => " Demands (loading...) ".to_string(),
      FetchState::Failed(error) => {
        let first_line = error.lines().next().unwrap_or(error.as_str());
        format!(" Demands (error: {}) ", truncate(first_line, 48))
      }
      _ => format!(" Demands ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.rows().is_empty() {
      let content = if self.demands.is_busy() {
        "Loading demands..."
      } else if self.demands.error().is_some() {
        "Failed to load demands. Press 'r' to retry."
      } else {
        "No demands found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let header = Row::new(vec![
      "Key", "State", "Qty", "Due", "Criteria", "CC", "Where", "Proposals", "Modified",
    ])
    .style(Style::default().fg(Color::DarkGray));

    let rows: Vec<Row> = self
      .rows()
      .iter()
      .map(|demand| {
        Row::new(vec![
          Cell::from(demand_key_cell(demand)).style(Style::default().fg(Color::Cyan)),
          Cell::from(demand.state.label())
            .style(Style::default().fg(state_color(demand.state))),
          Cell::from(demand.quantity.to_string()),
          Cell::from(format::display_date(&demand.due_date)),
          Cell::from(truncate(
            &format::display_criteria(demand.criteria.as_ref()),
            24,
          )),
          Cell::from(truncate(&format::display_cc_list(demand.cc.as_ref()), 16)),
          Cell::from(self.sync.locale(demand.location_key)),
          Cell::from(proposal_keys_cell(demand)),
          Cell::from(format::display_date_time(&demand.modification_date)),
        ])
      })
      .collect();

    let widths = [
      Constraint::Length(8),
      Constraint::Length(10),
      Constraint::Length(4),
      Constraint::Length(13),
      Constraint::Min(16),
      Constraint::Length(16),
      Constraint::Length(12),
      Constraint::Min(18),
      Constraint::Length(18),
    ];

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl View for DemandListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.alert.handle_key(key) {
      KeyResult::NotHandled => {}
      _ => return ViewAction::None,
    }

    match self.picker.handle_key(key) {
      KeyResult::Event(ProposalPickerEvent::Selected(proposal_key)) => {
        let demand = self
          .picker_demand_key
          .take()
          .and_then(|key| self.sync.cached_demand(key));
        if let Some(demand) = demand {
          return self.open_form(demand, Some(proposal_key));
        }
        return ViewAction::None;
      }
      KeyResult::Event(ProposalPickerEvent::Cancelled) => {
        self.picker_demand_key = None;
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('n') => {
        if let Some(demand) = self.selected_demand().cloned() {
          if demand.state == State::Published {
            return self.open_form(demand, None);
          }
        }
      }
      KeyCode::Enter => return self.enter_selected(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_table(frame, area);
    self.picker.render_overlay(frame, area);
    self.alert.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("Demands [{}]", self.point_of_view.label())
  }

  fn tick(&mut self) -> ViewAction {
    if self.demands.poll() {
      if let Some(error) = self.demands.error() {
        self.alert.show(error.to_string());
      }
    }
    // Standing refresh timer; any refresh (manual, scheduled, or this
    // one) rearms it.
    if !self.demands.is_busy() && self.last_refresh.elapsed() >= self.refresh_every {
      self.refresh();
    }
    ViewAction::None
  }

  fn refresh(&mut self) {
    self.last_refresh = Instant::now();
    self.demands.restart();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("n", "propose"),
      Shortcut::new("enter", "open"),
      Shortcut::new("r", "refresh"),
      Shortcut::new(":", "command"),
      Shortcut::new("q", "quit"),
    ]
  }
}
