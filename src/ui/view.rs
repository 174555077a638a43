use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use std::time::Duration;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Actions that a view can request in response to user input or a
/// completed fetch
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Pop current view, then refresh the revealed view after the delay.
  /// A zero delay refreshes on the next tick; the ~7s delay after a
  /// proposal submission leaves the backend time for its side effects.
  PopAndRefresh(Duration),
}

/// Trait for view behavior
///
/// Views handle their own input modes (form editing, overlays) and
/// return actions for the App to execute. This creates a clean
/// delegation chain: App → View → Components
///
/// Views that load data asynchronously hold a `Fetch<T>` internally and
/// poll it in `tick()`; a completed fetch may itself produce an action
/// (a submitted form pops itself).
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to poll pending fetches and timers
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// Trigger a data refresh, if the view has data to refresh.
  /// Called by the App for scheduled refreshes and the `:refresh`
  /// command.
  fn refresh(&mut self) {}

  /// Whether this view is consuming free-form text input. While true
  /// the App does not treat `:` as command-palette activation, so form
  /// fields can contain it.
  fn wants_text_input(&self) -> bool {
    false
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new(":", "command"), Shortcut::new("q", "back")]
  }
}
