use super::KeyResult;
use crate::api::types::State;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by the proposal picker that the parent handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalPickerEvent {
  /// A proposal key was chosen
  Selected(u64),
  /// Picker cancelled
  Cancelled,
}

/// Picker shown when a demand row carries more than one proposal.
/// Entries are labelled update or view depending on whether the demand
/// is still open for changes.
#[derive(Debug, Clone, Default)]
pub struct ProposalPicker {
  active: bool,
  keys: Vec<u64>,
  modifiable: bool,
  selected: usize,
  title: String,
}

impl ProposalPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker for a demand's proposals
  pub fn show(&mut self, demand_key: u64, demand_state: State, keys: Vec<u64>) {
    self.active = true;
    self.modifiable = demand_state == State::Published;
    self.keys = keys;
    self.selected = 0;
    self.title = format!(" Proposals for demand {demand_key} ");
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.keys.clear();
    self.selected = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ProposalPickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(ProposalPickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        if let Some(proposal_key) = self.keys.get(self.selected).copied() {
          self.hide();
          KeyResult::Event(ProposalPickerEvent::Selected(proposal_key))
        } else {
          self.hide();
          KeyResult::Event(ProposalPickerEvent::Cancelled)
        }
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.keys.is_empty() {
          self.selected = (self.selected + 1) % self.keys.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.keys.is_empty() {
          self.selected = if self.selected == 0 {
            self.keys.len() - 1
          } else {
            self.selected - 1
          };
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the picker overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active || self.keys.is_empty() {
      return;
    }

    let width = (self.title.chars().count() as u16 + 4)
      .max(28)
      .min(area.width.saturating_sub(4));
    let height = (self.keys.len() as u16 + 2).clamp(3, area.height.saturating_sub(4));

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(self.title.clone());

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let action = if self.modifiable { "update" } else { "view" };
    let items: Vec<ListItem> = self
      .keys
      .iter()
      .map(|proposal_key| {
        let line = Line::from(vec![
          Span::styled(
            format!("{proposal_key:<10}"),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(action, Style::default().fg(Color::DarkGray)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}
