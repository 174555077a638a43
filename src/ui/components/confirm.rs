use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the confirmation dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEvent {
  Confirmed,
  Rejected,
}

/// Yes/no confirmation overlay used before destructive transitions
/// (cancelling a proposal).
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
  message: Option<String>,
}

impl ConfirmDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.message.is_some()
  }

  pub fn show(&mut self, message: impl Into<String>) {
    self.message = Some(message.into());
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if self.message.is_none() {
      return KeyResult::NotHandled;
    }
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
        self.message = None;
        KeyResult::Event(ConfirmEvent::Confirmed)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
        self.message = None;
        KeyResult::Event(ConfirmEvent::Rejected)
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the confirmation overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(message) = &self.message else {
      return;
    };

    let width = (area.width * 60 / 100).clamp(30, 64);
    let text_width = width.saturating_sub(4).max(1) as usize;
    let line_count: usize = message
      .lines()
      .map(|l| l.chars().count().div_ceil(text_width).max(1))
      .sum();
    let height = (line_count as u16 + 3).min(area.height.saturating_sub(2)).max(4);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Confirm ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(inner);

    let body = Paragraph::new(message.as_str()).wrap(Wrap { trim: false });
    frame.render_widget(body, chunks[0]);

    let hint = Paragraph::new("[y]es  [n]o").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, chunks[1]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_yes_confirms() {
    let mut confirm = ConfirmDialog::new();
    confirm.show("Cancel proposal 42 attached to demand 7?");
    assert_eq!(
      confirm.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event(ConfirmEvent::Confirmed)
    );
    assert!(!confirm.is_active());
  }

  #[test]
  fn test_escape_rejects() {
    let mut confirm = ConfirmDialog::new();
    confirm.show("Sure?");
    assert_eq!(
      confirm.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(ConfirmEvent::Rejected)
    );
  }
}
