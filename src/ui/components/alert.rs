use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Blocking error dialog. Failed requests land here: the server message
/// (with the request URL for rejections) stays up until dismissed.
#[derive(Debug, Clone, Default)]
pub struct AlertDialog {
  message: Option<String>,
}

impl AlertDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.message.is_some()
  }

  pub fn show(&mut self, message: impl Into<String>) {
    self.message = Some(message.into());
  }

  /// Handle a key event; any key while active is consumed, Enter/Esc
  /// dismiss.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<()> {
    if self.message.is_none() {
      return KeyResult::NotHandled;
    }
    match key.code {
      KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => {
        self.message = None;
        KeyResult::Event(())
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the alert overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(message) = &self.message else {
      return;
    };

    let width = (area.width * 70 / 100).clamp(30, 70);
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
      .border_style(Style::default().fg(Color::Red))
      .title(" Error ");

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

    let hint = Paragraph::new("<Enter> dismiss").style(Style::default().fg(Color::DarkGray));
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
  fn test_inactive_passes_keys_through() {
    let mut alert = AlertDialog::new();
    assert_eq!(alert.handle_key(key(KeyCode::Char('j'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_active_blocks_until_dismissed() {
    let mut alert = AlertDialog::new();
    alert.show("Reserved operation\nurl: http://x/API/Proposal/42");
    assert_eq!(alert.handle_key(key(KeyCode::Char('j'))), KeyResult::Handled);
    assert!(alert.is_active());
    assert_eq!(alert.handle_key(key(KeyCode::Enter)), KeyResult::Event(()));
    assert!(!alert.is_active());
  }
}
