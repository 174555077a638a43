use crate::api::types::State;
use ratatui::prelude::Color;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{cut}...")
  }
}

/// Display color for a lifecycle state
pub fn state_color(state: State) -> Color {
  match state {
    State::Published => Color::Green,
    State::Confirmed => Color::Yellow,
    State::Declined | State::Cancelled | State::Invalid => Color::Red,
    State::Closed => Color::DarkGray,
    State::Open | State::Unknown => Color::White,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_state_colors() {
    assert_eq!(state_color(State::Published), Color::Green);
    assert_eq!(state_color(State::Confirmed), Color::Yellow);
    assert_eq!(state_color(State::Cancelled), Color::Red);
    assert_eq!(state_color(State::Closed), Color::DarkGray);
  }
}
