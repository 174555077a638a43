//! Grid cell text for the demand table.

use crate::api::types::{Demand, State};
use crate::format;

/// Demand key cell, marked with the record glyph.
pub fn demand_key_cell(demand: &Demand) -> String {
  format!("◆ {}", demand.key)
}

/// Proposal keys cell for a demand row.
///
/// When the demand is still published, the cell leads with the
/// create-proposal action; every existing key follows, wrapped as an
/// update action (`[key*]`) while the demand is modifiable and as a
/// view-only entry (`[key]`) once it no longer is.
pub fn proposal_keys_cell(demand: &Demand) -> String {
  let modifiable = demand.state == State::Published;

  let mut cell = String::new();
  if modifiable {
    cell.push_str("[+ propose]");
  }

  let keys = format::display_proposal_keys(demand.proposal_keys.as_ref(), |proposal_key| {
    if modifiable {
      format!("[{proposal_key}*]")
    } else {
      format!("[{proposal_key}]")
    }
  });
  if keys.is_empty() {
    return cell;
  }

  if !cell.is_empty() {
    cell.push(' ');
  }
  cell.push_str(&keys);
  cell
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn demand(state: State, proposal_keys: Option<serde_json::Value>) -> Demand {
    Demand {
      key: 7,
      state,
      proposal_keys,
      ..Demand::default()
    }
  }

  #[test]
  fn test_published_row_offers_create() {
    let cell = proposal_keys_cell(&demand(State::Published, None));
    assert_eq!(cell, "[+ propose]");
  }

  #[test]
  fn test_non_published_row_has_no_create() {
    for state in [State::Confirmed, State::Declined, State::Cancelled, State::Closed] {
      let cell = proposal_keys_cell(&demand(state, Some(json!([42]))));
      assert!(!cell.contains("propose"), "state {state:?} offered create");
    }
  }

  #[test]
  fn test_published_row_wraps_keys_as_update() {
    let cell = proposal_keys_cell(&demand(State::Published, Some(json!([42, 77]))));
    assert_eq!(cell, "[+ propose] [42*] [77*]");
  }

  #[test]
  fn test_closed_row_wraps_keys_view_only() {
    let cell = proposal_keys_cell(&demand(State::Closed, Some(json!([42]))));
    assert_eq!(cell, "[42]");
  }

  #[test]
  fn test_malformed_keys_render_placeholder() {
    let cell = proposal_keys_cell(&demand(State::Closed, Some(json!(42))));
    assert_eq!(cell, format::INVALID_DATA);
  }

  #[test]
  fn test_demand_key_cell() {
    assert_eq!(demand_key_cell(&demand(State::Published, None)), "◆ 7");
  }
}
