use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::api_types::Related;

/// Lifecycle state of a demand or proposal.
///
/// The backend owns the full value set and the legality of transitions;
/// the console only derives which actions it offers from the states it
/// knows about. Values this build has never heard of land on `Unknown`
/// instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
  #[default]
  Open,
  Published,
  Invalid,
  Confirmed,
  Declined,
  Cancelled,
  Closed,
  #[serde(other)]
  Unknown,
}

impl State {
  /// Human label for grid cells and form fields.
  pub fn label(&self) -> &'static str {
    match self {
      State::Open => "Open",
      State::Published => "Published",
      State::Invalid => "Invalid",
      State::Confirmed => "Confirmed",
      State::Declined => "Declined",
      State::Cancelled => "Cancelled",
      State::Closed => "Closed",
      State::Unknown => "Unknown",
    }
  }
}

/// Acting role a query is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointOfView {
  #[default]
  Consumer,
  SaleAssociate,
}

impl PointOfView {
  /// Wire form used in the `pointOfView` query parameter.
  pub fn as_query(&self) -> &'static str {
    match self {
      PointOfView::Consumer => "CONSUMER",
      PointOfView::SaleAssociate => "SALE_ASSOCIATE",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      PointOfView::Consumer => "consumer",
      PointOfView::SaleAssociate => "sale associate",
    }
  }
}

/// Buyer-side request record.
///
/// `criteria`, `cc` and `proposal_keys` stay loosely typed: the grid
/// renders whatever the backend sent through the defensive formatters,
/// so a malformed field degrades to a placeholder cell instead of
/// rejecting the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Demand {
  pub key: u64,
  pub state: State,
  pub quantity: u32,
  pub due_date: String,
  pub criteria: Option<Value>,
  pub cc: Option<Value>,
  pub proposal_keys: Option<Value>,
  pub modification_date: String,
  pub location_key: Option<u64>,
  /// Sideloaded records answering the `related` query parameter.
  /// Consumed (and dropped) when the demand is ingested into the store.
  #[serde(skip_serializing)]
  pub related: Option<Related>,
}

/// Seller-side offer record answering a demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Proposal {
  pub key: u64,
  pub state: State,
  pub price: f64,
  pub total: f64,
  pub quantity: u32,
  pub due_date: String,
  pub criteria: Option<Value>,
  pub demand_key: u64,
  pub modification_date: String,
}

/// Place a demand is anchored to. Referenced by key, never owned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
  pub key: u64,
  pub postal_code: String,
  pub country_code: String,
}

/// Tolerant extraction of a key list from a loosely-typed wire field.
///
/// Accepts numbers and numeric strings; anything else is skipped.
pub fn key_list(value: Option<&Value>) -> Vec<u64> {
  let Some(Value::Array(items)) = value else {
    return Vec::new();
  };
  items
    .iter()
    .filter_map(|v| {
      v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_state_wire_names() {
    assert_eq!(serde_json::to_value(State::Published).unwrap(), json!("published"));
    assert_eq!(serde_json::to_value(State::Cancelled).unwrap(), json!("cancelled"));
    let state: State = serde_json::from_value(json!("confirmed")).unwrap();
    assert_eq!(state, State::Confirmed);
  }

  #[test]
  fn test_unknown_state_is_absorbed() {
    let state: State = serde_json::from_value(json!("escalated")).unwrap();
    assert_eq!(state, State::Unknown);
  }

  #[test]
  fn test_point_of_view_wire_names() {
    assert_eq!(PointOfView::Consumer.as_query(), "CONSUMER");
    assert_eq!(PointOfView::SaleAssociate.as_query(), "SALE_ASSOCIATE");
  }

  #[test]
  fn test_key_list_mixed_entries() {
    let value = json!([42, "77", "not-a-key", null]);
    assert_eq!(key_list(Some(&value)), vec![42, 77]);
  }

  #[test]
  fn test_key_list_non_array() {
    assert_eq!(key_list(Some(&json!("42"))), Vec::<u64>::new());
    assert_eq!(key_list(None), Vec::<u64>::new());
  }

  #[test]
  fn test_demand_wire_shape() {
    let demand: Demand = serde_json::from_value(json!({
      "key": 1042,
      "state": "published",
      "quantity": 4,
      "dueDate": "2024-01-15T10:30:00Z",
      "criteria": ["green", "fees"],
      "proposalKeys": [42, 77],
      "modificationDate": "2024-01-10T08:00:00Z",
      "locationKey": 9
    }))
    .unwrap();
    assert_eq!(demand.key, 1042);
    assert_eq!(demand.state, State::Published);
    assert_eq!(demand.location_key, Some(9));
    assert_eq!(key_list(demand.proposal_keys.as_ref()), vec![42, 77]);
  }
}
