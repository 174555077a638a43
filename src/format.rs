//! Display formatters for grid cells and form fields.
//!
//! These are total functions over whatever the backend sent: malformed
//! input (a non-list where a list belongs, an unparseable date) renders
//! as the fixed [`INVALID_DATA`] marker and logs the offending value,
//! so a bad field never breaks a row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tracing::warn;

use crate::api::store::RecordStore;

/// Placeholder rendered in place of data that could not be displayed.
pub const INVALID_DATA: &str = "<invalid data>";

/// Date formatter, day granularity: `Jan 15, 2024`.
pub fn display_date(serialized: &str) -> String {
  match parse_iso(serialized) {
    Some(date_time) => date_time.format("%b %d, %Y").to_string(),
    None => {
      warn!(input = serialized, "display_date: unparseable date");
      INVALID_DATA.to_string()
    }
  }
}

/// Date formatter, minute granularity: `Jan 15, 2024 10:30`.
pub fn display_date_time(serialized: &str) -> String {
  match parse_iso(serialized) {
    Some(date_time) => date_time.format("%b %d, %Y %H:%M").to_string(),
    None => {
      warn!(input = serialized, "display_date_time: unparseable date");
      INVALID_DATA.to_string()
    }
  }
}

/// Criteria formatter: the tag list joined with spaces.
pub fn display_criteria(criteria: Option<&Value>) -> String {
  let Some(criteria) = criteria else {
    return String::new();
  };
  match criteria {
    Value::Null => String::new(),
    Value::Array(items) => items.iter().map(as_text).collect::<Vec<_>>().join(" "),
    other => {
      warn!(input = %other, "display_criteria: not a list");
      INVALID_DATA.to_string()
    }
  }
}

/// CC formatter: one segment per entry, in input order.
///
/// An entry carrying a leading `@` sigil, or no `@` at all, is a social
/// handle and renders as `@name`; everything else is an email address
/// and renders in mailto form, `<addr>`.
pub fn display_cc_list(cc_list: Option<&Value>) -> String {
  let Some(cc_list) = cc_list else {
    return String::new();
  };
  match cc_list {
    Value::Null => String::new(),
    Value::Array(items) => items
      .iter()
      .map(|item| {
        let cc = as_text(item);
        if let Some(handle) = cc.strip_prefix('@') {
          format!("@{handle}")
        } else if !cc.contains('@') {
          format!("@{cc}")
        } else {
          format!("<{cc}>")
        }
      })
      .collect::<Vec<_>>()
      .join(" "),
    other => {
      warn!(input = %other, "display_cc_list: not a list");
      INVALID_DATA.to_string()
    }
  }
}

/// Proposal-key formatter: the caller-supplied decoration applied per
/// key, segments joined with spaces.
pub fn display_proposal_keys<F>(proposal_keys: Option<&Value>, decorate: F) -> String
where
  F: Fn(&str) -> String,
{
  let Some(proposal_keys) = proposal_keys else {
    return String::new();
  };
  match proposal_keys {
    Value::Null => String::new(),
    Value::Array(items) => items
      .iter()
      .map(|item| decorate(&as_text(item)))
      .collect::<Vec<_>>()
      .join(" "),
    other => {
      warn!(input = %other, "display_proposal_keys: not a list");
      INVALID_DATA.to_string()
    }
  }
}

/// Locale formatter: postal and country codes looked up through the
/// location cache.
pub fn display_locale(location_key: Option<u64>, store: &RecordStore) -> String {
  let Some(location_key) = location_key else {
    return String::new();
  };
  match store.location(location_key) {
    Some(location) => format!("{} {}", location.postal_code, location.country_code),
    None => INVALID_DATA.to_string(),
  }
}

/// Split a free-form criteria input on whitespace, commas and
/// semicolons.
pub fn split_criteria(input: &str) -> Vec<String> {
  input
    .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
    .filter(|part| !part.is_empty())
    .map(str::to_string)
    .collect()
}

/// Combine separate date (`2024-01-15`) and time (`10:30`) inputs into
/// one ISO-8601 timestamp, `2024-01-15T10:30:00Z`.
pub fn to_iso_string(date: &str, time: &str) -> Option<String> {
  let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
  let time = parse_time(time.trim())?;
  Some(date.and_time(time).format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

fn parse_time(input: &str) -> Option<NaiveTime> {
  NaiveTime::parse_from_str(input, "%H:%M:%S")
    .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
    .ok()
}

/// ISO-8601 parsing, tolerant of a missing offset or a bare date.
/// Timestamps are displayed in their own clock, no local conversion.
pub fn parse_iso(input: &str) -> Option<NaiveDateTime> {
  if let Ok(date_time) = DateTime::parse_from_rfc3339(input) {
    return Some(date_time.naive_utc());
  }
  if let Ok(date_time) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
    return Some(date_time);
  }
  NaiveDate::parse_from_str(input, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn as_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_display_date_valid() {
    assert_eq!(display_date("2024-01-15T10:30:00Z"), "Jan 15, 2024");
    assert_eq!(display_date("2024-01-15"), "Jan 15, 2024");
  }

  #[test]
  fn test_display_date_time_valid() {
    assert_eq!(display_date_time("2024-01-15T10:30:00Z"), "Jan 15, 2024 10:30");
  }

  #[test]
  fn test_date_placeholder_on_junk() {
    assert_eq!(display_date("not-a-date"), INVALID_DATA);
    assert_eq!(display_date_time("not-a-date"), INVALID_DATA);
    assert_eq!(display_date(""), INVALID_DATA);
  }

  #[test]
  fn test_display_criteria_joins_in_order() {
    let value = json!(["green", "fees", "×4"]);
    assert_eq!(display_criteria(Some(&value)), "green fees ×4");
  }

  #[test]
  fn test_display_criteria_null_and_missing() {
    assert_eq!(display_criteria(None), "");
    assert_eq!(display_criteria(Some(&Value::Null)), "");
  }

  #[test]
  fn test_display_criteria_non_list() {
    assert_eq!(display_criteria(Some(&json!("green fees"))), INVALID_DATA);
    assert_eq!(display_criteria(Some(&json!(42))), INVALID_DATA);
  }

  #[test]
  fn test_display_cc_list_segments() {
    let value = json!(["@jack", "jill", "joe@example.com"]);
    assert_eq!(
      display_cc_list(Some(&value)),
      "@jack @jill <joe@example.com>"
    );
  }

  #[test]
  fn test_display_cc_list_non_list() {
    assert_eq!(display_cc_list(Some(&json!({"cc": []}))), INVALID_DATA);
  }

  #[test]
  fn test_display_proposal_keys_decorated_in_order() {
    let value = json!([42, 77]);
    let rendered = display_proposal_keys(Some(&value), |key| format!("[{key}]"));
    assert_eq!(rendered, "[42] [77]");
  }

  #[test]
  fn test_display_proposal_keys_non_list() {
    let rendered = display_proposal_keys(Some(&json!(42)), |key| format!("[{key}]"));
    assert_eq!(rendered, INVALID_DATA);
  }

  #[test]
  fn test_display_locale() {
    use crate::api::types::{Demand, Location};
    use crate::api::api_types::Related;

    let mut store = RecordStore::default();
    store.ingest_demands(vec![Demand {
      key: 1,
      location_key: Some(3),
      related: Some(Related {
        locations: vec![Location {
          key: 3,
          postal_code: "H3C 2N6".to_string(),
          country_code: "CA".to_string(),
        }],
      }),
      ..Demand::default()
    }]);

    assert_eq!(display_locale(Some(3), &store), "H3C 2N6 CA");
    assert_eq!(display_locale(Some(99), &store), INVALID_DATA);
    assert_eq!(display_locale(None, &store), "");
  }

  #[test]
  fn test_split_criteria() {
    assert_eq!(
      split_criteria("green fees,  twosome;\nsunday"),
      vec!["green", "fees", "twosome", "sunday"]
    );
    assert!(split_criteria("  ").is_empty());
  }

  #[test]
  fn test_to_iso_string() {
    assert_eq!(
      to_iso_string("2024-01-15", "10:30").as_deref(),
      Some("2024-01-15T10:30:00Z")
    );
    assert_eq!(
      to_iso_string("2024-01-15", "10:30:45").as_deref(),
      Some("2024-01-15T10:30:45Z")
    );
    assert_eq!(to_iso_string("someday", "10:30"), None);
    assert_eq!(to_iso_string("2024-01-15", "soon"), None);
  }
}
