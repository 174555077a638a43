//! Serde types matching the marketplace REST envelope.
//!
//! Every endpoint answers the same JSON envelope shape; these types are
//! separate from the domain records so envelope handling stays in one
//! place.

use serde::Deserialize;

use super::error::ClientError;
use super::types::Location;

/// Response envelope shared by all `/API/...` endpoints:
/// `{ success, resource?, resources?, message? }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
  #[serde(default)]
  pub success: bool,
  pub resource: Option<T>,
  pub resources: Option<Vec<T>>,
  pub message: Option<String>,
}

impl<T> Envelope<T> {
  /// Unwrap a single-record response, turning a `success: false` answer
  /// into the rejection error the alert dialog displays.
  pub fn into_resource(self, url: &str) -> Result<T, ClientError> {
    if !self.success {
      return Err(ClientError::rejected(self.message, url));
    }
    self.resource.ok_or_else(|| ClientError::EmptyEnvelope {
      url: url.to_string(),
    })
  }

  /// Unwrap a list response. An envelope without `resources` means an
  /// empty result, not an error.
  pub fn into_resources(self, url: &str) -> Result<Vec<T>, ClientError> {
    if !self.success {
      return Err(ClientError::rejected(self.message, url));
    }
    Ok(self.resources.unwrap_or_default())
  }
}

/// Records sideloaded next to a demand when the query asked for
/// `related=Location`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Related {
  #[serde(default, rename = "Location")]
  pub locations: Vec<Location>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::Demand;
  use serde_json::json;

  #[test]
  fn test_envelope_success_with_resources() {
    let envelope: Envelope<Demand> = serde_json::from_value(json!({
      "success": true,
      "resources": [
        { "key": 1, "state": "published" },
        { "key": 2, "state": "confirmed" }
      ]
    }))
    .unwrap();
    let demands = envelope.into_resources("http://x/API/Demand/").unwrap();
    assert_eq!(demands.len(), 2);
    assert_eq!(demands[0].key, 1);
  }

  #[test]
  fn test_envelope_success_without_resources_is_empty() {
    let envelope: Envelope<Demand> =
      serde_json::from_value(json!({ "success": true })).unwrap();
    let demands = envelope.into_resources("http://x/API/Demand/").unwrap();
    assert!(demands.is_empty());
  }

  #[test]
  fn test_envelope_rejection_carries_message_and_url() {
    let envelope: Envelope<Demand> = serde_json::from_value(json!({
      "success": false,
      "message": "Reserved operation"
    }))
    .unwrap();
    let err = envelope
      .into_resource("http://x/API/Demand/42")
      .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("Reserved operation"));
    assert!(text.contains("http://x/API/Demand/42"));
  }

  #[test]
  fn test_related_locations() {
    let envelope: Envelope<Demand> = serde_json::from_value(json!({
      "success": true,
      "resources": [{
        "key": 7,
        "related": {
          "Location": [{ "key": 3, "postalCode": "H3C 2N6", "countryCode": "CA" }]
        }
      }]
    }))
    .unwrap();
    let demands = envelope.into_resources("http://x/API/Demand/").unwrap();
    let related = demands[0].related.as_ref().unwrap();
    assert_eq!(related.locations[0].postal_code, "H3C 2N6");
  }
}
