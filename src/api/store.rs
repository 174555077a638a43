//! In-memory record store: the last-known server snapshot per key.
//!
//! Entries are whole-record replacements only; a fetched record always
//! overwrites whatever was cached under its key. The single deliberate
//! eviction is dropping a demand's referenced proposals when the demand
//! itself comes back refreshed, since those proposals may have changed
//! on the server as well.

use std::collections::HashMap;

use tracing::debug;

use super::types::{key_list, Demand, Location, Proposal};

#[derive(Debug, Default)]
pub struct RecordStore {
  demands: HashMap<u64, Demand>,
  proposals: HashMap<u64, Proposal>,
  locations: HashMap<u64, Location>,
  /// Most recently modified demand seen so far; its modification date is
  /// the watermark for incremental polling.
  last_demand: Option<Demand>,
}

impl RecordStore {
  /// Absorb a batch of demands fetched from the backend.
  ///
  /// For each demand: its referenced proposals are evicted (they may be
  /// stale, the next form opening refetches them), its sideloaded
  /// locations are merged, and the demand replaces any prior snapshot
  /// under its key. Returns the stored snapshots, stripped of the
  /// sideloaded payload.
  pub fn ingest_demands(&mut self, mut batch: Vec<Demand>) -> Vec<Demand> {
    for demand in &mut batch {
      for proposal_key in key_list(demand.proposal_keys.as_ref()) {
        if self.proposals.remove(&proposal_key).is_some() {
          debug!(proposal_key, demand_key = demand.key, "evicted stale proposal");
        }
      }
      if let Some(related) = demand.related.take() {
        for location in related.locations {
          self.locations.insert(location.key, location);
        }
      }
      self.demands.insert(demand.key, demand.clone());
      self.track_last_demand(demand);
    }
    batch
  }

  /// Absorb a single demand returned by a save.
  pub fn ingest_demand(&mut self, mut demand: Demand) -> Demand {
    if let Some(related) = demand.related.take() {
      for location in related.locations {
        self.locations.insert(location.key, location);
      }
    }
    self.demands.insert(demand.key, demand.clone());
    self.track_last_demand(&demand);
    demand
  }

  /// Cache a proposal under the key the server assigned it, which may
  /// differ from the key the caller asked for.
  pub fn ingest_proposal(&mut self, proposal: Proposal) -> Proposal {
    self.proposals.insert(proposal.key, proposal.clone());
    proposal
  }

  fn track_last_demand(&mut self, demand: &Demand) {
    // ISO-8601 timestamps order lexicographically.
    let newer = match &self.last_demand {
      Some(last) => demand.modification_date > last.modification_date,
      None => true,
    };
    if newer {
      self.last_demand = Some(demand.clone());
    }
  }

  pub fn demand(&self, key: u64) -> Option<&Demand> {
    self.demands.get(&key)
  }

  pub fn demands(&self) -> impl Iterator<Item = &Demand> {
    self.demands.values()
  }

  pub fn contains_proposal(&self, key: u64) -> bool {
    self.proposals.contains_key(&key)
  }

  pub fn proposal(&self, key: u64) -> Option<&Proposal> {
    self.proposals.get(&key)
  }

  pub fn location(&self, key: u64) -> Option<&Location> {
    self.locations.get(&key)
  }

  /// Most recently modified demand seen so far; its modification date
  /// is the `lastModificationDate` watermark.
  pub fn last_demand(&self) -> Option<&Demand> {
    self.last_demand.as_ref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::api_types::Related;
  use crate::api::types::State;
  use serde_json::json;

  fn demand(key: u64, modification_date: &str, proposal_keys: &[u64]) -> Demand {
    Demand {
      key,
      state: State::Published,
      modification_date: modification_date.to_string(),
      proposal_keys: Some(json!(proposal_keys)),
      ..Demand::default()
    }
  }

  fn proposal(key: u64, state: State) -> Proposal {
    Proposal {
      key,
      state,
      ..Proposal::default()
    }
  }

  #[test]
  fn test_ingest_replaces_whole_record() {
    let mut store = RecordStore::default();
    store.ingest_demands(vec![Demand {
      quantity: 2,
      ..demand(1, "2024-01-01T00:00:00Z", &[])
    }]);
    store.ingest_demands(vec![Demand {
      quantity: 9,
      ..demand(1, "2024-01-02T00:00:00Z", &[])
    }]);
    assert_eq!(store.demand(1).unwrap().quantity, 9);
  }

  #[test]
  fn test_refreshed_demand_evicts_referenced_proposals() {
    let mut store = RecordStore::default();
    store.ingest_proposal(proposal(42, State::Published));
    store.ingest_proposal(proposal(99, State::Published));
    assert!(store.contains_proposal(42));

    store.ingest_demands(vec![demand(1, "2024-01-01T00:00:00Z", &[42])]);

    assert!(!store.contains_proposal(42));
    assert!(store.contains_proposal(99));
  }

  #[test]
  fn test_proposal_cached_under_its_own_key() {
    let mut store = RecordStore::default();
    store.ingest_proposal(proposal(77, State::Cancelled));
    assert_eq!(store.proposal(77).unwrap().state, State::Cancelled);
  }

  #[test]
  fn test_related_locations_merged_and_stripped() {
    let mut store = RecordStore::default();
    let mut d = demand(1, "2024-01-01T00:00:00Z", &[]);
    d.location_key = Some(3);
    d.related = Some(Related {
      locations: vec![Location {
        key: 3,
        postal_code: "H0H 0H0".to_string(),
        country_code: "CA".to_string(),
      }],
    });

    let stored = store.ingest_demands(vec![d]);

    assert!(stored[0].related.is_none());
    assert_eq!(store.location(3).unwrap().country_code, "CA");
  }

  #[test]
  fn test_last_demand_tracks_max_modification_date() {
    let mut store = RecordStore::default();
    store.ingest_demands(vec![
      demand(1, "2024-01-05T00:00:00Z", &[]),
      demand(2, "2024-01-09T00:00:00Z", &[]),
      demand(3, "2024-01-02T00:00:00Z", &[]),
    ]);
    assert_eq!(store.last_demand().unwrap().key, 2);
    assert_eq!(
      store.last_demand().unwrap().modification_date,
      "2024-01-09T00:00:00Z"
    );
  }

  #[test]
  fn test_malformed_proposal_keys_do_not_evict() {
    let mut store = RecordStore::default();
    store.ingest_proposal(proposal(42, State::Published));

    let mut d = demand(1, "2024-01-01T00:00:00Z", &[]);
    d.proposal_keys = Some(json!("42"));
    store.ingest_demands(vec![d]);

    assert!(store.contains_proposal(42));
  }
}
