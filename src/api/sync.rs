//! Sync client: the record store fed by the marketplace client.
//!
//! One instance is shared by every view in the session (the store sits
//! behind an `Arc<Mutex<_>>`); all mutations happen from request
//! completion paths, so the lock is only ever held for map updates.

use std::sync::{Arc, Mutex, MutexGuard};

use color_eyre::Result;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::format;

use super::client::MarketplaceClient;
use super::store::RecordStore;
use super::types::{Demand, PointOfView, Proposal};

#[derive(Clone)]
pub struct SyncClient {
  client: MarketplaceClient,
  store: Arc<Mutex<RecordStore>>,
}

impl SyncClient {
  pub fn new(config: &Config) -> Result<Self> {
    Ok(Self {
      client: MarketplaceClient::new(config)?,
      store: Arc::new(Mutex::new(RecordStore::default())),
    })
  }

  fn store(&self) -> MutexGuard<'_, RecordStore> {
    // A poisoned lock only means another thread panicked mid-update;
    // the map itself is still usable.
    self.store.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Fetch demands modified after `since` (all active demands when
  /// `None`), ingest them, and return the full cached demand set in grid
  /// order (quantity descending). On failure the store is untouched.
  pub async fn fetch_demands(
    &self,
    since: Option<String>,
    pov: Option<PointOfView>,
  ) -> Result<Vec<Demand>> {
    let pov = pov.unwrap_or(PointOfView::Consumer);
    let batch = self.client.get_demands(since.as_deref(), pov).await?;
    info!(count = batch.len(), incremental = since.is_some(), "demands fetched");

    let mut store = self.store();
    store.ingest_demands(batch);
    let mut demands: Vec<Demand> = store.demands().cloned().collect();
    drop(store);

    demands.sort_by(|a, b| b.quantity.cmp(&a.quantity).then(a.key.cmp(&b.key)));
    Ok(demands)
  }

  /// Incremental poll keyed on the last known demand's modification
  /// date.
  pub async fn refresh_demands(&self, pov: Option<PointOfView>) -> Result<Vec<Demand>> {
    let since = self.last_modification_date();
    self.fetch_demands(since, pov).await
  }

  /// Load one proposal from the backend and cache it under the key the
  /// server returned. Callers wanting cache-first behavior check
  /// `is_proposal_cached` first.
  pub async fn fetch_proposal(
    &self,
    key: u64,
    pov: Option<PointOfView>,
  ) -> Result<Proposal> {
    let pov = pov.unwrap_or(PointOfView::SaleAssociate);
    let proposal = self.client.get_proposal(key, pov).await?;
    debug!(requested = key, stored = proposal.key, "proposal fetched");
    Ok(self.store().ingest_proposal(proposal))
  }

  /// Create (no key) or update (key present) a demand; the returned
  /// canonical record replaces the cached snapshot.
  pub async fn save_demand(&self, data: Value, key: Option<u64>) -> Result<Demand> {
    let key = key.or_else(|| data.get("key").and_then(Value::as_u64));
    let demand = match key {
      Some(key) => self.client.update_demand(key, &data).await?,
      None => self.client.create_demand(&data).await?,
    };
    Ok(self.store().ingest_demand(demand))
  }

  /// Create (no key) or update (key present) a proposal; the returned
  /// canonical record replaces the cached snapshot.
  pub async fn save_proposal(&self, data: Value, key: Option<u64>) -> Result<Proposal> {
    let key = key.or_else(|| data.get("key").and_then(Value::as_u64));
    let proposal = match key {
      Some(key) => self.client.update_proposal(key, &data).await?,
      None => self.client.create_proposal(&data).await?,
    };
    Ok(self.store().ingest_proposal(proposal))
  }

  pub fn is_proposal_cached(&self, key: u64) -> bool {
    self.store().contains_proposal(key)
  }

  pub fn cached_proposal(&self, key: u64) -> Option<Proposal> {
    self.store().proposal(key).cloned()
  }

  pub fn cached_demand(&self, key: u64) -> Option<Demand> {
    self.store().demand(key).cloned()
  }

  pub fn last_modification_date(&self) -> Option<String> {
    self
      .store()
      .last_demand()
      .map(|d| d.modification_date.clone())
  }

  /// Locale cell for a demand row, resolved through the location cache.
  pub fn locale(&self, location_key: Option<u64>) -> String {
    format::display_locale(location_key, &self.store())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{Demand, Proposal, State};
  use crate::config::{Config, MarketplaceConfig, RefreshConfig};
  use serde_json::json;

  /// Client pointed at a closed local port: every request fails at the
  /// transport layer, which is exactly what the failure-path tests
  /// need.
  fn unreachable_client() -> SyncClient {
    std::env::set_var("FAIRWAY_API_TOKEN", "test-token");
    let config = Config {
      marketplace: MarketplaceConfig {
        url: "http://127.0.0.1:9".to_string(),
        email: "pro@shop.example".to_string(),
      },
      title: None,
      refresh: RefreshConfig::default(),
    };
    SyncClient::new(&config).expect("sync client")
  }

  fn proposal(key: u64, state: State) -> Proposal {
    Proposal {
      key,
      state,
      ..Proposal::default()
    }
  }

  #[test]
  fn test_cache_first_lookup() {
    let sync = unreachable_client();
    assert!(!sync.is_proposal_cached(42));

    sync.store().ingest_proposal(proposal(42, State::Published));

    assert!(sync.is_proposal_cached(42));
    assert_eq!(sync.cached_proposal(42).unwrap().key, 42);
    assert!(sync.cached_proposal(99).is_none());
  }

  #[tokio::test]
  async fn test_failed_fetch_leaves_caches_unchanged() {
    let sync = unreachable_client();
    sync.store().ingest_demands(vec![Demand {
      key: 7,
      modification_date: "2024-01-09T00:00:00Z".to_string(),
      ..Demand::default()
    }]);

    let result = sync.refresh_demands(Some(PointOfView::SaleAssociate)).await;

    assert!(result.is_err());
    assert_eq!(sync.cached_demand(7).unwrap().key, 7);
    assert_eq!(
      sync.last_modification_date().as_deref(),
      Some("2024-01-09T00:00:00Z")
    );
  }

  #[tokio::test]
  async fn test_failed_save_proposal_leaves_cache_unchanged() {
    let sync = unreachable_client();
    sync.store().ingest_proposal(proposal(77, State::Published));

    let result = sync
      .save_proposal(json!({ "state": "cancelled" }), Some(77))
      .await;

    assert!(result.is_err());
    assert_eq!(sync.cached_proposal(77).unwrap().state, State::Published);
  }

  #[tokio::test]
  async fn test_failed_save_demand_leaves_cache_unchanged() {
    let sync = unreachable_client();

    let result = sync.save_demand(json!({ "quantity": 2 }), None).await;

    assert!(result.is_err());
    assert!(sync.cached_demand(1).is_none());
  }
}
