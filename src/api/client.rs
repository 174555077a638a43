use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::api_types::Envelope;
use super::error::ClientError;
use super::types::{Demand, PointOfView, Proposal};

/// Thin HTTP client over the marketplace REST endpoints.
///
/// All requests go through the `/API/Demand/` and `/API/Proposal/`
/// resources and answer the shared JSON envelope. This type does no
/// caching; `SyncClient` layers the record store on top of it.
#[derive(Clone)]
pub struct MarketplaceClient {
  http: reqwest::Client,
  base: Url,
  email: String,
  token: String,
}

impl MarketplaceClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;

    // A trailing slash keeps Url::join from eating the last path segment.
    let mut base = config.marketplace.url.clone();
    if !base.ends_with('/') {
      base.push('/');
    }
    let base = Url::parse(&base)
      .map_err(|e| eyre!("Invalid marketplace url {}: {}", config.marketplace.url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("fairway/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      email: config.marketplace.email.clone(),
      token,
    })
  }

  /// Demands modified after `since` (all active demands when `None`),
  /// with their related locations sideloaded.
  pub async fn get_demands(
    &self,
    since: Option<&str>,
    pov: PointOfView,
  ) -> Result<Vec<Demand>, ClientError> {
    let mut url = self.base.join("API/Demand/")?;
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("pointOfView", pov.as_query());
      query.append_pair("related", "Location");
      if let Some(since) = since {
        query.append_pair("lastModificationDate", since);
      }
    }
    debug!(url = %url, "GET demands");
    let envelope: Envelope<Demand> = self.send(self.http.get(url.clone())).await?;
    envelope.into_resources(url.as_str())
  }

  /// One proposal by key.
  pub async fn get_proposal(
    &self,
    key: u64,
    pov: PointOfView,
  ) -> Result<Proposal, ClientError> {
    let mut url = self.base.join(&format!("API/Proposal/{key}"))?;
    url
      .query_pairs_mut()
      .append_pair("pointOfView", pov.as_query());
    debug!(url = %url, "GET proposal");
    let envelope: Envelope<Proposal> = self.send(self.http.get(url.clone())).await?;
    envelope.into_resource(url.as_str())
  }

  pub async fn create_demand(&self, data: &Value) -> Result<Demand, ClientError> {
    let url = self.base.join("API/Demand/")?;
    debug!(url = %url, "POST demand");
    let envelope: Envelope<Demand> = self.send(self.http.post(url.clone()).json(data)).await?;
    envelope.into_resource(url.as_str())
  }

  pub async fn update_demand(&self, key: u64, data: &Value) -> Result<Demand, ClientError> {
    let url = self.base.join(&format!("API/Demand/{key}"))?;
    debug!(url = %url, "PUT demand");
    let envelope: Envelope<Demand> = self.send(self.http.put(url.clone()).json(data)).await?;
    envelope.into_resource(url.as_str())
  }

  pub async fn create_proposal(&self, data: &Value) -> Result<Proposal, ClientError> {
    let url = self.base.join("API/Proposal/")?;
    debug!(url = %url, "POST proposal");
    let envelope: Envelope<Proposal> = self.send(self.http.post(url.clone()).json(data)).await?;
    envelope.into_resource(url.as_str())
  }

  pub async fn update_proposal(&self, key: u64, data: &Value) -> Result<Proposal, ClientError> {
    let url = self.base.join(&format!("API/Proposal/{key}"))?;
    debug!(url = %url, "PUT proposal");
    let envelope: Envelope<Proposal> = self.send(self.http.put(url.clone()).json(data)).await?;
    envelope.into_resource(url.as_str())
  }

  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
    let response = request
      .basic_auth(&self.email, Some(&self.token))
      .send()
      .await?;
    Ok(response.json().await?)
  }
}
