use thiserror::Error;

/// Failures surfaced by the marketplace client.
///
/// Rejections keep the server message together with the request URL;
/// their `Display` form is exactly what the alert dialog shows.
#[derive(Debug, Error)]
pub enum ClientError {
  /// Transport-level failure: connection, TLS, timeout, or a body that
  /// did not decode as the expected envelope.
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  /// The backend answered but flagged the operation as failed
  /// (`success: false`).
  #[error("{message}\nurl: {url}")]
  Rejected { message: String, url: String },

  /// A successful envelope that did not carry the expected resource.
  #[error("empty response envelope\nurl: {url}")]
  EmptyEnvelope { url: String },

  #[error("invalid endpoint url: {0}")]
  BadUrl(#[from] url::ParseError),
}

impl ClientError {
  pub fn rejected(message: Option<String>, url: &str) -> Self {
    ClientError::Rejected {
      message: message.unwrap_or_else(|| "request rejected by the marketplace".to_string()),
      url: url.to_string(),
    }
  }
}
