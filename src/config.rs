use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub marketplace: MarketplaceConfig,
  /// Custom title for the header (defaults to the marketplace domain)
  pub title: Option<String>,
  #[serde(default)]
  pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
  pub url: String,
  pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
  /// Seconds between automatic demand-list refreshes
  #[serde(default = "default_interval_secs")]
  pub interval_secs: u64,
}

impl Default for RefreshConfig {
  fn default() -> Self {
    Self {
      interval_secs: default_interval_secs(),
    }
  }
}

fn default_interval_secs() -> u64 {
  120
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./fairway.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/fairway/config.yaml
  /// 4. ~/.config/fairway/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/fairway/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("fairway.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("fairway").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the marketplace API token from environment variables.
  ///
  /// Checks FAIRWAY_API_TOKEN first, then MARKETPLACE_API_TOKEN as
  /// fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("FAIRWAY_API_TOKEN")
      .or_else(|_| std::env::var("MARKETPLACE_API_TOKEN"))
      .map_err(|_| {
        eyre!(
          "Marketplace API token not found. Set FAIRWAY_API_TOKEN or MARKETPLACE_API_TOKEN environment variable."
        )
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str(
      "marketplace:\n  url: https://console.fairway.example\n  email: pro@shop.example\n",
    )
    .unwrap();
    assert_eq!(config.marketplace.email, "pro@shop.example");
    assert_eq!(config.refresh.interval_secs, 120);
    assert!(config.title.is_none());
  }

  #[test]
  fn test_parse_refresh_interval() {
    let config: Config = serde_yaml::from_str(
      "marketplace:\n  url: https://console.fairway.example\n  email: pro@shop.example\nrefresh:\n  interval_secs: 30\n",
    )
    .unwrap();
    assert_eq!(config.refresh.interval_secs, 30);
  }
}
