//! API configuration loaded once at startup.
//!
//! The file is JSON by default; `.yaml` / `.yml` files are parsed as YAML.
//!
//! ```json
//! {
//!   "BASE_URL": "https://api.cedrom-sni.com",
//!   "API_ENDPOINTS": {
//!     "SEARCH_SIMPLE": "/api/v2/Search/Simple",
//!     "SEARCH_ADVANCED": "/api/v2/Search/Advanced",
//!     "DOCUMENT": "/api/v2/Documents/"
//!   }
//! }
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_AUTH_URL: &str = "https://api.cedrom-sni.com/api/auth/login";

/// Base URL and endpoint paths of the document API.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "BASE_URL")]
    pub base_url: String,
    #[serde(rename = "API_ENDPOINTS")]
    pub endpoints: Endpoints,
    #[serde(rename = "AUTH_URL", default = "default_auth_url")]
    pub auth_url: String,
}

/// Path suffixes appended to [`Config::base_url`].
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(rename = "SEARCH_SIMPLE")]
    pub search_simple: String,
    #[serde(rename = "SEARCH_ADVANCED")]
    pub search_advanced: String,
    /// Prefix the document id is appended to.
    #[serde(rename = "DOCUMENT")]
    pub document: String,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

impl Config {
    /// Parse a config from text, choosing the format from `path`'s extension.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: Config = if is_yaml {
            serde_yaml::from_str(text)
                .map_err(|e| Error::config(format!("{}: {e}", path.display())))?
        } else {
            serde_json::from_str(text)
                .map_err(|e| Error::config(format!("{}: {e}", path.display())))?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [("BASE_URL", &self.base_url), ("AUTH_URL", &self.auth_url)] {
            Url::parse(value).map_err(|e| Error::config(format!("{key} `{value}`: {e}")))?;
        }
        Ok(())
    }

    /// Full URL of an endpoint path.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }
}

/// Load and validate the config file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
    let config = Config::parse(&text, path)?;
    info!(base_url = %config.base_url, "Loaded configuration");
    Ok(config)
}

fn join_url(base: &str, suffix: &str) -> String {
    match (base.ends_with('/'), suffix.starts_with('/')) {
        (true, true) => format!("{}{}", base, &suffix[1..]),
        (false, false) if !suffix.is_empty() => format!("{base}/{suffix}"),
        _ => format!("{base}{suffix}"),
    }
}
