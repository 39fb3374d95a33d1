use std::path::PathBuf;

use finmock_mcp_runtime::{BaseUrlError, parse_base_url};
use thiserror::Error;
use url::Url;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FIXTURES_DIR: &str = "test_data_dir";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a port number, got '{0}'")]
    InvalidPort(String),

    #[error("FINMOCK_BASE_URL is not usable: {0}")]
    BaseUrl(#[from] BaseUrlError),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub fixtures_dir: PathBuf,
    /// Public address of this server, used to build login URLs.
    pub base_url: Url,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let fixtures_dir = non_empty("FINMOCK_FIXTURES_DIR")
            .unwrap_or_else(|| DEFAULT_FIXTURES_DIR.to_string())
            .into();

        let base_url = non_empty("FINMOCK_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));
        let base_url = parse_base_url(&base_url)?;

        Ok(Self {
            port,
            fixtures_dir,
            base_url,
        })
    }
}
