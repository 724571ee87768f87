//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// Name of the variable holding the bearer token when none is configured.
pub const DEFAULT_TOKEN_VAR: &str = "TUBEGENIE_TOKEN";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the TubeGenie API (scheme + host, no trailing path)
    pub api_base_url: String,
    /// Environment variable the token source reads the bearer token from
    pub token_var: String,
    /// Per-request timeout; unset means the HTTP client never times out
    pub http_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_url(None)
    }

    /// Like [`Config::from_env`], with `api_base_url` taking precedence over
    /// `TUBEGENIE_API_URL` when given.
    pub fn from_env_with_url(api_base_url: Option<String>) -> Result<Self> {
        let api_base_url = match api_base_url {
            Some(url) => url,
            None => env::var("TUBEGENIE_API_URL")
                .map_err(|_| Error::Config("TUBEGENIE_API_URL not set".to_string()))?,
        };

        let http_timeout = match env::var("TUBEGENIE_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Some(parse_timeout(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            api_base_url,
            token_var: env::var("TUBEGENIE_TOKEN_VAR")
                .unwrap_or_else(|_| DEFAULT_TOKEN_VAR.to_string()),
            http_timeout,
        })
    }

    /// Configuration for an explicit base URL with defaults for the rest.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            token_var: DEFAULT_TOKEN_VAR.to_string(),
            http_timeout: None,
        }
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        Error::Config(format!(
            "TUBEGENIE_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
            raw
        ))
    })?;
    if secs == 0 {
        return Err(Error::Config(
            "TUBEGENIE_HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
