//! Configuration module for environment variable parsing.
//!
//! The webhook URL is fixed at deployment time and injected into the forwarder;
//! nothing here is mutable after startup.

use std::env;

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Default cap on how much of an inbound message is inspected for headers.
pub const DEFAULT_MAX_HEADER_PEEK_BYTES: usize = 64 * 1024;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid webhook URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("webhook URL must use http or https, got scheme {0:?}")]
    UnsupportedScheme(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute http(s) URL every inbound message is POSTed to
    pub webhook_url: Url,

    /// Port for the inbound web server to listen on
    pub port: u16,

    /// Upper bound on bytes buffered while looking for the end of the header block
    pub max_header_peek_bytes: usize,
}

impl Config {
    /// Build a configuration around an already-validated webhook URL, using
    /// defaults for everything else.
    pub fn new(webhook_url: Url) -> Self {
        Config {
            webhook_url,
            port: 8080,
            max_header_peek_bytes: DEFAULT_MAX_HEADER_PEEK_BYTES,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = env::var("WEBHOOK_URL").map_err(|_| ConfigError::Missing("WEBHOOK_URL"))?;
        let webhook_url = parse_webhook_url(&raw_url)?;

        Ok(Config {
            webhook_url,
            port: parse_or_default("PORT", 8080),
            max_header_peek_bytes: parse_or_default(
                "MAX_HEADER_PEEK_BYTES",
                DEFAULT_MAX_HEADER_PEEK_BYTES,
            ),
        })
    }
}

/// Parse and validate a webhook URL. Only absolute http/https URLs are accepted.
pub fn parse_webhook_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    check_webhook_scheme(&url)?;
    Ok(url)
}

/// Reject any webhook URL that is not http or https.
pub fn check_webhook_scheme(url: &Url) -> Result<(), ConfigError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

/// Parse an optional variable, warning and falling back to the default on bad input.
fn parse_or_default<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
