//! Declarative client configuration.
//!
//! ```
//! use fluently::config::ClientConfig;
//!
//! let config = ClientConfig::from_yaml(r#"
//! identifier: heroes
//! base_url: https://sketch7.com/api
//! headers:
//!   Accept: [application/json, text/json]
//!   User-Agent: fluently
//! timer:
//!   warn_threshold: 250ms
//! response_cache:
//!   write_only: true
//! "#).unwrap();
//!
//! assert_eq!(config.identifier, "heroes");
//! assert!(config.response_cache.unwrap().write_only);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use fluently_core::{Headers, uri};

use crate::error::{Error, Result};
use crate::stages::{LoggerOptions, ResponseCacheOptions, TimerOptions};

/// A header given as one value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    /// Single value.
    One(String),
    /// Ordered values.
    Many(Vec<String>),
}

impl From<HeaderValues> for Vec<String> {
    fn from(values: HeaderValues) -> Self {
        match values {
            HeaderValues::One(value) => vec![value],
            HeaderValues::Many(values) => values,
        }
    }
}

/// Response cache defaults loadable from configuration.
///
/// Matchers can only be set in code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseCacheConfig {
    /// Skip the cache for every request.
    pub ignored: bool,
    /// Never read from the cache; still store responses.
    pub write_only: bool,
}

impl From<ResponseCacheConfig> for ResponseCacheOptions {
    fn from(config: ResponseCacheConfig) -> Self {
        ResponseCacheOptions::new()
            .ignored(config.ignored)
            .write_only(config.write_only)
    }
}

/// Client configuration.
///
/// Stage sections are optional. With
/// [`FluentClientBuilder::from_config`](crate::FluentClientBuilder::from_config),
/// a present `logger` or `timer` section registers that stage, logger first.
/// The `response_cache` section only supplies the defaults used by a later
/// [`use_response_caching`](crate::FluentClientBuilder::use_response_caching).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Client identifier used in logs and metrics.
    pub identifier: String,
    /// Base URL for relative request URLs.
    pub base_url: Option<String>,
    /// Headers sent with every request, in order.
    pub headers: IndexMap<String, HeaderValues>,
    /// Logger stage options.
    pub logger: Option<LoggerOptions>,
    /// Timer stage options.
    pub timer: Option<TimerOptions>,
    /// Response cache stage defaults.
    pub response_cache: Option<ResponseCacheConfig>,
}

impl ClientConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ClientConfig =
            serde_saphyr::from_str(yaml).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde can not.
    pub fn validate(&self) -> Result<()> {
        if self.identifier.trim().is_empty() {
            return Err(Error::InvalidConfig("identifier must not be empty".into()));
        }
        if let Some(base_url) = &self.base_url
            && !uri::is_absolute(base_url)
        {
            return Err(Error::InvalidConfig(format!(
                "base_url `{base_url}` must be absolute"
            )));
        }
        Ok(())
    }

    /// Default headers as a [`Headers`] collection.
    pub fn default_headers(&self) -> Headers {
        let mut headers = Headers::new();
        for (name, values) in &self.headers {
            headers.set(name.as_str(), Vec::<String>::from(values.clone()));
        }
        headers
    }
}
