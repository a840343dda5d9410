//! Backend endpoint configuration.
//!
//! # Responsibility
//! - Collect the hosted-backend coordinates (endpoint, project, database,
//!   collection, optional API key) from the environment or explicit input.
//! - Normalize and validate values before any client is built.
//!
//! # Invariants
//! - `endpoint` is an absolute http(s) URL with no trailing slash.
//! - Loading never panics; misconfiguration surfaces as `ConfigError`.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ENV_ENDPOINT: &str = "POCKETNOTE_ENDPOINT";
pub const ENV_PROJECT_ID: &str = "POCKETNOTE_PROJECT_ID";
pub const ENV_DATABASE_ID: &str = "POCKETNOTE_DATABASE_ID";
pub const ENV_COLLECTION_ID: &str = "POCKETNOTE_COLLECTION_ID";
pub const ENV_API_KEY: &str = "POCKETNOTE_API_KEY";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration failure raised before any network use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is absent or blank.
    MissingValue(&'static str),
    /// Endpoint value cannot be used as a base URL.
    InvalidEndpoint { value: String, reason: &'static str },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingValue(name) => write!(f, "missing required configuration: {name}"),
            Self::InvalidEndpoint { value, reason } => {
                write!(f, "invalid endpoint `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Coordinates of the hosted document backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the backend API, normalized without trailing slash.
    pub endpoint: String,
    /// Project scope sent with every request.
    pub project_id: String,
    /// Database holding the notes collection.
    pub database_id: String,
    /// Collection holding note documents.
    pub collection_id: String,
    /// Optional server-side key; sessions are used when absent.
    pub api_key: Option<String>,
}

impl BackendConfig {
    /// Builds a validated config from explicit values.
    pub fn new(
        endpoint: &str,
        project_id: &str,
        database_id: &str,
        collection_id: &str,
        api_key: Option<&str>,
    ) -> ConfigResult<Self> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
            project_id: require_value(ENV_PROJECT_ID, project_id)?,
            database_id: require_value(ENV_DATABASE_ID, database_id)?,
            collection_id: require_value(ENV_COLLECTION_ID, collection_id)?,
            api_key: api_key
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        })
    }

    /// Loads config from `POCKETNOTE_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let endpoint = lookup(ENV_ENDPOINT).unwrap_or_default();
        let project_id = lookup(ENV_PROJECT_ID).unwrap_or_default();
        let database_id = lookup(ENV_DATABASE_ID).unwrap_or_default();
        let collection_id = lookup(ENV_COLLECTION_ID).unwrap_or_default();
        let api_key = lookup(ENV_API_KEY);
        Self::new(
            &endpoint,
            &project_id,
            &database_id,
            &collection_id,
            api_key.as_deref(),
        )
    }
}

fn require_value(name: &'static str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingValue(name));
    }
    Ok(trimmed.to_string())
}

fn normalize_endpoint(raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingValue(ENV_ENDPOINT));
    }
    if !trimmed.starts_with("https://") && !trimmed.starts_with("http://") {
        return Err(ConfigError::InvalidEndpoint {
            value: trimmed.to_string(),
            reason: "expected an absolute http(s) URL",
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
