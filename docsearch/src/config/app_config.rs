//! Application configuration read from the environment.

use std::env;
use std::time::Duration;

use docsearch_repository::{ConnectionConfig, RawFieldMapping, SearchIndexConfig};

use crate::AppError;

/// Default search engine host.
const DEFAULT_HOST: &str = "localhost";

/// Default search engine port.
const DEFAULT_PORT: u16 = 9200;

/// Default URL scheme.
const DEFAULT_SCHEME: &str = "http";

/// Default maximum number of actions in one bulk request.
const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Default name of the raw sub-field used by exact-match predicates.
const DEFAULT_RAW_FIELD_SUFFIX: &str = "keyword";

/// Everything needed to build the search client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub index: SearchIndexConfig,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SEARCH_ENGINE_HOST`: engine host (default: localhost)
    /// - `SEARCH_ENGINE_PORT`: engine port (default: 9200)
    /// - `SEARCH_ENGINE_SCHEME`: `http` or `https` (default: http)
    /// - `SEARCH_ENGINE_USERNAME` / `SEARCH_ENGINE_PASSWORD`: basic auth, both or neither
    /// - `SEARCH_ENGINE_TIMEOUT_SECS`: client-side request timeout
    /// - `SEARCH_ENGINE_OPERATION_TIMEOUT`: engine-side timeout, e.g. `30s`
    /// - `SEARCH_MAX_BATCH_SIZE`: bulk request limit, `0` for unlimited (default: 1000)
    /// - `SEARCH_RAW_FIELD_SUFFIX`: raw sub-field name, empty for keyword fields
    ///   queried directly (default: keyword)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset, except for the raw field suffix.
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get("SEARCH_ENGINE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("SEARCH_ENGINE_PORT") {
            Some(port) => port.parse::<u16>().map_err(|_| {
                AppError::config(format!(
                    "SEARCH_ENGINE_PORT must be a port number, got '{}'",
                    port
                ))
            })?,
            None => DEFAULT_PORT,
        };
        let scheme = get("SEARCH_ENGINE_SCHEME").unwrap_or_else(|| DEFAULT_SCHEME.to_string());

        let mut connection = ConnectionConfig::new(host, port).with_scheme(scheme);

        match (get("SEARCH_ENGINE_USERNAME"), get("SEARCH_ENGINE_PASSWORD")) {
            (Some(username), Some(password)) => {
                connection = connection.with_credentials(username, password);
            }
            (None, None) => {}
            _ => {
                return Err(AppError::config(
                    "SEARCH_ENGINE_USERNAME and SEARCH_ENGINE_PASSWORD must be set together",
                ))
            }
        }

        if let Some(secs) = get("SEARCH_ENGINE_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::config(format!(
                        "SEARCH_ENGINE_TIMEOUT_SECS must be a positive integer, got '{}'",
                        secs
                    ))
                })?;
            connection = connection.with_request_timeout(Duration::from_secs(secs));
        }

        if let Some(timeout) = get("SEARCH_ENGINE_OPERATION_TIMEOUT") {
            connection = connection.with_operation_timeout(timeout);
        }

        // Fail on a bad endpoint here rather than on first use.
        connection.url()?;

        let max_batch_size = match get("SEARCH_MAX_BATCH_SIZE") {
            Some(size) => size.parse::<usize>().map_err(|_| {
                AppError::config(format!(
                    "SEARCH_MAX_BATCH_SIZE must be a non-negative integer, got '{}'",
                    size
                ))
            })?,
            None => DEFAULT_MAX_BATCH_SIZE,
        };
        let index = if max_batch_size == 0 {
            SearchIndexConfig::unlimited()
        } else {
            SearchIndexConfig::with_max_batch_size(max_batch_size)
        };

        let raw_fields = match lookup("SEARCH_RAW_FIELD_SUFFIX") {
            Some(suffix) if suffix.trim().is_empty() => RawFieldMapping::Direct,
            Some(suffix) => RawFieldMapping::SubField(suffix.trim().to_string()),
            None => RawFieldMapping::SubField(DEFAULT_RAW_FIELD_SUFFIX.to_string()),
        };

        Ok(Self {
            connection,
            index: index.raw_fields(raw_fields),
        })
    }
}
