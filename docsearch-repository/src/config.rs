//! Configuration types for the SearchIndexClient and the OpenSearch transport.

use std::time::Duration;

use url::Url;

use crate::errors::SearchError;
use crate::opensearch::RawFieldMapping;

/// Configuration for the SearchIndexClient.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Maximum number of documents allowed in a single batch operation.
    /// Set to None to disable the limit (not recommended for production).
    pub max_batch_size: Option<usize>,
    /// Where exact-match predicates find the raw variant of a field.
    pub raw_fields: RawFieldMapping,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
            raw_fields: RawFieldMapping::default(),
        }
    }
}

impl SearchIndexConfig {
    /// Create a config with no batch size limit (use with caution).
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
            ..Self::default()
        }
    }

    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
            ..Self::default()
        }
    }

    /// Replace the raw field mapping.
    pub fn raw_fields(mut self, raw_fields: RawFieldMapping) -> Self {
        self.raw_fields = raw_fields;
        self
    }
}

/// Basic-auth credentials for the engine.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Where and how to reach the search engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
    /// Client-side timeout for a whole request.
    pub request_timeout: Option<Duration>,
    /// Engine-side timeout sent with write and index operations, e.g. `30s`.
    pub operation_timeout: Option<String>,
}

impl ConnectionConfig {
    /// Plain HTTP connection without credentials or timeouts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "http".to_string(),
            host: host.into(),
            port,
            credentials: None,
            request_timeout: None,
            operation_timeout: None,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_operation_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.operation_timeout = Some(timeout.into());
        self
    }

    /// The engine base URL.
    pub fn url(&self) -> Result<Url, SearchError> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(SearchError::connection(format!(
                "Unsupported scheme: {}",
                self.scheme
            )));
        }
        if self.host.is_empty() {
            return Err(SearchError::connection("host is required"));
        }

        Url::parse(&format!("{}://{}:{}", self.scheme, self.host, self.port))
            .map_err(|e| SearchError::connection(e.to_string()))
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new("localhost", 9200)
    }
}
