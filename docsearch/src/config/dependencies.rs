//! Dependency initialization and wiring for the docsearch binary.

use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::AppError;
use docsearch_repository::{OpenSearchClient, SearchIndexClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The search facade, ready to use.
    pub client: SearchIndexClient,
}

impl Dependencies {
    /// Build the search client from configuration without contacting the engine.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If the client cannot be built
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        info!(
            host = %config.connection.host,
            port = config.connection.port,
            scheme = %config.connection.scheme,
            max_batch_size = ?config.index.max_batch_size,
            "Initializing dependencies"
        );

        let engine = OpenSearchClient::new(&config.connection)
            .map_err(|e| AppError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        let client = SearchIndexClient::with_config(Arc::new(engine), config.index.clone());

        Ok(Self { client })
    }

    /// Build the search client and verify the engine is reachable and healthy.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let dependencies = Self::new(config)?;

        let healthy = dependencies
            .client
            .health_check()
            .await
            .map_err(|e| AppError::config(format!("Search engine health check failed: {}", e)))?;

        if !healthy {
            return Err(AppError::config("Search engine cluster is unhealthy"));
        }

        info!("Search engine connection verified");
        Ok(dependencies)
    }
}
