//! Search engine client trait definition.
//!
//! This module defines the transport-level interface to the search engine.
//! Implementations send already-built request bodies and hand back parsed
//! responses; query building and result normalization happen above this seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use crate::types::{BulkAction, BulkSummary, StoredDocument, WriteResponse};

/// Abstract interface for search engine operations.
///
/// This trait defines every request the facade needs from a search engine.
/// Implementations can be swapped for different backends (OpenSearch, an
/// in-memory engine for tests, etc.).
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so a single handle can be shared
/// across tasks.
///
/// # Error Handling
///
/// Engine statuses map onto `SearchError`: 404 becomes `NotFound`, 409 becomes
/// `VersionConflict`, and anything else non-successful becomes `EngineError`.
/// Network failures are `TransportError`. Nothing is retried.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Create an index from a create-index body (settings and mappings).
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the engine acknowledged the creation
    /// * `Err(SearchError)` - If the index exists or the request fails
    async fn create_index(&self, index: &str, body: &Value) -> Result<bool, SearchError>;

    /// Delete an index and all its documents.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the engine acknowledged the deletion
    /// * `Err(SearchError::NotFound)` - If the index does not exist
    async fn delete_index(&self, index: &str) -> Result<bool, SearchError>;

    /// Check whether every named index exists.
    async fn index_exists(&self, indices: &[&str]) -> Result<bool, SearchError>;

    /// Open a closed index.
    async fn open_index(&self, index: &str) -> Result<bool, SearchError>;

    /// Close an index. Closed indices reject reads and writes.
    async fn close_index(&self, index: &str) -> Result<bool, SearchError>;

    /// Update dynamic (or, on a closed index, static) index settings.
    async fn put_index_settings(&self, index: &str, settings: &Value)
        -> Result<bool, SearchError>;

    /// Register a legacy index template.
    async fn put_index_template(&self, name: &str, body: &Value) -> Result<bool, SearchError>;

    /// Index a document, replacing any document with the same id.
    ///
    /// # Arguments
    ///
    /// * `index` - The target index
    /// * `id` - The document id, or `None` to let the engine generate one
    /// * `source` - The document body, a JSON object
    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        source: &Value,
    ) -> Result<WriteResponse, SearchError>;

    /// Fetch a document by id.
    ///
    /// # Returns
    ///
    /// * `Ok(StoredDocument)` - The document source with its metadata
    /// * `Err(SearchError::NotFound)` - If the document or index does not exist
    async fn get_document(&self, index: &str, id: &str) -> Result<StoredDocument, SearchError>;

    /// Check whether a document exists.
    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchError>;

    /// Merge `doc` into an existing document.
    ///
    /// # Returns
    ///
    /// * `Ok(WriteResponse)` - With outcome `Updated` or `Noop`
    /// * `Err(SearchError::NotFound)` - If the document does not exist
    /// * `Err(SearchError::VersionConflict)` - If a concurrent write won
    async fn update_document(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<WriteResponse, SearchError>;

    /// Delete a document.
    ///
    /// # Returns
    ///
    /// * `Ok(WriteResponse)` - With outcome `Deleted`, or `NotFound` if the
    ///   document was already absent
    /// * `Err(SearchError::NotFound)` - If the index does not exist
    async fn delete_document(&self, index: &str, id: &str) -> Result<WriteResponse, SearchError>;

    /// Send several actions against one index in a single request.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkSummary)` - Per-item results; partial failures are reported
    ///   in the summary, not as an error
    /// * `Err(SearchError)` - If the request as a whole fails
    async fn bulk(&self, index: &str, actions: &[BulkAction]) -> Result<BulkSummary, SearchError>;

    /// Run a search body against `indices` (all indices when empty).
    ///
    /// Returns the raw response; normalization is up to the caller.
    async fn search(&self, indices: &[String], body: &Value) -> Result<Value, SearchError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the cluster status is green or yellow
    /// * `Ok(false)` - If the cluster status is red
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
