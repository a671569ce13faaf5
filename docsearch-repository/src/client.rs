//! Search index client implementation.
//!
//! This module provides the main client for interacting with the search engine.
//! Application code uses this to manage indices, write documents and run
//! queries; every operation is one awaited round trip. The `spawn_*` family
//! submits the same operations in the background and hands back a
//! [`Completion`].

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, error, instrument};

use crate::completion::Completion;
use crate::config::SearchIndexConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::{
    normalize_search_response, validate_index_name, IndexSettings, IndexTemplate, QueryBuilder,
};
use crate::types::{BulkAction, BulkSummary, StoredDocument, WriteResponse};
use docsearch_shared::{Predicate, QueryRequest, ResultEnvelope};

/// The main client for interacting with the search engine.
///
/// Cheap to clone; clones share the injected engine handle.
#[derive(Clone)]
pub struct SearchIndexClient {
    provider: Arc<dyn SearchEngineClient>,
    config: SearchIndexConfig,
    builder: QueryBuilder,
}

impl SearchIndexClient {
    /// Create a new SearchIndexClient with default configuration.
    pub fn new(provider: Arc<dyn SearchEngineClient>) -> Self {
        Self::with_config(provider, SearchIndexConfig::default())
    }

    /// Create a new SearchIndexClient with custom configuration.
    pub fn with_config(provider: Arc<dyn SearchEngineClient>, config: SearchIndexConfig) -> Self {
        let builder = QueryBuilder::new(config.raw_fields.clone());
        Self {
            provider,
            config,
            builder,
        }
    }

    pub fn config(&self) -> &SearchIndexConfig {
        &self.config
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Index lifecycle
    // ------------------------------------------------------------------

    /// Create an index with the given settings and mappings.
    #[instrument(skip(self, settings))]
    pub async fn create_index(
        &self,
        index: &str,
        settings: &IndexSettings,
    ) -> Result<bool, SearchError> {
        validate_index_name(index)?;
        self.provider.create_index(index, &settings.to_body()).await
    }

    #[instrument(skip(self))]
    pub async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        validate_index_name(index)?;
        self.provider.delete_index(index).await
    }

    /// True only if every named index exists.
    #[instrument(skip(self))]
    pub async fn index_exists(&self, indices: &[&str]) -> Result<bool, SearchError> {
        if indices.is_empty() {
            return Err(SearchError::validation("at least one index name is required"));
        }
        for index in indices {
            validate_index_name(index)?;
        }
        self.provider.index_exists(indices).await
    }

    #[instrument(skip(self))]
    pub async fn open_index(&self, index: &str) -> Result<bool, SearchError> {
        validate_index_name(index)?;
        self.provider.open_index(index).await
    }

    #[instrument(skip(self))]
    pub async fn close_index(&self, index: &str) -> Result<bool, SearchError> {
        validate_index_name(index)?;
        self.provider.close_index(index).await
    }

    /// Update index settings, e.g. `{"number_of_replicas": 2}`.
    #[instrument(skip(self, settings))]
    pub async fn update_index_settings(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<bool, SearchError> {
        validate_index_name(index)?;
        match settings.as_object() {
            Some(map) if !map.is_empty() => {}
            _ => {
                return Err(SearchError::validation(
                    "settings must be a non-empty JSON object",
                ))
            }
        }
        self.provider.put_index_settings(index, settings).await
    }

    #[instrument(skip(self, template), fields(template = %template.name))]
    pub async fn put_index_template(&self, template: &IndexTemplate) -> Result<bool, SearchError> {
        if template.name.is_empty() {
            return Err(SearchError::validation("template name is required"));
        }
        if template.patterns.is_empty() {
            return Err(SearchError::validation(
                "template needs at least one index pattern",
            ));
        }
        self.provider
            .put_index_template(&template.name, &template.to_body())
            .await
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Index a document. With `id: None` the engine generates one.
    ///
    /// The document must serialize to a JSON object.
    #[instrument(skip(self, source))]
    pub async fn index_document<T: Serialize + ?Sized>(
        &self,
        index: &str,
        id: Option<&str>,
        source: &T,
    ) -> Result<WriteResponse, SearchError> {
        let source = to_object(source)?;
        self.index_value(index, id, &source).await
    }

    async fn index_value(
        &self,
        index: &str,
        id: Option<&str>,
        source: &Value,
    ) -> Result<WriteResponse, SearchError> {
        validate_index_name(index)?;
        if let Some(id) = id {
            validate_id(id)?;
        }
        self.provider.index_document(index, id, source).await
    }

    /// Fetch a document with both the structured and textual source.
    #[instrument(skip(self))]
    pub async fn get_document(&self, index: &str, id: &str) -> Result<StoredDocument, SearchError> {
        validate_index_name(index)?;
        validate_id(id)?;
        self.provider.get_document(index, id).await
    }

    /// Fetch a document and deserialize its source into `T`.
    pub async fn get_document_as<T: DeserializeOwned>(
        &self,
        index: &str,
        id: &str,
    ) -> Result<T, SearchError> {
        let document = self.get_document(index, id).await?;
        Ok(serde_json::from_value(Value::Object(document.source))?)
    }

    #[instrument(skip(self))]
    pub async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchError> {
        validate_index_name(index)?;
        validate_id(id)?;
        self.provider.document_exists(index, id).await
    }

    /// Merge the fields of `doc` into an existing document.
    #[instrument(skip(self, doc))]
    pub async fn update_document<T: Serialize + ?Sized>(
        &self,
        index: &str,
        id: &str,
        doc: &T,
    ) -> Result<WriteResponse, SearchError> {
        let doc = to_object(doc)?;
        self.update_value(index, id, &doc).await
    }

    async fn update_value(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<WriteResponse, SearchError> {
        validate_index_name(index)?;
        validate_id(id)?;
        self.provider.update_document(index, id, doc).await
    }

    /// Delete a document. A document that was already absent is reported
    /// with outcome `NotFound`, not as an error.
    #[instrument(skip(self))]
    pub async fn delete_document(
        &self,
        index: &str,
        id: &str,
    ) -> Result<WriteResponse, SearchError> {
        validate_index_name(index)?;
        validate_id(id)?;
        self.provider.delete_document(index, id).await
    }

    // ------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------

    /// Send a batch of mixed actions against one index.
    ///
    /// Individual failures are reported in the summary. The batch size is
    /// limited by the configured max_batch_size (default: 1000).
    #[instrument(skip(self, actions), fields(action_count = actions.len()))]
    pub async fn bulk(
        &self,
        index: &str,
        actions: Vec<BulkAction>,
    ) -> Result<BulkSummary, SearchError> {
        if actions.is_empty() {
            return Ok(BulkSummary::empty());
        }

        self.validate_batch_size(actions.len())?;
        validate_index_name(index)?;

        for action in &actions {
            if let Some(id) = action.id() {
                validate_id(id)?;
            }
            match action {
                BulkAction::Index { source, .. } => require_object(source)?,
                BulkAction::Update { doc, .. } => require_object(doc)?,
                BulkAction::Delete { .. } => {}
            }
        }

        self.provider.bulk(index, &actions).await
    }

    /// Index several documents with engine-generated ids.
    pub async fn bulk_index<T: Serialize>(
        &self,
        index: &str,
        documents: &[T],
    ) -> Result<BulkSummary, SearchError> {
        let actions = documents
            .iter()
            .map(|document| {
                Ok(BulkAction::Index {
                    id: None,
                    source: to_object(document)?,
                })
            })
            .collect::<Result<Vec<_>, SearchError>>()?;
        self.bulk(index, actions).await
    }

    /// Index several documents under explicit ids, replacing existing ones.
    pub async fn bulk_index_with_ids<T: Serialize>(
        &self,
        index: &str,
        documents: &[(String, T)],
    ) -> Result<BulkSummary, SearchError> {
        let actions = documents
            .iter()
            .map(|(id, document)| {
                Ok(BulkAction::Index {
                    id: Some(id.clone()),
                    source: to_object(document)?,
                })
            })
            .collect::<Result<Vec<_>, SearchError>>()?;
        self.bulk(index, actions).await
    }

    /// Apply partial updates to several documents.
    pub async fn bulk_update<T: Serialize>(
        &self,
        index: &str,
        updates: &[(String, T)],
    ) -> Result<BulkSummary, SearchError> {
        let actions = updates
            .iter()
            .map(|(id, doc)| {
                Ok(BulkAction::Update {
                    id: id.clone(),
                    doc: to_object(doc)?,
                })
            })
            .collect::<Result<Vec<_>, SearchError>>()?;
        self.bulk(index, actions).await
    }

    /// Delete several documents. Absent documents count as successes.
    pub async fn bulk_delete(
        &self,
        index: &str,
        ids: &[String],
    ) -> Result<BulkSummary, SearchError> {
        let actions = ids
            .iter()
            .map(|id| BulkAction::Delete { id: id.clone() })
            .collect();
        self.bulk(index, actions).await
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// The search body `request` would send, without sending it.
    pub fn build_query(&self, request: &QueryRequest) -> Result<Value, SearchError> {
        validate_request(request)?;
        Ok(self.builder.build(request))
    }

    /// Run a query and normalize the engine response.
    #[instrument(skip(self, request), fields(indices = ?request.target_indices()))]
    pub async fn search(&self, request: &QueryRequest) -> Result<ResultEnvelope, SearchError> {
        let body = self.build_query(request)?;
        let raw = self
            .provider
            .search(request.target_indices(), &body)
            .await?;
        let envelope = normalize_search_response(&raw)?;
        debug!(
            total = envelope.total_count,
            returned = envelope.hits.len(),
            "Search completed"
        );
        Ok(envelope)
    }

    /// Check if the search engine is healthy and reachable.
    pub async fn health_check(&self) -> Result<bool, SearchError> {
        self.provider.health_check().await
    }

    // ------------------------------------------------------------------
    // Background submission
    // ------------------------------------------------------------------

    fn spawn<T, F>(&self, operation: &'static str, future: F) -> Completion<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, SearchError>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        tokio::spawn(async move {
            let result = future.await;
            match &result {
                Ok(_) => debug!(operation, "Background operation completed"),
                Err(e) => error!(operation, error = %e, "Background operation failed"),
            }
            // The caller may have dropped the Completion.
            let _ = sender.send(result);
        });
        Completion::new(receiver)
    }

    fn ready<T>(result: Result<T, SearchError>) -> Completion<T> {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(result);
        Completion::new(receiver)
    }

    /// Submit a search in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_search(&self, request: QueryRequest) -> Completion<ResultEnvelope> {
        let client = self.clone();
        self.spawn("search", async move { client.search(&request).await })
    }

    /// Submit a document write in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_index_document<T: Serialize + ?Sized>(
        &self,
        index: &str,
        id: Option<&str>,
        source: &T,
    ) -> Completion<WriteResponse> {
        let source = match to_object(source) {
            Ok(source) => source,
            Err(e) => return Self::ready(Err(e)),
        };
        let client = self.clone();
        let index = index.to_string();
        let id = id.map(str::to_string);
        self.spawn("index_document", async move {
            client.index_value(&index, id.as_deref(), &source).await
        })
    }

    /// Submit a partial update in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_update_document<T: Serialize + ?Sized>(
        &self,
        index: &str,
        id: &str,
        doc: &T,
    ) -> Completion<WriteResponse> {
        let doc = match to_object(doc) {
            Ok(doc) => doc,
            Err(e) => return Self::ready(Err(e)),
        };
        let client = self.clone();
        let index = index.to_string();
        let id = id.to_string();
        self.spawn("update_document", async move {
            client.update_value(&index, &id, &doc).await
        })
    }

    /// Submit a delete in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_delete_document(&self, index: &str, id: &str) -> Completion<WriteResponse> {
        let client = self.clone();
        let index = index.to_string();
        let id = id.to_string();
        self.spawn("delete_document", async move {
            client.delete_document(&index, &id).await
        })
    }

    /// Submit a bulk request in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_bulk(&self, index: &str, actions: Vec<BulkAction>) -> Completion<BulkSummary> {
        let client = self.clone();
        let index = index.to_string();
        self.spawn("bulk", async move { client.bulk(&index, actions).await })
    }
}

fn validate_id(id: &str) -> Result<(), SearchError> {
    if id.trim().is_empty() {
        return Err(SearchError::validation("document id is required"));
    }
    Ok(())
}

fn require_object(value: &Value) -> Result<(), SearchError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(SearchError::serialization(
            "document must serialize to a JSON object",
        ))
    }
}

fn to_object<T: Serialize + ?Sized>(value: &T) -> Result<Value, SearchError> {
    let value = serde_json::to_value(value)?;
    require_object(&value)?;
    Ok(value)
}

fn require_field(field: &str) -> Result<(), SearchError> {
    if field.trim().is_empty() {
        return Err(SearchError::validation("field name is required"));
    }
    Ok(())
}

/// Reject structurally broken requests. Search targets may be wildcard
/// patterns or aliases, so only blank names are refused; empty value lists
/// are sent as-is and match nothing.
fn validate_request(request: &QueryRequest) -> Result<(), SearchError> {
    if request
        .target_indices()
        .iter()
        .any(|index| index.trim().is_empty())
    {
        return Err(SearchError::validation("search target names must not be blank"));
    }
    if let Some(sort) = &request.sort {
        require_field(&sort.field)?;
    }

    match &request.predicate {
        Predicate::IdsIn { .. } | Predicate::MatchAll => Ok(()),
        Predicate::TermEquals { field, .. }
        | Predicate::TermsIn { field, .. }
        | Predicate::MatchText { field, .. }
        | Predicate::RangeText { field, .. }
        | Predicate::RangeNumeric { field, .. } => require_field(field),
        Predicate::MultiFieldMatch { fields, .. } => {
            fields.iter().try_for_each(|field| require_field(field))
        }
    }
}
