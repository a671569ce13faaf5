//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client. The same REST API is served by
//! Elasticsearch, so either engine works behind it.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials as AuthCredentials,
    cluster::ClusterHealthParts,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{
        IndicesCloseParts, IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts,
        IndicesOpenParts, IndicesPutSettingsParts, IndicesPutTemplateParts,
    },
    BulkParts, DeleteParts, ExistsParts, GetParts, IndexParts, OpenSearch, SearchParts,
    UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::ConnectionConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::response::{
    parse_acknowledged, parse_bulk_response, parse_delete_response, parse_stored_document,
    parse_write_response,
};
use crate::types::{BulkAction, BulkSummary, StoredDocument, WriteResponse};

/// OpenSearch client implementation.
///
/// Holds one long-lived connection to the engine. Construct it once and share
/// it (usually inside a `SearchIndexClient`).
///
/// # Example
///
/// ```ignore
/// let config = ConnectionConfig::new("localhost", 9200).with_credentials("admin", "admin");
/// let client = OpenSearchClient::new(&config)?;
/// let client = SearchIndexClient::new(Arc::new(client));
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    operation_timeout: Option<String>,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client for the configured endpoint.
    ///
    /// No request is sent; use `health_check` to verify the engine is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError::ConnectionError)` - If the URL or transport is invalid
    pub fn new(config: &ConnectionConfig) -> Result<Self, SearchError> {
        let url = config.url()?;

        let conn_pool = SingleNodeConnectionPool::new(url.clone());
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();

        if let Some(credentials) = &config.credentials {
            builder = builder.auth(AuthCredentials::Basic(
                credentials.username.clone(),
                credentials.password.clone(),
            ));
        }
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(
            url = %url,
            authenticated = config.credentials.is_some(),
            "Created OpenSearch client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
            operation_timeout: config.operation_timeout.clone(),
        })
    }

    /// Read a successful JSON body, or turn the status into a `SearchError`.
    async fn read_json(response: Response, operation: &str) -> Result<Value, SearchError> {
        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                operation = %operation,
                status = %status,
                body = %error_body,
                "Request failed"
            );
            return Err(SearchError::from_status(status.as_u16(), error_body));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Map a HEAD-style response onto a boolean: 200 exists, 404 does not.
    async fn read_exists(response: Response, operation: &str) -> Result<bool, SearchError> {
        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => {
                let error_body = response.text().await.unwrap_or_default();
                error!(operation = %operation, status, body = %error_body, "Request failed");
                Err(SearchError::from_status(status, error_body))
            }
        }
    }

    /// Bulk request body: one metadata line per action, plus a source line
    /// for index and update actions.
    fn bulk_body(actions: &[BulkAction]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(actions.len() * 2);
        for action in actions {
            match action {
                BulkAction::Index { id, source } => {
                    let meta = match id {
                        Some(id) => json!({ "index": { "_id": id } }),
                        None => json!({ "index": {} }),
                    };
                    body.push(JsonBody::new(meta));
                    body.push(JsonBody::new(source.clone()));
                }
                BulkAction::Update { id, doc } => {
                    body.push(JsonBody::new(json!({ "update": { "_id": id } })));
                    body.push(JsonBody::new(json!({ "doc": doc })));
                }
                BulkAction::Delete { id } => {
                    body.push(JsonBody::new(json!({ "delete": { "_id": id } })));
                }
            }
        }
        body
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    async fn create_index(&self, index: &str, body: &Value) -> Result<bool, SearchError> {
        let indices_api = self.client.indices();
        let mut request = indices_api
            .create(IndicesCreateParts::Index(index))
            .body(body);
        if let Some(timeout) = self.operation_timeout.as_deref() {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let acknowledged = parse_acknowledged(&Self::read_json(response, "create_index").await?)?;

        info!(index = %index, acknowledged, "Index created");
        Ok(acknowledged)
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        let indices = [index];
        let indices_api = self.client.indices();
        let mut request = indices_api
            .delete(IndicesDeleteParts::Index(&indices));
        if let Some(timeout) = self.operation_timeout.as_deref() {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let acknowledged = parse_acknowledged(&Self::read_json(response, "delete_index").await?)?;

        info!(index = %index, acknowledged, "Index deleted");
        Ok(acknowledged)
    }

    async fn index_exists(&self, indices: &[&str]) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(indices))
            .send()
            .await?;

        let exists = Self::read_exists(response, "index_exists").await?;
        debug!(indices = ?indices, exists, "Checked index existence");
        Ok(exists)
    }

    async fn open_index(&self, index: &str) -> Result<bool, SearchError> {
        let indices = [index];
        let response = self
            .client
            .indices()
            .open(IndicesOpenParts::Index(&indices))
            .send()
            .await?;

        let acknowledged = parse_acknowledged(&Self::read_json(response, "open_index").await?)?;
        info!(index = %index, acknowledged, "Index opened");
        Ok(acknowledged)
    }

    async fn close_index(&self, index: &str) -> Result<bool, SearchError> {
        let indices = [index];
        let response = self
            .client
            .indices()
            .close(IndicesCloseParts::Index(&indices))
            .send()
            .await?;

        let acknowledged = parse_acknowledged(&Self::read_json(response, "close_index").await?)?;
        info!(index = %index, acknowledged, "Index closed");
        Ok(acknowledged)
    }

    async fn put_index_settings(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<bool, SearchError> {
        let indices = [index];
        let response = self
            .client
            .indices()
            .put_settings(IndicesPutSettingsParts::Index(&indices))
            .body(settings)
            .send()
            .await?;

        let acknowledged =
            parse_acknowledged(&Self::read_json(response, "put_index_settings").await?)?;
        info!(index = %index, acknowledged, "Index settings updated");
        Ok(acknowledged)
    }

    async fn put_index_template(&self, name: &str, body: &Value) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .put_template(IndicesPutTemplateParts::Name(name))
            .body(body)
            .send()
            .await?;

        let acknowledged =
            parse_acknowledged(&Self::read_json(response, "put_index_template").await?)?;
        info!(template = %name, acknowledged, "Index template registered");
        Ok(acknowledged)
    }

    async fn index_document(
        &self,
        index: &str,
        id: Option<&str>,
        source: &Value,
    ) -> Result<WriteResponse, SearchError> {
        let parts = match id {
            Some(id) => IndexParts::IndexId(index, id),
            None => IndexParts::Index(index),
        };
        let mut request = self.client.index(parts).body(source);
        if let Some(timeout) = self.operation_timeout.as_deref() {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let written = parse_write_response(&Self::read_json(response, "index_document").await?)?;

        debug!(
            index = %written.index,
            doc_id = %written.document_id,
            outcome = ?written.outcome,
            "Document indexed"
        );
        Ok(written)
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<StoredDocument, SearchError> {
        let response = self.client.get(GetParts::IndexId(index, id)).send().await?;

        // A missing document answers 404 with a `found: false` body; a missing
        // index answers 404 with an error body. Both are NotFound.
        let body = Self::read_json(response, "get_document").await?;
        parse_stored_document(&body)
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .exists(ExistsParts::IndexId(index, id))
            .send()
            .await?;

        Self::read_exists(response, "document_exists").await
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
    ) -> Result<WriteResponse, SearchError> {
        let mut request = self
            .client
            .update(UpdateParts::IndexId(index, id))
            .body(json!({ "doc": doc }));
        if let Some(timeout) = self.operation_timeout.as_deref() {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let written = parse_write_response(&Self::read_json(response, "update_document").await?)?;

        debug!(
            index = %index,
            doc_id = %id,
            outcome = ?written.outcome,
            "Document updated"
        );
        Ok(written)
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<WriteResponse, SearchError> {
        let mut request = self.client.delete(DeleteParts::IndexId(index, id));
        if let Some(timeout) = self.operation_timeout.as_deref() {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status_code().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        match parse_delete_response(status, &body) {
            Ok(written) => {
                debug!(
                    index = %index,
                    doc_id = %id,
                    outcome = ?written.outcome,
                    "Document deleted"
                );
                Ok(written)
            }
            Err(e) => {
                error!(
                    index = %index,
                    doc_id = %id,
                    status = status,
                    body = %body,
                    "Delete request failed"
                );
                Err(e)
            }
        }
    }

    async fn bulk(&self, index: &str, actions: &[BulkAction]) -> Result<BulkSummary, SearchError> {
        let mut request = self
            .client
            .bulk(BulkParts::Index(index))
            .body(Self::bulk_body(actions));
        if let Some(timeout) = self.operation_timeout.as_deref() {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let summary = parse_bulk_response(&Self::read_json(response, "bulk").await?)?;

        if summary.has_failures() {
            error!(
                index = %index,
                total = summary.total,
                failed = summary.failed,
                "Bulk request had failures"
            );
        } else {
            debug!(index = %index, total = summary.total, "Bulk request completed");
        }
        Ok(summary)
    }

    async fn search(&self, indices: &[String], body: &Value) -> Result<Value, SearchError> {
        let index_refs: Vec<&str> = indices.iter().map(String::as_str).collect();
        let parts = if index_refs.is_empty() {
            SearchParts::None
        } else {
            SearchParts::Index(&index_refs)
        };

        let response = self.client.search(parts).body(body).send().await?;
        Self::read_json(response, "search").await
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await?;

        let body = Self::read_json(response, "health_check").await?;
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| SearchError::parse("Health response is missing 'status'"))?;

        debug!(status = %status, "Cluster health");
        Ok(status == "green" || status == "yellow")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let config = ConnectionConfig::new("", 9200);
        assert!(matches!(
            OpenSearchClient::new(&config),
            Err(SearchError::ConnectionError(_))
        ));
    }

    #[test]
    fn test_new_builds_client() {
        let config = ConnectionConfig::new("localhost", 9200)
            .with_credentials("admin", "admin")
            .with_request_timeout(std::time::Duration::from_secs(5))
            .with_operation_timeout("30s");

        let client = OpenSearchClient::new(&config).unwrap();
        assert_eq!(client.operation_timeout.as_deref(), Some("30s"));
    }

    #[test]
    fn test_bulk_body_lines() {
        let actions = vec![
            BulkAction::Index {
                id: Some("1".to_string()),
                source: json!({ "userName": "a" }),
            },
            BulkAction::Index {
                id: None,
                source: json!({ "userName": "b" }),
            },
            BulkAction::Update {
                id: "2".to_string(),
                doc: json!({ "age": 3 }),
            },
            BulkAction::Delete {
                id: "3".to_string(),
            },
        ];

        // index(2) + index(2) + update(2) + delete(1)
        let body = OpenSearchClient::bulk_body(&actions);
        assert_eq!(body.len(), 7);
    }
}
