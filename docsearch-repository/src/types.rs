//! Request and response types for index and document operations.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::SearchError;

/// What a write did to the target document, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Created,
    Updated,
    Deleted,
    NotFound,
    Noop,
}

impl WriteOutcome {
    /// Parse the engine's `result` field.
    pub fn parse(result: &str) -> Option<Self> {
        match result {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "deleted" => Some(Self::Deleted),
            "not_found" => Some(Self::NotFound),
            "noop" => Some(Self::Noop),
            _ => None,
        }
    }
}

/// Response to a single-document write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteResponse {
    pub index: String,
    pub document_id: String,
    pub version: Option<i64>,
    pub outcome: WriteOutcome,
}

/// A document fetched by id.
///
/// The source is available both as a map and as JSON text so callers can pick
/// either without fetching again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub index: String,
    pub document_id: String,
    pub version: Option<i64>,
    pub source: Map<String, Value>,
    pub source_text: String,
}

/// One action in a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    /// Index `source`, under `id` or an engine-generated id.
    Index { id: Option<String>, source: Value },
    /// Merge `doc` into the existing document `id`.
    Update { id: String, doc: Value },
    /// Delete document `id`.
    Delete { id: String },
}

impl BulkAction {
    /// The document id this action targets, if known before sending.
    pub fn id(&self) -> Option<&str> {
        match self {
            BulkAction::Index { id, .. } => id.as_deref(),
            BulkAction::Update { id, .. } | BulkAction::Delete { id } => Some(id),
        }
    }
}

/// Result of a bulk operation for a single item.
#[derive(Debug, Clone)]
pub struct BulkItemResult {
    /// The document id, as reported by the engine.
    pub document_id: Option<String>,
    /// HTTP status of this item.
    pub status: u16,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchError>,
}

/// Summary of a bulk operation containing aggregate statistics and individual results.
///
/// Bulk requests can partially fail; the summary lets callers see which items
/// went through.
#[derive(Debug, Clone, Default)]
pub struct BulkSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BulkItemResult>,
}

impl BulkSummary {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Build a summary from per-item results, counting successes and failures.
    pub fn from_results(results: Vec<BulkItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// A JSON view of the summary, errors rendered as strings.
    pub fn to_json(&self) -> Value {
        let items: Vec<Value> = self
            .results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "document_id": r.document_id,
                    "status": r.status,
                    "success": r.success,
                    "error": r.error.as_ref().map(|e| e.to_string()),
                })
            })
            .collect();

        serde_json::json!({
            "total": self.total,
            "succeeded": self.succeeded,
            "failed": self.failed,
            "results": items,
        })
    }
}
