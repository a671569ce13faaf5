//! Normalized search results.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One document returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// The document's identifier within its index.
    pub document_id: String,
    /// The index the document was found in.
    pub index: String,
    /// Relevance score. `None` when the engine did not score the hit
    /// (for example when an explicit sort was requested).
    pub score: Option<f32>,
    /// The document source as a structured map.
    pub body: Map<String, Value>,
    /// The document source serialized as JSON text.
    pub body_text: String,
}

impl Hit {
    /// Deserialize the source into a caller type.
    pub fn deserialize_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.body.clone()))
    }
}

/// The uniform result of every search, independent of the predicate used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Total matching documents as reported by the engine.
    pub total_count: i64,
    /// Highest score in the result set, absent when nothing was scored.
    pub max_score: Option<f32>,
    /// Hits in engine order.
    pub hits: Vec<Hit>,
}

impl ResultEnvelope {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Identifiers of the returned hits, in order.
    pub fn document_ids(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.document_id.as_str()).collect()
    }
}
