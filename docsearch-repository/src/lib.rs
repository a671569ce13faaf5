//! # Docsearch Repository
//!
//! Traits and implementations for talking to an Elasticsearch-compatible
//! search engine. It holds the error taxonomy, the `SearchEngineClient`
//! transport trait with its OpenSearch implementation, the query builder and
//! result normalizer, and the `SearchIndexClient` facade applications use.
//!
//! ```ignore
//! let engine = Arc::new(OpenSearchClient::new(&ConnectionConfig::default())?);
//! let client = SearchIndexClient::new(engine);
//!
//! let request = QueryRequest::term("userName", "最强法海").in_indices(["myes"]);
//! let envelope = client.search(&request).await?;
//! ```

pub mod client;
pub mod completion;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::SearchIndexClient;
pub use completion::Completion;
pub use config::{ConnectionConfig, Credentials, SearchIndexConfig};
pub use errors::SearchError;
pub use interfaces::SearchEngineClient;
pub use opensearch::{IndexSettings, IndexTemplate, OpenSearchClient, QueryBuilder, RawFieldMapping};
pub use types::{
    BulkAction, BulkItemResult, BulkSummary, StoredDocument, WriteOutcome, WriteResponse,
};
