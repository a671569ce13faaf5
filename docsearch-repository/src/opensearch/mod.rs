//! OpenSearch implementation of the search engine client.
//!
//! This module provides the concrete `SearchEngineClient` over the OpenSearch
//! REST API, together with the pieces that speak its query DSL: the query
//! builder, the response parsers and index settings.

mod client;
mod index_config;
mod queries;
mod response;

pub use client::OpenSearchClient;
pub use index_config::{validate_index_name, IndexSettings, IndexTemplate};
pub use queries::{QueryBuilder, RawFieldMapping};
pub use response::{
    normalize_search_response, parse_acknowledged, parse_bulk_response, parse_delete_response,
    parse_stored_document, parse_write_response,
};
