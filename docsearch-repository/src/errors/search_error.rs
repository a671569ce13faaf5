//! Search error types.
//!
//! This module defines the errors surfaced by search engine operations. Engine
//! failures are passed through with their status and body; nothing is retried.

use thiserror::Error;

/// Errors that can occur during search engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The transport to the search engine could not be built.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request could not be delivered or its response could not be read.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Target index or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A concurrent write changed the document first.
    #[error("Version conflict: {0}")]
    VersionConflict(String),

    /// The engine rejected the request.
    #[error("Engine returned status {status}: {body}")]
    EngineError { status: u16, body: String },

    /// The engine response is missing required fields.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A caller document could not be turned into a JSON object.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The request parameters are invalid.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// A background operation finished without delivering its result.
    #[error("Background operation dropped before completing")]
    TaskDropped,
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a version conflict error.
    pub fn version_conflict(msg: impl Into<String>) -> Self {
        Self::VersionConflict(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Classify a non-success HTTP status returned by the engine.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            404 => Self::NotFound(body),
            409 => Self::VersionConflict(body),
            _ => Self::EngineError { status, body },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict(_))
    }
}

impl From<opensearch::Error> for SearchError {
    fn from(err: opensearch::Error) -> Self {
        Self::TransportError(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
