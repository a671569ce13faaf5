//! # Docsearch
//!
//! Command-line entry point for the docsearch facade.
//!
//! This crate reads the engine connection from the environment, wires the
//! `SearchIndexClient`, and maps command-line invocations onto its operations.

pub mod cli;
pub mod config;

pub use config::{AppConfig, Dependencies};

use docsearch_repository::SearchError;
use thiserror::Error;

/// Errors that can occur while configuring or running a command.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed command input, such as a document that is not an object.
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed JSON input.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an input error.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::InputError(msg.into())
    }
}
