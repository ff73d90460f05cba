//! Common types and utilities for restmap
//!
//! This crate contains the resource model produced by the parser, the error
//! taxonomy, and the parser configuration shared across the parser, manager,
//! and CLI components.

pub mod analysis;
pub mod config;
pub mod field;
pub mod resource;

pub use analysis::{Analysis, AnalysisStats, Dialect, DocumentInfo};
pub use config::{ParserConfig, SchemaStrategy, DEFAULT_ACTION_SEGMENTS, DEFAULT_MAX_REF_DEPTH};
pub use field::{FieldConstraints, FieldDefinition, FieldType};
pub use resource::{
    join_key, split_key, Classification, HttpMethod, OperationInfo, ParameterInfo,
    ParameterLocation, ResourceNode,
};

use thiserror::Error;

/// Errors that can occur while loading or analysing a document
#[derive(Error, Debug)]
pub enum RestMapError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid document: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for restmap operations
pub type Result<T> = std::result::Result<T, RestMapError>;
