//! Top-level analysis result

use crate::resource::ResourceNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema dialect of the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Swagger 2.0: `host`/`basePath`, `in: body` parameters, `definitions`
    #[serde(rename = "swagger2")]
    Swagger2,
    /// OpenAPI 3.x: `servers`, `requestBody`, `components.schemas`
    #[serde(rename = "openapi3")]
    OpenApi3,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Swagger2 => write!(f, "Swagger 2.0"),
            Dialect::OpenApi3 => write!(f, "OpenAPI 3.x"),
        }
    }
}

/// Document metadata carried into the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub dialect: Dialect,

    /// First server URL, or empty when the document declares none
    pub base_url: String,

    pub servers: Vec<String>,

    /// Tag names declared at document level
    pub tags: Vec<String>,
}

/// Whole-document counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_paths: usize,

    pub total_operations: usize,

    /// Resource nodes including nested ones
    pub total_resources: usize,

    pub restful_resources: usize,

    /// Document tags and operation tags, sorted and deduplicated
    pub tags: Vec<String>,
}

/// The result of analysing one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub info: DocumentInfo,

    /// Root-level resources; nested resources hang off `sub_resources`
    pub resources: Vec<ResourceNode>,

    pub stats: AnalysisStats,

    pub cache_key: String,

    pub parsed_at: DateTime<Utc>,
}
