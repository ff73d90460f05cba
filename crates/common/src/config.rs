//! Parser configuration loaded from YAML files
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock behaviour.

use crate::{RestMapError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Path segments that name an action rather than a resource
pub const DEFAULT_ACTION_SEGMENTS: &[&str] = &[
    "actions", "action", "status", "health", "metrics", "search", "login", "logout", "refresh",
    "validate", "verify",
];

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// How many `$ref`s may be expanded inside one another before the next one
/// resolves to an opaque object
pub const DEFAULT_MAX_REF_DEPTH: usize = 6;

/// How a resource's field schema is derived from its operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaStrategy {
    /// Fields come from successful responses, with arrays and paginated
    /// envelopes unwrapped to the item schema
    #[default]
    ResponseEnvelope,
    /// Response fields plus request-body fields of every operation
    OperationAggregate,
}

/// Parser settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub schema_strategy: SchemaStrategy,

    /// Replaces the default action deny-list
    pub action_segments: Vec<String>,

    /// Appended to `action_segments`
    pub extra_action_segments: Vec<String>,

    /// Literal segments that never form part of a resource chain (e.g. "api")
    pub ignored_segments: Vec<String>,

    /// Drop `v1`, `v2`, ... segments
    pub strip_version_segments: bool,

    pub fetch_timeout_secs: u64,

    /// Nesting limit for `$ref` expansion in field trees
    pub max_ref_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            schema_strategy: SchemaStrategy::default(),
            action_segments: DEFAULT_ACTION_SEGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extra_action_segments: Vec::new(),
            ignored_segments: Vec::new(),
            strip_version_segments: false,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_ref_depth: DEFAULT_MAX_REF_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        Self::from_yaml(&content).map_err(|e| {
            RestMapError::Parse(format!("Failed to parse config YAML from {:?}: {}", path, e))
        })
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        // serde_yaml rejects an empty document; treat it as all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Effective action deny-list
    pub fn action_words(&self) -> impl Iterator<Item = &str> {
        self.action_segments
            .iter()
            .chain(self.extra_action_segments.iter())
            .map(String::as_str)
    }
}
