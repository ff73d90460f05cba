//! OpenAPI/Swagger document → resource hierarchy
//!
//! This crate turns a REST API description into a tree of `ResourceNode`s
//! that generic tooling can navigate without per-API code.
//!
//! ## Pipeline
//!
//! 1. [`SpecLoader`] fetches the document (URL or file, JSON or YAML)
//! 2. [`Document`] validates it and normalises the two dialects
//! 3. [`PathClassifier`] turns each path template into a resource chain:
//!    - `/users/{id}/posts/{postId}/comments` → `users.posts.comments`
//!    - `/users/{id}/verify` → `users` (action words are dropped)
//! 4. [`OperationExtractor`] and [`SchemaResolver`] collect operations and
//!    fields per path
//! 5. [`ResourceHierarchyBuilder`] groups paths by chain and nests the nodes
//! 6. [`ResourceClassifier`] and [`StatsCalculator`] label and count
//!
//! [`SpecAnalyzer`] runs the whole pipeline behind an [`AnalysisCache`].

mod analyzer;
mod cache;
mod classifier;
mod hierarchy;
mod naming;
pub mod openapi;
mod operation_extractor;
mod path_classifier;
mod schema_resolver;
mod stats;
mod type_mapper;

pub use analyzer::{analyze, SpecAnalyzer};
pub use cache::AnalysisCache;
pub use classifier::ResourceClassifier;
pub use hierarchy::ResourceHierarchyBuilder;
pub use naming::{humanize, to_snake_case};
pub use openapi::{Document, DocumentSource, SpecLoader};
pub use operation_extractor::OperationExtractor;
pub use path_classifier::{PathClassifier, ResourceChain};
pub use schema_resolver::SchemaResolver;
pub use stats::StatsCalculator;
pub use type_mapper::TypeMapper;

use restmap_common::{Analysis, ParserConfig, Result};

/// Analyse a JSON document string in one call, without caching
///
/// # Examples
/// ```
/// use restmap_common::ParserConfig;
///
/// let analysis = restmap_parser::analyze_json(
///     r#"{
///         "openapi": "3.0.0",
///         "info": {"title": "Blog", "version": "1"},
///         "paths": {"/posts": {"get": {"responses": {}}}}
///     }"#,
///     &ParserConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(analysis.resources[0].key, "posts");
/// ```
pub fn analyze_json(json: &str, config: &ParserConfig) -> Result<Analysis> {
    let doc = Document::from_json(json)?;
    Ok(analyze(&doc, &doc.info().title, config))
}
