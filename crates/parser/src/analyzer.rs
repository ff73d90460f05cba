//! Analysis pipeline and cached façade
//!
//! [`analyze`] is the synchronous pipeline: hierarchy building (path
//! classification, operation extraction and schema resolution per path),
//! classification and stats. [`SpecAnalyzer`] adds document retrieval and the
//! [`AnalysisCache`] in front of it.

use crate::cache::AnalysisCache;
use crate::hierarchy::ResourceHierarchyBuilder;
use crate::openapi::{Document, DocumentSource, SpecLoader};
use crate::stats::StatsCalculator;
use chrono::Utc;
use restmap_common::{Analysis, ParserConfig, Result};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build an analysis from a validated document
pub fn analyze(doc: &Document, cache_key: &str, config: &ParserConfig) -> Analysis {
    let resources = ResourceHierarchyBuilder::new(doc, config).build();
    let stats = StatsCalculator::calculate(doc, &resources);

    info!(
        key = cache_key,
        dialect = %doc.dialect(),
        paths = stats.total_paths,
        resources = stats.total_resources,
        "analysed document"
    );

    Analysis {
        info: doc.info(),
        resources,
        stats,
        cache_key: cache_key.to_string(),
        parsed_at: Utc::now(),
    }
}

/// Digest of the settings that change an analysis; fetch settings excluded
fn config_fingerprint(config: &ParserConfig) -> String {
    let mut hasher = DefaultHasher::new();
    config.schema_strategy.hash(&mut hasher);
    config.action_words().for_each(|word| word.hash(&mut hasher));
    config.ignored_segments.hash(&mut hasher);
    config.strip_version_segments.hash(&mut hasher);
    config.max_ref_depth.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Fetches, analyses and caches documents
///
/// Entries in the shared [`AnalysisCache`] are scoped by the analysis
/// settings, so analyzers with different configs can share one cache without
/// seeing each other's results.
///
/// # Example
/// ```rust,ignore
/// let analyzer = SpecAnalyzer::new(ParserConfig::default())?;
/// let analysis = analyzer.parse("https://petstore3.swagger.io/api/v3/openapi.json").await?;
/// println!("{} resources", analysis.stats.total_resources);
/// ```
pub struct SpecAnalyzer<S = SpecLoader> {
    source: S,
    config: ParserConfig,
    cache: Arc<AnalysisCache>,
    scope: String,
}

impl SpecAnalyzer<SpecLoader> {
    /// Analyzer backed by the default loader and a fresh cache
    pub fn new(config: ParserConfig) -> Result<Self> {
        let source = SpecLoader::new(Duration::from_secs(config.fetch_timeout_secs))?;
        Ok(Self::with_source(source, config, Arc::new(AnalysisCache::new())))
    }
}

impl<S: DocumentSource> SpecAnalyzer<S> {
    pub fn with_source(source: S, config: ParserConfig, cache: Arc<AnalysisCache>) -> Self {
        Self {
            source,
            scope: config_fingerprint(&config),
            config,
            cache,
        }
    }

    /// Cache slot of `key` under this analyzer's settings
    fn slot(&self, key: &str) -> String {
        format!("{}@{}", key, self.scope)
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }

    /// Analysis of the document at `location`, served from the cache when
    /// present; `location` is the cache key
    pub async fn parse(&self, location: &str) -> Result<Arc<Analysis>> {
        self.cache
            .get_or_try_insert_with(&self.slot(location), || async {
                let value = self.source.fetch(location).await?;
                let doc = Document::from_value(value)?;
                Ok(analyze(&doc, location, &self.config))
            })
            .await
    }

    /// Analysis of an already deserialised document, cached under `key`
    pub async fn parse_value(&self, key: &str, value: Value) -> Result<Arc<Analysis>> {
        self.cache
            .get_or_try_insert_with(&self.slot(key), || async move {
                let doc = Document::from_value(value)?;
                Ok(analyze(&doc, key, &self.config))
            })
            .await
    }

    /// Drop any cached analysis for `location` and parse it again
    pub async fn reparse(&self, location: &str) -> Result<Arc<Analysis>> {
        self.cache.invalidate(&self.slot(location));
        self.parse(location).await
    }

    pub fn clear_cache(&self, key: &str) -> bool {
        self.cache.invalidate(&self.slot(key))
    }

    pub fn clear_all(&self) {
        self.cache.clear();
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.contains(&self.slot(key))
    }

    pub fn get_cached(&self, key: &str) -> Option<Arc<Analysis>> {
        self.cache.get(&self.slot(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::MockDocumentSource;
    use restmap_common::{RestMapError, SchemaStrategy};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LOCATION: &str = "https://api.example.com/openapi.json";

    fn library() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Library", "version": "2.1.0"},
            "servers": [{"url": "https://api.example.com/v2"}],
            "paths": {
                "/books": {"get": {"responses": {}}, "post": {"responses": {}}},
                "/books/{id}": {"get": {"responses": {}}, "put": {"responses": {}}, "delete": {"responses": {}}}
            }
        })
    }

    fn analyzer(source: MockDocumentSource) -> SpecAnalyzer<MockDocumentSource> {
        SpecAnalyzer::with_source(source, ParserConfig::default(), Arc::new(AnalysisCache::new()))
    }

    #[test]
    fn test_analyze() {
        let doc = Document::from_value(library()).unwrap();
        let analysis = analyze(&doc, "library", &ParserConfig::default());

        assert_eq!(analysis.cache_key, "library");
        assert_eq!(analysis.info.title, "Library");
        assert_eq!(analysis.info.base_url, "https://api.example.com/v2");
        assert_eq!(analysis.resources.len(), 1);
        assert_eq!(analysis.stats.total_paths, 2);
        assert_eq!(analysis.stats.total_operations, 5);
        assert_eq!(analysis.stats.restful_resources, 1);
    }

    #[tokio::test]
    async fn test_parse_is_cached() {
        let mut source = MockDocumentSource::new();
        source
            .expect_fetch()
            .withf(|location| location == LOCATION)
            .times(1)
            .returning(|_| Ok(library()));

        let analyzer = analyzer(source);
        assert!(!analyzer.is_cached(LOCATION));
        assert!(analyzer.get_cached(LOCATION).is_none());

        let first = analyzer.parse(LOCATION).await.unwrap();
        let second = analyzer.parse(LOCATION).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(analyzer.is_cached(LOCATION));
        assert!(analyzer.get_cached(LOCATION).is_some());
    }

    #[tokio::test]
    async fn test_clear_cache_triggers_one_fresh_fetch() {
        let mut source = MockDocumentSource::new();
        source
            .expect_fetch()
            .times(2)
            .returning(|_| Ok(library()));

        let analyzer = analyzer(source);
        let first = analyzer.parse(LOCATION).await.unwrap();

        assert!(analyzer.clear_cache(LOCATION));
        assert!(!analyzer.is_cached(LOCATION));

        let second = analyzer.parse(LOCATION).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.resources, second.resources);

        // served from cache again
        analyzer.parse(LOCATION).await.unwrap();
    }

    #[tokio::test]
    async fn test_reparse_and_clear_all() {
        let mut source = MockDocumentSource::new();
        source
            .expect_fetch()
            .times(3)
            .returning(|_| Ok(library()));

        let analyzer = analyzer(source);
        analyzer.parse(LOCATION).await.unwrap();
        analyzer.reparse(LOCATION).await.unwrap();

        analyzer.clear_all();
        assert!(!analyzer.is_cached(LOCATION));
        analyzer.parse(LOCATION).await.unwrap();
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let calls = AtomicUsize::new(0);
        let mut source = MockDocumentSource::new();
        source.expect_fetch().times(3).returning(move |_| {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(RestMapError::Http {
                    status: 503,
                    url: LOCATION.to_string(),
                }),
                1 => Ok(json!({"openapi": "3.0.0", "info": {"title": "T"}, "paths": {}})),
                _ => Ok(library()),
            }
        });

        let analyzer = analyzer(source);

        let err = analyzer.parse(LOCATION).await.unwrap_err();
        assert!(matches!(err, RestMapError::Http { status: 503, .. }));
        assert!(!analyzer.is_cached(LOCATION));

        let err = analyzer.parse(LOCATION).await.unwrap_err();
        assert!(matches!(err, RestMapError::Validation(_)));
        assert!(!analyzer.is_cached(LOCATION));

        assert!(analyzer.parse(LOCATION).await.is_ok());
        assert!(analyzer.is_cached(LOCATION));
    }

    #[tokio::test]
    async fn test_concurrent_parses_fetch_once() {
        let mut source = MockDocumentSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(library()));

        let analyzer = analyzer(source);
        let (a, b) = tokio::join!(analyzer.parse(LOCATION), analyzer.parse(LOCATION));

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_parse_value_and_shared_cache() {
        let cache = Arc::new(AnalysisCache::new());
        let first = SpecAnalyzer::with_source(
            MockDocumentSource::new(),
            ParserConfig::default(),
            Arc::clone(&cache),
        );
        let second = SpecAnalyzer::with_source(
            MockDocumentSource::new(),
            ParserConfig::default(),
            Arc::clone(&cache),
        );

        let analysis = first.parse_value("inline", library()).await.unwrap();
        assert_eq!(analysis.cache_key, "inline");
        assert!(second.is_cached("inline"));

        let err = first.parse_value("bad", json!([])).await.unwrap_err();
        assert!(matches!(err, RestMapError::Validation(_)));
        assert!(!second.is_cached("bad"));
    }

    #[tokio::test]
    async fn test_shared_cache_is_scoped_by_strategy() {
        let doc = json!({
            "openapi": "3.0.0",
            "info": {"title": "Shop", "version": "1"},
            "paths": {"/books": {
                "get": {"responses": {"200": {"description": "ok", "content": {"application/json": {
                    "schema": {"type": "object", "properties": {"title": {"type": "string"}}}
                }}}}},
                "post": {
                    "requestBody": {"content": {"application/json": {
                        "schema": {"type": "object", "properties": {"isbn": {"type": "string"}}}
                    }}},
                    "responses": {}
                }
            }}
        });

        let cache = Arc::new(AnalysisCache::new());
        let envelope = SpecAnalyzer::with_source(
            MockDocumentSource::new(),
            ParserConfig::default(),
            Arc::clone(&cache),
        );
        let aggregate = SpecAnalyzer::with_source(
            MockDocumentSource::new(),
            ParserConfig {
                schema_strategy: SchemaStrategy::OperationAggregate,
                ..ParserConfig::default()
            },
            Arc::clone(&cache),
        );

        let narrow = envelope.parse_value("shop", doc.clone()).await.unwrap();
        assert!(!aggregate.is_cached("shop"));

        let wide = aggregate.parse_value("shop", doc).await.unwrap();
        assert!(!Arc::ptr_eq(&narrow, &wide));
        assert_eq!(narrow.resources[0].schema.len(), 1);
        assert_eq!(wide.resources[0].schema.len(), 2);
        assert_eq!(wide.cache_key, "shop");

        assert!(envelope.clear_cache("shop"));
        assert!(aggregate.is_cached("shop"));
        assert_eq!(cache.len(), 1);
    }
}
