//! Document retrieval
//!
//! Fetching is the only asynchronous step of an analysis. Everything after
//! [`DocumentSource::fetch`] runs synchronously on the returned value.

use async_trait::async_trait;
use restmap_common::{RestMapError, Result};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Something that can produce a raw document for a location
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Retrieve and deserialise the document at `location`
    async fn fetch(&self, location: &str) -> Result<Value>;
}

/// Loads documents from `http(s)://` URLs or local files
///
/// # Example
/// ```rust,ignore
/// let loader = SpecLoader::new(Duration::from_secs(30))?;
/// let value = loader.fetch("https://petstore3.swagger.io/api/v3/openapi.json").await?;
/// ```
#[derive(Debug, Clone)]
pub struct SpecLoader {
    client: reqwest::Client,
}

impl SpecLoader {
    /// Create a loader whose HTTP requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("restmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RestMapError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Load a document from a local file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Value> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| {
                RestMapError::Fetch(format!(
                    "Failed to read document {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;

        parse_content(&content)
    }

    async fn fetch_remote(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RestMapError::Fetch(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RestMapError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content = response
            .text()
            .await
            .map_err(|e| RestMapError::Fetch(format!("Failed to read body of {}: {}", url, e)))?;

        parse_content(&content)
    }
}

#[async_trait]
impl DocumentSource for SpecLoader {
    async fn fetch(&self, location: &str) -> Result<Value> {
        if location.starts_with("http://") || location.starts_with("https://") {
            debug!(url = location, "fetching remote document");
            self.fetch_remote(location).await
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            debug!(path, "reading local document");
            Self::from_file(path).await
        }
    }
}

/// Deserialise document text
///
/// JSON when the content starts with `{`, YAML otherwise.
pub fn parse_content(content: &str) -> Result<Value> {
    if content.trim_start().starts_with('{') {
        return serde_json::from_str(content)
            .map_err(|e| RestMapError::Parse(format!("Failed to parse JSON document: {}", e)));
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| RestMapError::Parse(format!("Failed to parse YAML document: {}", e)))?;
    Ok(yaml_to_json(yaml))
}

/// Convert YAML to JSON, stringifying non-string keys (`200:` response codes)
fn yaml_to_json(yaml: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .filter_map(|(k, v)| {
                    let key = match k {
                        Yaml::String(s) => s,
                        Yaml::Number(n) => n.to_string(),
                        Yaml::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((key, yaml_to_json(v)))
                })
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}
