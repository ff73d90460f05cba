//! Validated document with dialect-normalised accessors

use super::types::{
    AdditionalProperties, Parameter, PathItem, RawDocument, ReferenceOr, RequestBody, Response,
    Schema,
};
use indexmap::IndexMap;
use restmap_common::{Dialect, DocumentInfo, RestMapError, Result};
use serde_json::Value;

const COMPONENT_SCHEMAS: &str = "#/components/schemas/";
const DEFINITIONS: &str = "#/definitions/";

/// A parsed OpenAPI or Swagger document
///
/// Immutable once constructed. All `$ref` lookups go through this type so the
/// rest of the parser never has to care which dialect it is looking at.
#[derive(Debug, Clone)]
pub struct Document {
    raw: RawDocument,
    dialect: Dialect,
}

impl Document {
    /// Validate the structure of a deserialised document and type it
    ///
    /// Fails when the dialect marker is missing or unsupported, when
    /// `info.title`/`info.version` are absent, or when `paths` is not an
    /// object.
    pub fn from_value(mut value: Value) -> Result<Self> {
        let root = value
            .as_object_mut()
            .ok_or_else(|| RestMapError::Validation("document root must be an object".into()))?;

        let dialect = detect_dialect(root)?;

        let info = root
            .get_mut("info")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| RestMapError::Validation("missing info object".into()))?;
        if !info.get("title").is_some_and(Value::is_string) {
            return Err(RestMapError::Validation("missing info.title".into()));
        }
        // YAML turns `version: 1.0` into a number
        let numeric_version = match info.get("version") {
            Some(Value::String(_)) => None,
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => return Err(RestMapError::Validation("missing info.version".into())),
        };
        if let Some(version) = numeric_version {
            info.insert("version".into(), Value::String(version));
        }

        match root.get("paths") {
            Some(Value::Object(_)) => {}
            Some(_) => return Err(RestMapError::Validation("paths must be an object".into())),
            None => return Err(RestMapError::Validation("missing paths".into())),
        }

        // Schema fragments are lenient; what still fails here is a malformed
        // path item, operation or parameter
        let raw: RawDocument = serde_json::from_value(value)?;

        Ok(Self { raw, dialect })
    }

    /// Parse and validate a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| RestMapError::Parse(format!("Failed to parse JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn raw(&self) -> &RawDocument {
        &self.raw
    }

    pub fn paths(&self) -> &IndexMap<String, PathItem> {
        &self.raw.paths
    }

    /// Server base URLs, normalised across dialects
    pub fn servers(&self) -> Vec<String> {
        match self.dialect {
            Dialect::OpenApi3 => self.raw.servers.iter().map(|s| s.url.clone()).collect(),
            Dialect::Swagger2 => {
                let base_path = self.raw.base_path.clone().unwrap_or_default();
                match self.raw.host {
                    Some(ref host) => {
                        let schemes: Vec<&str> = if self.raw.schemes.is_empty() {
                            vec!["https"]
                        } else {
                            self.raw.schemes.iter().map(String::as_str).collect()
                        };
                        schemes
                            .into_iter()
                            .map(|scheme| format!("{}://{}{}", scheme, host, base_path))
                            .collect()
                    }
                    None if !base_path.is_empty() => vec![base_path],
                    None => Vec::new(),
                }
            }
        }
    }

    pub fn info(&self) -> DocumentInfo {
        let servers = self.servers();
        DocumentInfo {
            title: self.raw.info.title.clone(),
            version: self.raw.info.version.clone(),
            description: self.raw.info.description.clone(),
            dialect: self.dialect,
            base_url: servers.first().cloned().unwrap_or_default(),
            servers,
            tags: self.raw.tags.iter().map(|t| t.name.clone()).collect(),
        }
    }

    /// Schema definitions table
    pub fn definitions(&self) -> &IndexMap<String, Schema> {
        match self.dialect {
            Dialect::Swagger2 => &self.raw.definitions,
            Dialect::OpenApi3 => match self.raw.components {
                Some(ref components) => &components.schemas,
                None => &self.raw.definitions,
            },
        }
    }

    /// Resolve an internal schema reference
    ///
    /// Follows the segments after the definition name through `properties`,
    /// `items`, `additionalProperties` and composition branches, e.g.
    /// `#/components/schemas/Pet/properties/owner`. External references and
    /// references into other tables return `None`.
    pub fn resolve_schema_ref(&self, ref_path: &str) -> Option<&Schema> {
        let rest = ref_path
            .strip_prefix(COMPONENT_SCHEMAS)
            .or_else(|| ref_path.strip_prefix(DEFINITIONS))?;

        let mut segments = rest.split('/').map(unescape_pointer);
        let name = segments.next()?;
        let mut schema = self
            .raw
            .components
            .as_ref()
            .and_then(|c| c.schemas.get(&name))
            .or_else(|| self.raw.definitions.get(&name))?;

        while let Some(segment) = segments.next() {
            schema = match segment.as_str() {
                "properties" => schema.properties.get(&segments.next()?)?,
                "items" => schema.items.as_deref()?,
                "additionalProperties" => match schema.additional_properties {
                    Some(AdditionalProperties::Schema(ref s)) => s.as_ref(),
                    _ => return None,
                },
                "allOf" | "oneOf" | "anyOf" => {
                    let branches = match segment.as_str() {
                        "allOf" => &schema.all_of,
                        "oneOf" => &schema.one_of,
                        _ => &schema.any_of,
                    };
                    branches.get(segments.next()?.parse::<usize>().ok()?)?
                }
                _ => return None,
            };
        }

        Some(schema)
    }

    /// Resolve a parameter, following `#/components/parameters/…` or
    /// `#/parameters/…`
    pub fn resolve_parameter<'a>(&'a self, param: &'a ReferenceOr<Parameter>) -> Option<&'a Parameter> {
        match param {
            ReferenceOr::Item(p) => Some(p),
            ReferenceOr::Reference { ref_path } => {
                let (name, table) = if let Some(name) = ref_path.strip_prefix("#/components/parameters/") {
                    (name, self.raw.components.as_ref().map(|c| &c.parameters))
                } else {
                    (ref_path.strip_prefix("#/parameters/")?, Some(&self.raw.parameters))
                };
                table?.get(&unescape_pointer(name))
            }
        }
    }

    /// Resolve a 3.x request body, following `#/components/requestBodies/…`
    pub fn resolve_request_body<'a>(
        &'a self,
        body: &'a ReferenceOr<RequestBody>,
    ) -> Option<&'a RequestBody> {
        match body {
            ReferenceOr::Item(b) => Some(b),
            ReferenceOr::Reference { ref_path } => {
                let name = ref_path.strip_prefix("#/components/requestBodies/")?;
                self.raw
                    .components
                    .as_ref()?
                    .request_bodies
                    .get(&unescape_pointer(name))
            }
        }
    }

    /// Resolve a response, following `#/components/responses/…` or
    /// `#/responses/…`
    pub fn resolve_response<'a>(&'a self, response: &'a ReferenceOr<Response>) -> Option<&'a Response> {
        match response {
            ReferenceOr::Item(r) => Some(r),
            ReferenceOr::Reference { ref_path } => {
                let (name, table) = if let Some(name) = ref_path.strip_prefix("#/components/responses/") {
                    (name, self.raw.components.as_ref().map(|c| &c.responses))
                } else {
                    (ref_path.strip_prefix("#/responses/")?, Some(&self.raw.responses))
                };
                table?.get(&unescape_pointer(name))
            }
        }
    }
}

fn detect_dialect(root: &serde_json::Map<String, Value>) -> Result<Dialect> {
    if let Some(marker) = root.get("openapi") {
        let version = marker
            .as_str()
            .ok_or_else(|| RestMapError::Validation("openapi version must be a string".into()))?;
        return if version.starts_with('3') {
            Ok(Dialect::OpenApi3)
        } else {
            Err(RestMapError::Validation(format!(
                "unsupported OpenAPI version: {}",
                version
            )))
        };
    }

    if let Some(marker) = root.get("swagger") {
        let version = marker
            .as_str()
            .ok_or_else(|| RestMapError::Validation("swagger version must be a string".into()))?;
        return if version.starts_with('2') {
            Ok(Dialect::Swagger2)
        } else {
            Err(RestMapError::Validation(format!(
                "unsupported Swagger version: {}",
                version
            )))
        };
    }

    Err(RestMapError::Validation(
        "missing dialect marker: expected an `openapi` or `swagger` field".into(),
    ))
}

/// JSON pointer unescaping: `~1` is `/`, `~0` is `~`
fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
