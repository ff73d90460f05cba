//! OpenAPI 3.x / Swagger 2.0 type definitions
//!
//! One set of types covers both dialects: fields that only exist in one of
//! them are optional. Only what resource extraction needs is modelled.

use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

/// Document root, before dialect normalisation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// OpenAPI version marker (3.x)
    #[serde(default)]
    pub openapi: Option<String>,

    /// Swagger version marker (2.0)
    #[serde(default)]
    pub swagger: Option<String>,

    pub info: Info,

    /// 3.x servers
    #[serde(default)]
    pub servers: Vec<Server>,

    /// 2.0 host
    #[serde(default)]
    pub host: Option<String>,

    /// 2.0 base path
    #[serde(rename = "basePath")]
    #[serde(default)]
    pub base_path: Option<String>,

    /// 2.0 schemes
    #[serde(default)]
    pub schemes: Vec<String>,

    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// 3.x reusable components
    #[serde(default)]
    pub components: Option<Components>,

    /// 2.0 schema definitions
    #[serde(default)]
    pub definitions: IndexMap<String, Schema>,

    /// 2.0 shared parameters
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,

    /// 2.0 shared responses
    #[serde(default)]
    pub responses: IndexMap<String, Response>,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// API information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    pub version: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Operations attached to one path template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub options: Option<Operation>,

    #[serde(default)]
    pub head: Option<Operation>,

    /// Parameters shared by every operation on the path
    #[serde(default)]
    pub parameters: Vec<ReferenceOr<Parameter>>,
}

/// HTTP operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ReferenceOr<Parameter>>,

    /// 3.x request body
    #[serde(rename = "requestBody")]
    #[serde(default)]
    pub request_body: Option<ReferenceOr<RequestBody>>,

    #[serde(default)]
    pub responses: IndexMap<String, ReferenceOr<Response>>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub deprecated: bool,
}

/// Parameter definition
///
/// In 2.0, non-body parameters describe their type inline (`type`, `format`,
/// `items`, `enum`) instead of through `schema`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    /// Location: query, header, path, cookie, body (2.0), formData (2.0)
    #[serde(rename = "in")]
    pub location: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub schema: Option<Schema>,

    #[serde(rename = "type")]
    #[serde(default)]
    pub schema_type: Option<SchemaType>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl Parameter {
    /// Schema describing the parameter value, lifting 2.0 inline keywords
    pub fn effective_schema(&self) -> Schema {
        if let Some(ref schema) = self.schema {
            return schema.clone();
        }

        Schema {
            schema_type: self.schema_type.clone(),
            format: self.format.clone(),
            description: self.description.clone(),
            items: self.items.clone(),
            enum_values: self.enum_values.clone(),
            default: self.default.clone(),
            ..Schema::default()
        }
    }
}

/// 3.x request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

/// Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: Option<String>,

    /// 3.x content types
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    /// 2.0 schema
    #[serde(default)]
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Pick the schema of the preferred media type: JSON first, then any
/// `+json` suffix, then whatever comes first
pub fn preferred_schema(content: &IndexMap<String, MediaType>) -> Option<&Schema> {
    let with_schema = || content.iter().filter_map(|(ct, m)| Some((ct, m.schema.as_ref()?)));

    with_schema()
        .find(|(ct, _)| ct.starts_with("application/json"))
        .or_else(|| with_schema().find(|(ct, _)| ct.contains("+json")))
        .or_else(|| with_schema().next())
        .map(|(_, schema)| schema)
}

/// Either a `$ref` or an inline object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceOr<T> {
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Item(T),
}

/// `type` is a string in 2.0/3.0 and may be a list in 3.1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    /// First non-null type name
    pub fn primary(&self) -> Option<&str> {
        match self {
            SchemaType::Single(t) => Some(t.as_str()),
            SchemaType::Multiple(types) => types
                .iter()
                .map(String::as_str)
                .find(|t| *t != "null"),
        }
    }

    pub fn includes_null(&self) -> bool {
        match self {
            SchemaType::Single(t) => t == "null",
            SchemaType::Multiple(types) => types.iter().any(|t| t == "null"),
        }
    }
}

/// `additionalProperties` is either a boolean or a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// Schema definition
///
/// Deserialisation never fails: boolean schemas and fragments that do not fit
/// this model become an empty schema, so one odd fragment only degrades itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Schema {
    #[serde(rename = "$ref")]
    #[serde(default)]
    pub ref_path: Option<String>,

    #[serde(rename = "type")]
    #[serde(default)]
    pub schema_type: Option<SchemaType>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub properties: IndexMap<String, Schema>,

    /// Required property names; a stray boolean here is ignored
    #[serde(default, deserialize_with = "lenient_required")]
    pub required: Vec<String>,

    #[serde(default)]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "additionalProperties")]
    #[serde(default)]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(rename = "allOf")]
    #[serde(default)]
    pub all_of: Vec<Schema>,

    #[serde(rename = "oneOf")]
    #[serde(default)]
    pub one_of: Vec<Schema>,

    #[serde(rename = "anyOf")]
    #[serde(default)]
    pub any_of: Vec<Schema>,

    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(rename = "readOnly")]
    #[serde(default)]
    pub read_only: bool,

    #[serde(rename = "writeOnly")]
    #[serde(default)]
    pub write_only: bool,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub default: Option<serde_json::Value>,

    #[serde(default)]
    pub example: Option<serde_json::Value>,

    #[serde(default)]
    pub minimum: Option<f64>,

    #[serde(default)]
    pub maximum: Option<f64>,

    #[serde(rename = "minLength")]
    #[serde(default)]
    pub min_length: Option<u64>,

    #[serde(rename = "maxLength")]
    #[serde(default)]
    pub max_length: Option<u64>,

    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(rename = "minItems")]
    #[serde(default)]
    pub min_items: Option<u64>,

    #[serde(rename = "maxItems")]
    #[serde(default)]
    pub max_items: Option<u64>,
}

fn lenient_required<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Required {
        Names(Vec<String>),
        Other(IgnoredAny),
    }

    Ok(match Required::deserialize(deserializer)? {
        Required::Names(names) => names,
        Required::Other(_) => Vec::new(),
    })
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Schema::from_fragment(Value::deserialize(deserializer)?))
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Schema::serialize(self, serializer)
    }
}

/// Structural shape of a schema, in resolution precedence order
#[derive(Debug, Clone, Copy)]
pub enum SchemaKind<'a> {
    /// `$ref` to another schema
    Reference(&'a str),
    /// `allOf` composition
    AllOf(&'a [Schema]),
    /// `oneOf`/`anyOf`, only the first branch is used
    Choice(&'a [Schema]),
    /// Object with (possibly empty) `properties`
    Object(&'a IndexMap<String, Schema>),
    /// Array with optional `items`
    Array(Option<&'a Schema>),
    /// Anything else: strings, numbers, booleans, untyped
    Scalar,
}

impl Schema {
    fn from_fragment(value: Value) -> Self {
        match value {
            Value::Object(_) => Schema::deserialize(value).unwrap_or_else(|e| {
                warn!(error = %e, "unrecognised schema fragment, treating it as untyped");
                Schema::default()
            }),
            // `true`/`false` schemas (3.1) constrain nothing we model
            Value::Bool(_) => Schema::default(),
            other => {
                warn!(fragment = %other, "schema is not an object, treating it as untyped");
                Schema::default()
            }
        }
    }

    /// Classify this schema; `$ref` wins over composition keywords, which win
    /// over `type`
    pub fn kind(&self) -> SchemaKind<'_> {
        if let Some(ref ref_path) = self.ref_path {
            return SchemaKind::Reference(ref_path);
        }
        if !self.all_of.is_empty() {
            return SchemaKind::AllOf(&self.all_of);
        }
        if !self.one_of.is_empty() {
            return SchemaKind::Choice(&self.one_of);
        }
        if !self.any_of.is_empty() {
            return SchemaKind::Choice(&self.any_of);
        }

        match self.primary_type() {
            Some("array") => SchemaKind::Array(self.items.as_deref()),
            Some("object") => SchemaKind::Object(&self.properties),
            None if !self.properties.is_empty() => SchemaKind::Object(&self.properties),
            None if self.items.is_some() => SchemaKind::Array(self.items.as_deref()),
            _ => SchemaKind::Scalar,
        }
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::primary)
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
            || self
                .schema_type
                .as_ref()
                .is_some_and(SchemaType::includes_null)
    }
}

/// 3.x reusable components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,

    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,

    #[serde(rename = "requestBodies")]
    #[serde(default)]
    pub request_bodies: IndexMap<String, RequestBody>,

    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}
