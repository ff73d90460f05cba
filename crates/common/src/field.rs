//! Field definitions derived from schema fragments

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a field
///
/// Coarser than JSON Schema: string formats that drive different widgets
/// (dates, emails, links) get their own variant, everything else is the
/// plain JSON type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Date,
    DateTime,
    Email,
    Url,
}

impl FieldType {
    /// Map a JSON Schema `type` and optional `format` to a FieldType
    ///
    /// # Examples
    /// ```
    /// use restmap_common::FieldType;
    ///
    /// assert_eq!(FieldType::from_schema(Some("string"), Some("date-time")), FieldType::DateTime);
    /// assert_eq!(FieldType::from_schema(Some("integer"), Some("int64")), FieldType::Integer);
    /// assert_eq!(FieldType::from_schema(None, None), FieldType::String);
    /// ```
    pub fn from_schema(schema_type: Option<&str>, format: Option<&str>) -> Self {
        match schema_type {
            Some("integer") => FieldType::Integer,
            Some("number") => FieldType::Number,
            Some("boolean") => FieldType::Boolean,
            Some("array") => FieldType::Array,
            Some("object") => FieldType::Object,
            _ => match format {
                Some("date") => FieldType::Date,
                Some("date-time") => FieldType::DateTime,
                Some("email") => FieldType::Email,
                Some("uri") | Some("url") => FieldType::Url,
                _ => FieldType::String,
            },
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Email => "email",
            FieldType::Url => "url",
        };
        f.write_str(name)
    }
}

/// Numeric, length and pattern constraints carried over from the schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

impl FieldConstraints {
    pub fn is_empty(&self) -> bool {
        self == &FieldConstraints::default()
    }
}

/// One field of a resource schema, request body or response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Property name as it appears on the wire
    pub name: String,

    /// Semantic type
    pub field_type: FieldType,

    /// Raw `format` keyword (e.g. "int64", "date-time")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub required: bool,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub write_only: bool,

    #[serde(default)]
    pub deprecated: bool,

    /// Allowed values when the schema is an enum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    /// Element definition for array fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDefinition>>,

    /// Nested property definitions for object fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<FieldDefinition>,

    #[serde(default, skip_serializing_if = "FieldConstraints::is_empty")]
    pub constraints: FieldConstraints,
}

impl FieldDefinition {
    /// A bare field with no metadata beyond name and type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: None,
            description: None,
            required: false,
            nullable: false,
            read_only: false,
            write_only: false,
            deprecated: false,
            enum_values: None,
            default: None,
            example: None,
            items: None,
            properties: Vec::new(),
            constraints: FieldConstraints::default(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}
