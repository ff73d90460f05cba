//! Type mapping from schema fragments to the semantic field model
//!
//! Maps JSON Schema `type`/`format` pairs to our `FieldType` and lifts the
//! validation keywords into `FieldConstraints`.

use crate::openapi::Schema;
use restmap_common::{FieldConstraints, FieldType};

/// Maps schema fragments to FieldType
pub struct TypeMapper;

impl TypeMapper {
    /// Map a schema to FieldType
    ///
    /// A missing `type` is inferred from `properties` (object) or `items`
    /// (array) before falling back to the format-based string mapping.
    pub fn map_type(schema: &Schema) -> FieldType {
        let schema_type = schema.primary_type().or_else(|| {
            if !schema.properties.is_empty() || !schema.all_of.is_empty() {
                Some("object")
            } else if schema.items.is_some() {
                Some("array")
            } else {
                None
            }
        });

        FieldType::from_schema(schema_type, schema.format.as_deref())
    }

    /// Collect numeric, length, pattern and item-count constraints
    pub fn constraints(schema: &Schema) -> FieldConstraints {
        FieldConstraints {
            minimum: schema.minimum,
            maximum: schema.maximum,
            min_length: schema.min_length,
            max_length: schema.max_length,
            pattern: schema.pattern.clone(),
            min_items: schema.min_items,
            max_items: schema.max_items,
        }
    }

    /// Check if a field name suggests it identifies the resource
    pub fn is_identifier(field_name: &str) -> bool {
        let lower = field_name.to_lowercase();
        lower == "id" || lower == "uuid" || lower.ends_with("_id") || field_name.ends_with("Id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_map_basic_types() {
        assert_eq!(
            TypeMapper::map_type(&schema(json!({"type": "integer"}))),
            FieldType::Integer
        );
        assert_eq!(
            TypeMapper::map_type(&schema(json!({"type": "number"}))),
            FieldType::Number
        );
        assert_eq!(
            TypeMapper::map_type(&schema(json!({"type": "boolean"}))),
            FieldType::Boolean
        );
        assert_eq!(
            TypeMapper::map_type(&schema(json!({"type": "string", "format": "date-time"}))),
            FieldType::DateTime
        );
    }

    #[test]
    fn test_infer_missing_type() {
        assert_eq!(
            TypeMapper::map_type(&schema(json!({"properties": {"a": {"type": "string"}}}))),
            FieldType::Object
        );
        assert_eq!(
            TypeMapper::map_type(&schema(json!({"items": {"type": "string"}}))),
            FieldType::Array
        );
        assert_eq!(TypeMapper::map_type(&schema(json!({}))), FieldType::String);
    }

    #[test]
    fn test_nullable_type_list() {
        assert_eq!(
            TypeMapper::map_type(&schema(json!({"type": ["null", "string"], "format": "email"}))),
            FieldType::Email
        );
    }

    #[test]
    fn test_constraints() {
        let c = TypeMapper::constraints(&schema(json!({
            "type": "string",
            "minLength": 3,
            "maxLength": 40,
            "pattern": "^[a-z]+$"
        })));
        assert_eq!(c.min_length, Some(3));
        assert_eq!(c.max_length, Some(40));
        assert_eq!(c.pattern.as_deref(), Some("^[a-z]+$"));
        assert!(c.minimum.is_none());

        assert!(TypeMapper::constraints(&schema(json!({"type": "string"}))).is_empty());
    }

    #[test]
    fn test_is_identifier() {
        assert!(TypeMapper::is_identifier("id"));
        assert!(TypeMapper::is_identifier("author_id"));
        assert!(TypeMapper::is_identifier("authorId"));
        assert!(!TypeMapper::is_identifier("title"));
    }
}
