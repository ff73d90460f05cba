//! Schema fragment → flat field list
//!
//! Resolution order for a fragment:
//! 1. `$ref` is followed into the document's definitions table
//! 2. `allOf` branches are merged, later branches overwriting earlier ones
//! 3. `oneOf`/`anyOf` use their first non-null branch only
//! 4. objects emit one field per property
//! 5. arrays recurse into `items`
//!
//! Response schemas additionally go through [`SchemaResolver::resource_fields`],
//! which unwraps paginated envelopes to their item schema.
//!
//! Expanded references are memoized per nesting depth, and references nested
//! deeper than the configured limit resolve to an opaque object. Documents
//! whose schemas share many references stay linear in the number of schemas.

use crate::openapi::{Document, Schema, SchemaKind};
use crate::type_mapper::TypeMapper;
use restmap_common::{FieldDefinition, FieldType, DEFAULT_MAX_REF_DEPTH};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Property names that mark an object as a pagination wrapper
const PAGINATION_KEYS: &[&str] = &[
    "total", "page", "pageSize", "hasMore", "page_size", "has_more",
];

/// Name given to the element definition of array fields
const ITEMS_FIELD: &str = "items";

/// Reference path and the number of references being expanded around it
type MemoKey = (String, usize);

#[derive(Default)]
struct Memo {
    field: HashMap<MemoKey, FieldDefinition>,
    fields: HashMap<MemoKey, Vec<FieldDefinition>>,
}

fn field_memo(memo: &mut Memo) -> &mut HashMap<MemoKey, FieldDefinition> {
    &mut memo.field
}

fn fields_memo(memo: &mut Memo) -> &mut HashMap<MemoKey, Vec<FieldDefinition>> {
    &mut memo.fields
}

/// Resolves schema fragments against one document
///
/// Tracks the `$ref`s currently being expanded, so self-referencing schemas
/// terminate: a revisited reference resolves to an opaque object.
pub struct SchemaResolver<'a> {
    doc: &'a Document,
    max_ref_depth: usize,
    in_progress: Vec<String>,
    /// Lowest stack position a cycle was cut at inside the current expansion
    cycle_floor: Option<usize>,
    memo: Memo,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            max_ref_depth: DEFAULT_MAX_REF_DEPTH,
            in_progress: Vec::new(),
            cycle_floor: None,
            memo: Memo::default(),
        }
    }

    /// Limit how many references may be expanded inside one another
    pub fn with_max_ref_depth(mut self, depth: usize) -> Self {
        self.max_ref_depth = depth;
        self
    }

    /// Fields of a schema fragment
    ///
    /// Objects yield their properties, arrays the fields of their items, and
    /// scalars nothing. Unresolvable references yield nothing.
    pub fn fields(&mut self, schema: &Schema) -> Vec<FieldDefinition> {
        self.fields_inheriting(schema, &[])
    }

    /// Fields of a response schema, unwrapping arrays and paginated envelopes
    /// to the schema of one item
    pub fn resource_fields(&mut self, schema: &Schema) -> Vec<FieldDefinition> {
        unwrap_envelope(self.fields(schema))
    }

    /// Build one field definition named `name` from a schema fragment
    pub fn field(&mut self, name: &str, schema: &Schema, required: bool) -> FieldDefinition {
        match schema.kind() {
            SchemaKind::Reference(ref_path) => {
                let mut field = self
                    .with_reference(ref_path, field_memo, |this, target| {
                        this.field(name, target, false)
                    })
                    .unwrap_or_else(|| FieldDefinition::new(name, FieldType::Object));
                // Memoized fields carry the name they were first built under
                field.name = name.to_string();
                field.required = required;
                apply_overrides(&mut field, schema);
                field
            }
            SchemaKind::AllOf(branches) if branches.len() == 1 && schema.properties.is_empty() => {
                // `allOf: [{$ref}]` is the usual way to attach a description to a ref
                let mut field = self.field(name, &branches[0], required);
                apply_overrides(&mut field, schema);
                field
            }
            SchemaKind::AllOf(_) => {
                let mut field = base_field(name, schema, required);
                field.field_type = FieldType::Object;
                field.properties = self.fields(schema);
                field
            }
            SchemaKind::Choice(branches) => match first_branch(branches) {
                Some(branch) => {
                    let mut field = self.field(name, branch, required);
                    apply_overrides(&mut field, schema);
                    field.nullable |= branches.iter().any(Schema::is_nullable);
                    field
                }
                None => base_field(name, schema, required),
            },
            SchemaKind::Object(_) => {
                let mut field = base_field(name, schema, required);
                field.properties = self.fields(schema);
                field
            }
            SchemaKind::Array(items) => {
                let mut field = base_field(name, schema, required);
                field.items = items.map(|item| Box::new(self.field(ITEMS_FIELD, item, false)));
                field
            }
            SchemaKind::Scalar => base_field(name, schema, required),
        }
    }

    fn fields_inheriting(
        &mut self,
        schema: &Schema,
        inherited_required: &[String],
    ) -> Vec<FieldDefinition> {
        match schema.kind() {
            SchemaKind::Reference(ref_path) => {
                let mut fields = self
                    .with_reference(ref_path, fields_memo, |this, target| {
                        this.fields_inheriting(target, &[])
                    })
                    .unwrap_or_default();
                for field in &mut fields {
                    field.required |= inherited_required.contains(&field.name);
                }
                fields
            }
            SchemaKind::AllOf(branches) => {
                let mut required: Vec<String> = inherited_required.to_vec();
                required.extend(schema.required.iter().cloned());
                for branch in branches {
                    required.extend(branch.required.iter().cloned());
                }

                let mut merged: Vec<FieldDefinition> = Vec::new();
                for branch in branches {
                    merge_last_wins(&mut merged, self.fields_inheriting(branch, &required));
                }
                // Properties declared next to `allOf` act as a final branch
                if !schema.properties.is_empty() {
                    let own: Vec<FieldDefinition> = schema
                        .properties
                        .iter()
                        .map(|(name, prop)| self.field(name, prop, required.contains(name)))
                        .collect();
                    merge_last_wins(&mut merged, own);
                }
                merged
            }
            SchemaKind::Choice(branches) => first_branch(branches)
                .map(|branch| self.fields_inheriting(branch, inherited_required))
                .unwrap_or_default(),
            SchemaKind::Object(properties) => properties
                .iter()
                .map(|(name, prop)| {
                    let required =
                        schema.required.contains(name) || inherited_required.contains(name);
                    self.field(name, prop, required)
                })
                .collect(),
            SchemaKind::Array(items) => items
                .map(|item| self.fields_inheriting(item, inherited_required))
                .unwrap_or_default(),
            SchemaKind::Scalar => Vec::new(),
        }
    }

    /// Run `f` on the target of `ref_path` with the reference marked as in
    /// progress; `None` when the reference is unresolvable, already being
    /// expanded, or nested past the depth limit
    ///
    /// Results are memoized in `slot` unless a cycle was cut against a
    /// reference further up the stack, since those depend on the stack.
    fn with_reference<T: Clone>(
        &mut self,
        ref_path: &str,
        slot: fn(&mut Memo) -> &mut HashMap<MemoKey, T>,
        f: impl FnOnce(&mut Self, &'a Schema) -> T,
    ) -> Option<T> {
        if let Some(position) = self.in_progress.iter().position(|r| r == ref_path) {
            debug!(reference = ref_path, "cyclic schema reference, emitting opaque object");
            self.cycle_floor = Some(self.cycle_floor.map_or(position, |floor| floor.min(position)));
            return None;
        }

        let depth = self.in_progress.len();
        if depth >= self.max_ref_depth {
            debug!(reference = ref_path, depth, "schema nesting limit reached, emitting opaque object");
            return None;
        }

        let key = (ref_path.to_string(), depth);
        if let Some(hit) = slot(&mut self.memo).get(&key) {
            return Some(hit.clone());
        }

        let Some(target) = self.doc.resolve_schema_ref(ref_path) else {
            if ref_path.starts_with('#') {
                warn!(reference = ref_path, "unresolved schema reference");
            } else {
                warn!(reference = ref_path, "external schema reference not supported");
            }
            return None;
        };

        let outer_floor = self.cycle_floor.take();
        self.in_progress.push(ref_path.to_string());
        let result = f(self, target);
        self.in_progress.pop();

        let escaping = self.cycle_floor.take().filter(|floor| *floor < depth);
        if escaping.is_none() {
            slot(&mut self.memo).insert(key, result.clone());
        }
        self.cycle_floor = match (outer_floor, escaping) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Some(result)
    }
}

/// Field with everything the schema itself states, no recursion
fn base_field(name: &str, schema: &Schema, required: bool) -> FieldDefinition {
    FieldDefinition {
        name: name.to_string(),
        field_type: TypeMapper::map_type(schema),
        format: schema.format.clone(),
        description: schema.description.clone().or_else(|| schema.title.clone()),
        required,
        nullable: schema.is_nullable(),
        read_only: schema.read_only,
        write_only: schema.write_only,
        deprecated: schema.deprecated,
        enum_values: (!schema.enum_values.is_empty()).then(|| schema.enum_values.clone()),
        default: schema.default.clone(),
        example: schema.example.clone(),
        items: None,
        properties: Vec::new(),
        constraints: TypeMapper::constraints(schema),
    }
}

/// Keywords on a wrapper schema (`$ref` sibling, single `allOf`, `oneOf`)
/// that override what the wrapped schema says
fn apply_overrides(field: &mut FieldDefinition, wrapper: &Schema) {
    if let Some(ref description) = wrapper.description {
        field.description = Some(description.clone());
    }
    field.nullable |= wrapper.is_nullable();
    field.read_only |= wrapper.read_only;
    field.write_only |= wrapper.write_only;
    field.deprecated |= wrapper.deprecated;
    if wrapper.default.is_some() {
        field.default = wrapper.default.clone();
    }
}

/// First branch that is not a bare `type: null`
fn first_branch(branches: &[Schema]) -> Option<&Schema> {
    branches
        .iter()
        .find(|b| b.primary_type() != Some("null"))
        .or_else(|| branches.first())
}

fn merge_last_wins(merged: &mut Vec<FieldDefinition>, incoming: Vec<FieldDefinition>) {
    for field in incoming {
        match merged.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => merged.push(field),
        }
    }
}

/// Replace a paginated envelope with the fields of its items
///
/// An envelope is an object carrying an array member next to any of the
/// pagination keys. Arrays of scalars are left wrapped.
fn unwrap_envelope(mut fields: Vec<FieldDefinition>) -> Vec<FieldDefinition> {
    let is_envelope = fields
        .iter()
        .any(|f| PAGINATION_KEYS.contains(&f.name.as_str()));
    if !is_envelope {
        return fields;
    }

    let Some(position) = fields.iter().position(|f| {
        f.field_type == FieldType::Array
            && f.items.as_ref().is_some_and(|item| !item.properties.is_empty())
    }) else {
        return fields;
    };

    match fields.swap_remove(position).items {
        Some(item) => item.properties,
        None => fields,
    }
}
