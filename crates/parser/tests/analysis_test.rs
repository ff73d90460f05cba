//! Integration tests for document analysis

use restmap_common::{
    Classification, Dialect, FieldDefinition, FieldType, HttpMethod, ParameterLocation,
    ParserConfig, ResourceNode,
};
use restmap_parser::openapi::parse_content;
use restmap_parser::{analyze, Document};
use serde_json::{json, Value};
use std::path::PathBuf;

fn fixture(name: &str) -> Document {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let content = std::fs::read_to_string(&path).unwrap();
    Document::from_value(parse_content(&content).unwrap()).unwrap()
}

fn find<'a>(nodes: &'a [ResourceNode], key: &str) -> Option<&'a ResourceNode> {
    nodes.iter().find_map(|node| {
        if node.key == key {
            Some(node)
        } else {
            find(&node.sub_resources, key)
        }
    })
}

fn field_names(node: &ResourceNode) -> Vec<&str> {
    node.schema.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn test_library_tree() {
    let doc = fixture("library.json");
    let analysis = analyze(&doc, "library", &ParserConfig::default());

    let roots: Vec<&str> = analysis.resources.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(roots, vec!["authors", "books", "health", "notes"]);

    let authors = &analysis.resources[0];
    assert_eq!(authors.sub_resources.len(), 1);
    assert_eq!(authors.sub_resources[0].key, "authors.books");
    assert_eq!(authors.sub_resources[0].name, "books");
    assert_eq!(authors.sub_resources[0].parent_key.as_deref(), Some("authors"));
    assert_eq!(authors.sub_resources[0].depth, 1);

    let books = &analysis.resources[1];
    assert_eq!(books.sub_resources.len(), 1);
    assert_eq!(books.sub_resources[0].key, "books.notes");
    assert!(books.parent_key.is_none());

    // the nested books node is a different resource from the root one
    assert_ne!(authors.sub_resources[0].path, books.path);
    assert_eq!(authors.sub_resources[0].path, "/authors/{id}/books");
    assert_eq!(books.path, "/books");

    let notes = &analysis.resources[3];
    assert!(notes.sub_resources.is_empty());
}

#[test]
fn test_library_nodes() {
    let doc = fixture("library.json");
    let analysis = analyze(&doc, "library", &ParserConfig::default());

    let authors = find(&analysis.resources, "authors").unwrap();
    assert_eq!(authors.paths, vec!["/authors", "/authors/{id}"]);
    assert_eq!(authors.classification, Classification::FullCrud);
    assert!(authors.is_restful);
    assert_eq!(authors.id_param.as_deref(), Some("id"));
    assert_eq!(authors.id_field.as_deref(), Some("id"));
    assert_eq!(authors.description.as_deref(), Some("List authors"));
    // paginated envelope unwrapped to the author schema
    assert_eq!(field_names(authors), vec!["id", "name", "email", "books"]);
    assert!(authors.schema[0].read_only);
    assert!(authors.schema[0].required);
    assert_eq!(authors.schema[1].constraints.min_length, Some(1));
    assert_eq!(authors.schema[2].field_type, FieldType::Email);

    let list = &authors.operations[&HttpMethod::Get][0];
    assert_eq!(list.path, "/authors");
    assert_eq!(list.parameters[0].name, "page");
    assert_eq!(list.parameters[0].location, ParameterLocation::Query);
    let show = &authors.operations[&HttpMethod::Get][1];
    assert_eq!(show.parameters[0].name, "id");
    assert!(show.parameters[0].required);
    assert_eq!(show.responses["404"][0].name, "message");

    // Author -> Book -> Author is cut at the revisit
    let books_field = &authors.schema[3];
    assert_eq!(books_field.field_type, FieldType::Array);
    let book = books_field.items.as_ref().unwrap();
    let author = book.properties.iter().find(|f| f.name == "author").unwrap();
    assert_eq!(author.field_type, FieldType::Object);
    assert!(author.properties.is_empty());

    let books = find(&analysis.resources, "books").unwrap();
    assert_eq!(field_names(books), vec!["id", "title", "published", "author"]);
    assert_eq!(books.schema[2].field_type, FieldType::Date);
    assert_eq!(books.classification, Classification::FullCrud);

    let by_author = find(&analysis.resources, "authors.books").unwrap();
    assert_eq!(by_author.classification, Classification::ReadOnly);
    assert!(by_author.id_param.is_none());
    assert_eq!(by_author.display_name, "Books");

    let book_notes = find(&analysis.resources, "books.notes").unwrap();
    assert_eq!(
        field_names(book_notes),
        vec!["created_at", "updated_at", "id", "body", "book_id"]
    );
    assert_eq!(book_notes.schema[0].field_type, FieldType::DateTime);
    assert!(book_notes.schema[3].required);
    assert_eq!(book_notes.id_field.as_deref(), Some("id"));
    assert_eq!(book_notes.classification, Classification::Custom);
    assert!(book_notes.is_restful);

    let health = find(&analysis.resources, "health").unwrap();
    assert_eq!(health.classification, Classification::ReadOnly);
    assert!(health.schema.is_empty());
}

#[test]
fn test_library_metadata_and_stats() {
    let doc = fixture("library.json");
    let analysis = analyze(&doc, "library", &ParserConfig::default());

    assert_eq!(analysis.info.title, "Library API");
    assert_eq!(analysis.info.version, "1.4.0");
    assert_eq!(analysis.info.dialect, Dialect::OpenApi3);
    assert_eq!(analysis.info.base_url, "https://library.example.com/api");
    assert_eq!(analysis.info.servers.len(), 2);
    assert_eq!(analysis.info.tags, vec!["authors", "books", "notes"]);

    assert_eq!(analysis.stats.total_paths, 9);
    assert_eq!(analysis.stats.total_operations, 16);
    assert_eq!(analysis.stats.total_resources, 6);
    assert_eq!(analysis.stats.restful_resources, 6);
    assert_eq!(analysis.stats.tags, vec!["authors", "books", "notes", "ops"]);
}

#[test]
fn test_swagger_petstore() {
    let doc = fixture("petstore.yaml");
    assert_eq!(doc.dialect(), Dialect::Swagger2);

    let analysis = analyze(&doc, "petstore", &ParserConfig::default());
    assert_eq!(analysis.info.version, "2.0");
    assert_eq!(
        analysis.info.servers,
        vec![
            "https://petstore.example.com/v1",
            "http://petstore.example.com/v1"
        ]
    );

    let roots: Vec<&str> = analysis.resources.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(roots, vec!["pets", "user", "stores.orders"]);

    let pets = find(&analysis.resources, "pets").unwrap();
    assert_eq!(pets.classification, Classification::FullCrud);
    assert_eq!(pets.id_param.as_deref(), Some("petId"));
    assert_eq!(field_names(pets), vec!["id", "name", "tag", "status", "category"]);
    let status = &pets.schema[3];
    assert_eq!(status.enum_values.as_ref().map(Vec::len), Some(3));
    assert_eq!(pets.schema[4].properties.len(), 2);

    let create = &pets.operations[&HttpMethod::Post][0];
    let body = create.request_body.as_ref().unwrap();
    assert_eq!(body.len(), 5);
    assert!(body.iter().find(|f| f.name == "name").unwrap().required);
    assert!(create.parameters.is_empty());

    let show = &pets.operations[&HttpMethod::Get][1];
    assert_eq!(show.operation_id.as_deref(), Some("showPetById"));
    assert_eq!(show.parameters[0].name, "petId");
    assert!(show.parameters[0].required);
    assert_eq!(show.parameters[0].schema.field_type, FieldType::Integer);
    let error: Vec<&str> = show.responses["default"].iter().map(|f| f.name.as_str()).collect();
    assert_eq!(error, vec!["code", "message"]);

    let photos = find(&analysis.resources, "pets.photos").unwrap();
    assert_eq!(photos.classification, Classification::Custom);
    assert!(photos.is_restful);
    assert_eq!(field_names(photos), vec!["file", "caption"]);
    assert!(photos.schema[0].required);

    let user = find(&analysis.resources, "user").unwrap();
    assert_eq!(user.paths, vec!["/user/login", "/user/logout"]);
    assert_eq!(user.path, "/user/login");
    assert_eq!(user.classification, Classification::ReadOnly);
}

#[test]
fn test_orphaned_chain_is_promoted() {
    let doc = fixture("petstore.yaml");
    let analysis = analyze(&doc, "petstore", &ParserConfig::default());

    let orders = analysis
        .resources
        .iter()
        .find(|n| n.key == "stores.orders")
        .unwrap();
    assert_eq!(orders.name, "orders");
    assert_eq!(orders.display_name, "Orders");
    assert_eq!(orders.parent_key.as_deref(), Some("stores"));
    assert_eq!(orders.depth, 1);
    assert_eq!(orders.id_field.as_deref(), Some("id"));
    assert_eq!(orders.schema[2].field_type, FieldType::DateTime);

    assert_eq!(analysis.stats.total_resources, 4);
    assert_eq!(analysis.stats.tags, vec!["pets", "store"]);
}

#[test]
fn test_configured_segments() {
    let json = r#"{
        "openapi": "3.1.0",
        "info": {"title": "Cluster", "version": "1"},
        "paths": {
            "/api/v1/namespaces/{namespace}/pods": {"get": {"responses": {}}},
            "/api/v1/namespaces/{namespace}/pods/{name}/export": {"get": {"responses": {}}},
            "/api/v1/namespaces": {"get": {"responses": {}}}
        }
    }"#;
    let config = ParserConfig::from_yaml(
        "ignored_segments: [api]\nstrip_version_segments: true\nextra_action_segments: [export]\n",
    )
    .unwrap();

    let analysis = restmap_parser::analyze_json(json, &config).unwrap();
    let roots: Vec<&str> = analysis.resources.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(roots, vec!["namespaces"]);

    let pods = &analysis.resources[0].sub_resources[0];
    assert_eq!(pods.key, "namespaces.pods");
    assert_eq!(pods.paths.len(), 2);
    assert_eq!(pods.id_param.as_deref(), Some("name"));
    assert_eq!(analysis.cache_key, "Cluster");
}

#[test]
fn test_structural_validation() {
    let cases = [
        r#"{"info": {"title": "T", "version": "1"}, "paths": {}}"#,
        r#"{"openapi": "3.0.0", "info": {"version": "1"}, "paths": {}}"#,
        r#"{"openapi": "3.0.0", "info": {"title": "T"}, "paths": {}}"#,
        r#"{"openapi": "3.0.0", "info": {"title": "T", "version": "1"}}"#,
        r#"{"openapi": "3.0.0", "info": {"title": "T", "version": "1"}, "paths": []}"#,
    ];

    for case in cases {
        let result = Document::from_json(case);
        assert!(
            matches!(result, Err(restmap_common::RestMapError::Validation(_))),
            "expected validation failure for {}",
            case
        );
    }
}

fn nested_count(fields: &[FieldDefinition]) -> usize {
    fields
        .iter()
        .map(|f| 1 + nested_count(&f.properties))
        .sum()
}

#[test]
fn test_heavily_shared_schemas_analyse_quickly() {
    let mut schemas = serde_json::Map::new();
    for i in 0..30 {
        let next = json!({"$ref": format!("#/components/schemas/S{}", i + 1)});
        schemas.insert(
            format!("S{}", i),
            json!({"type": "object", "properties": {"left": next.clone(), "right": next}}),
        );
    }
    schemas.insert("S30".into(), json!({"type": "object", "properties": {"id": {"type": "integer"}}}));

    let doc = Document::from_value(json!({
        "openapi": "3.0.3",
        "info": {"title": "Things", "version": "1"},
        "paths": {
            "/things": {"get": {"responses": {"200": {
                "description": "ok",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/S0"}}}
            }}}}
        },
        "components": {"schemas": Value::Object(schemas)}
    }))
    .unwrap();

    let analysis = analyze(&doc, "things", &ParserConfig::default());
    let things = find(&analysis.resources, "things").unwrap();
    assert_eq!(field_names(things), vec!["left", "right"]);
    assert_eq!(nested_count(&things.schema), 126);

    let config = ParserConfig {
        max_ref_depth: 3,
        ..ParserConfig::default()
    };
    let analysis = analyze(&doc, "things", &config);
    let things = find(&analysis.resources, "things").unwrap();
    assert_eq!(nested_count(&things.schema), 14);
}

#[test]
fn test_unmodelled_schema_shapes_do_not_abort() {
    let doc = Document::from_value(json!({
        "openapi": "3.1.0",
        "info": {"title": "Shop", "version": "1"},
        "paths": {
            "/users": {"get": {"responses": {"200": {
                "description": "ok",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}
            }}}},
            "/orders": {"get": {"responses": {"200": {"description": "ok"}}}}
        },
        "components": {"schemas": {
            "User": {
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "extra": true,
                    "nick": {"type": "string", "maxLength": 8.5}
                }
            },
            "Unused": {"properties": {"meta": true}, "items": false}
        }}
    }))
    .unwrap();

    let analysis = analyze(&doc, "shop", &ParserConfig::default());
    let keys: Vec<&str> = analysis.resources.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, vec!["orders", "users"]);

    let users = find(&analysis.resources, "users").unwrap();
    assert_eq!(field_names(users), vec!["id", "extra", "nick"]);
    assert_eq!(users.schema[0].field_type, FieldType::Integer);
    assert_eq!(users.schema[1].field_type, FieldType::String);
}
