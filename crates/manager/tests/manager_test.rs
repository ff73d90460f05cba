//! Queries over a tree produced by the parser

use restmap_common::{Analysis, ParserConfig};
use restmap_manager::{FindOptions, ResourceManager};

const LIBRARY: &str = include_str!("../../parser/tests/fixtures/library.json");

fn library() -> Analysis {
    restmap_parser::analyze_json(LIBRARY, &ParserConfig::default()).unwrap()
}

#[test]
fn test_root_books_beats_nested_books() {
    let analysis = library();
    let manager = ResourceManager::from_analysis(&analysis);

    let books = manager.find_by_name("books", FindOptions::default()).unwrap();
    assert_eq!(books.key, "books");
    assert_eq!(books.path, "/books");

    let nested = manager.find_by_id("authors.books").unwrap();
    assert_eq!(nested.name, "books");
    assert_ne!(nested.key, books.key);
}

#[test]
fn test_path_lookup() {
    let analysis = library();
    let manager = ResourceManager::from_analysis(&analysis);

    let notes = manager.find_by_path("books.notes").unwrap();
    assert_eq!(notes.key, "books.notes");
    assert_eq!(notes.path, "/books/{id}/notes");
    assert!(manager.supports_operation(notes, "post"));

    assert!(manager.find_by_path("books.nonexistent").is_none());
    assert!(manager.find_by_path("notes.books").is_none());

    let hierarchy = manager.resource_hierarchy("notes").unwrap();
    assert_eq!(hierarchy.resource.key, "notes");
    assert_eq!(hierarchy.depth, 0);
}

#[test]
fn test_stats_match_analysis() {
    let analysis = library();
    let manager = ResourceManager::from_analysis(&analysis);
    let stats = manager.stats();

    assert_eq!(stats.total, analysis.stats.total_resources);
    assert_eq!(stats.restful, analysis.stats.restful_resources);
    assert_eq!(stats.top_level, 4);
    assert_eq!(stats.with_sub_resources, 2);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["total"], 6);
    assert_eq!(json["with_sub_resources"], 2);
}
