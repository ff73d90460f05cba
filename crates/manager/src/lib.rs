//! Queries over a finished resource tree
//!
//! The tree is immutable once built, so a [`ResourceManager`] only borrows
//! it and any number of managers can read one analysis concurrently.
//!
//! ## Name lookup priority
//!
//! A name such as `reviews` can exist both as a root resource and nested
//! under another (`books.reviews`). With `prefer_top_level` (the default) a
//! match on the level being searched always wins over a deeper one, even
//! when a depth-first walk would reach the deeper node first.
//!
//! # Examples
//!
//! ```
//! use restmap_common::ParserConfig;
//! use restmap_manager::{FindOptions, ResourceManager};
//!
//! let analysis = restmap_parser::analyze_json(
//!     r#"{
//!         "openapi": "3.0.0",
//!         "info": {"title": "Shop", "version": "1"},
//!         "paths": {
//!             "/books/{id}/reviews": {"get": {"responses": {}}},
//!             "/books": {"get": {"responses": {}}},
//!             "/reviews": {"get": {"responses": {}}}
//!         }
//!     }"#,
//!     &ParserConfig::default(),
//! )
//! .unwrap();
//!
//! let manager = ResourceManager::from_analysis(&analysis);
//! let reviews = manager.find_by_name("reviews", FindOptions::default()).unwrap();
//! assert_eq!(reviews.key, "reviews");
//! ```

use restmap_common::{split_key, Analysis, ResourceNode};
use serde::{Deserialize, Serialize};

/// Options for [`ResourceManager::find_by_name`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    /// Search the current level completely before descending
    pub prefer_top_level: bool,
    /// Descend into sub-resources at all
    pub include_sub_resources: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            prefer_top_level: true,
            include_sub_resources: true,
        }
    }
}

/// A resource together with where it sits in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceHierarchy<'a> {
    pub resource: &'a ResourceNode,
    /// Resource names from the root down to the match
    pub path: Vec<String>,
    /// 0 for root resources
    pub depth: usize,
}

/// Aggregate counters over the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    /// All nodes, nested ones included
    pub total: usize,
    pub restful: usize,
    /// Nodes with at least one sub-resource
    pub with_sub_resources: usize,
    pub top_level: usize,
}

/// Read-only query surface over a resource tree
///
/// Lookups return `None` on a miss; nothing here fails.
#[derive(Debug, Clone, Copy)]
pub struct ResourceManager<'a> {
    resources: &'a [ResourceNode],
}

impl<'a> ResourceManager<'a> {
    pub fn new(resources: &'a [ResourceNode]) -> Self {
        Self { resources }
    }

    pub fn from_analysis(analysis: &'a Analysis) -> Self {
        Self::new(&analysis.resources)
    }

    /// Find a resource by name
    ///
    /// With `prefer_top_level` each level is scanned before any of its
    /// children; without it the search is a plain depth-first walk.
    pub fn find_by_name(&self, name: &str, options: FindOptions) -> Option<&'a ResourceNode> {
        find_by_name_in(self.resources, name, options)
    }

    /// Find a resource by its dot-joined key
    pub fn find_by_id(&self, key: &str) -> Option<&'a ResourceNode> {
        self.flatten().into_iter().find(|node| node.key == key)
    }

    /// Resolve `a.b.c` one name per level: `a` among the roots, `b` among
    /// the children of `a`, and so on
    pub fn find_by_path(&self, path: &str) -> Option<&'a ResourceNode> {
        let mut level = self.resources;
        let mut found = None;

        for segment in split_key(path) {
            let node = level.iter().find(|node| node.name == segment)?;
            level = &node.sub_resources;
            found = Some(node);
        }

        found
    }

    /// Find a resource by name (top-level first) and report its position
    pub fn resource_hierarchy(&self, name: &str) -> Option<ResourceHierarchy<'a>> {
        let mut path = Vec::new();
        let resource = locate(self.resources, name, &mut path)?;

        Some(ResourceHierarchy {
            resource,
            depth: path.len() - 1,
            path,
        })
    }

    pub fn top_level_resources(&self) -> &'a [ResourceNode] {
        self.resources
    }

    /// Every descendant of `node`, pre-order
    pub fn all_sub_resources(&self, node: &'a ResourceNode) -> Vec<&'a ResourceNode> {
        let mut out = Vec::new();
        collect(&node.sub_resources, &mut out);
        out
    }

    /// Every node in the tree, pre-order
    pub fn flatten(&self) -> Vec<&'a ResourceNode> {
        let mut out = Vec::new();
        collect(self.resources, &mut out);
        out
    }

    /// Case-insensitive check of the node's method set
    pub fn supports_operation(&self, node: &ResourceNode, method: &str) -> bool {
        node.supports(method)
    }

    pub fn stats(&self) -> ResourceStats {
        let all = self.flatten();
        ResourceStats {
            total: all.len(),
            restful: all.iter().filter(|node| node.is_restful).count(),
            with_sub_resources: all.iter().filter(|node| node.has_sub_resources()).count(),
            top_level: self.resources.len(),
        }
    }
}

fn find_by_name_in<'a>(
    nodes: &'a [ResourceNode],
    name: &str,
    options: FindOptions,
) -> Option<&'a ResourceNode> {
    if options.prefer_top_level {
        if let Some(node) = nodes.iter().find(|node| node.name == name) {
            return Some(node);
        }
        if !options.include_sub_resources {
            return None;
        }
        return nodes
            .iter()
            .find_map(|node| find_by_name_in(&node.sub_resources, name, options));
    }

    nodes.iter().find_map(|node| {
        if node.name == name {
            Some(node)
        } else if options.include_sub_resources {
            find_by_name_in(&node.sub_resources, name, options)
        } else {
            None
        }
    })
}

/// Top-level-first search that records the names walked through
fn locate<'a>(
    nodes: &'a [ResourceNode],
    name: &str,
    path: &mut Vec<String>,
) -> Option<&'a ResourceNode> {
    if let Some(node) = nodes.iter().find(|node| node.name == name) {
        path.push(node.name.clone());
        return Some(node);
    }

    for node in nodes {
        path.push(node.name.clone());
        if let Some(found) = locate(&node.sub_resources, name, path) {
            return Some(found);
        }
        path.pop();
    }

    None
}

fn collect<'a>(nodes: &'a [ResourceNode], out: &mut Vec<&'a ResourceNode>) {
    for node in nodes {
        out.push(node);
        collect(&node.sub_resources, out);
    }
}
