//! Whole-document counters

use crate::openapi::Document;
use crate::operation_extractor::operation_for;
use restmap_common::{AnalysisStats, HttpMethod, ResourceNode};
use std::collections::BTreeSet;

/// Aggregates counters over a document and its resource tree
pub struct StatsCalculator;

impl StatsCalculator {
    pub fn calculate(doc: &Document, resources: &[ResourceNode]) -> AnalysisStats {
        let mut tags: BTreeSet<String> = doc
            .raw()
            .tags
            .iter()
            .map(|tag| tag.name.clone())
            .collect();
        let mut total_operations = 0;

        for item in doc.paths().values() {
            for op in HttpMethod::ALL
                .into_iter()
                .filter_map(|method| operation_for(item, method))
            {
                total_operations += 1;
                tags.extend(op.tags.iter().cloned());
            }
        }

        let (total_resources, restful_resources) = count_nodes(resources);

        AnalysisStats {
            total_paths: doc.paths().len(),
            total_operations,
            total_resources,
            restful_resources,
            tags: tags.into_iter().collect(),
        }
    }
}

/// (all nodes, RESTful nodes), nested nodes included
fn count_nodes(nodes: &[ResourceNode]) -> (usize, usize) {
    nodes.iter().fold((0, 0), |(total, restful), node| {
        let (sub_total, sub_restful) = count_nodes(&node.sub_resources);
        (
            total + 1 + sub_total,
            restful + usize::from(node.is_restful) + sub_restful,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::ResourceHierarchyBuilder;
    use restmap_common::ParserConfig;
    use serde_json::json;

    #[test]
    fn test_calculate() {
        let doc = Document::from_value(json!({
            "swagger": "2.0",
            "info": {"title": "T", "version": "1"},
            "tags": [{"name": "zoo"}, {"name": "admin"}],
            "paths": {
                "/animals": {
                    "get": {"tags": ["zoo"], "responses": {}},
                    "post": {"tags": ["keepers"], "responses": {}}
                },
                "/animals/{id}/feedings": {
                    "options": {"responses": {}}
                },
                "/health": {
                    "get": {"responses": {}}
                },
                "/": {
                    "get": {"responses": {}}
                }
            }
        }))
        .unwrap();

        let resources = ResourceHierarchyBuilder::new(&doc, &ParserConfig::default()).build();
        let stats = StatsCalculator::calculate(&doc, &resources);

        assert_eq!(stats.total_paths, 4);
        assert_eq!(stats.total_operations, 5);
        assert_eq!(stats.total_resources, 3);
        // animals.feedings only answers OPTIONS
        assert_eq!(stats.restful_resources, 2);
        assert_eq!(stats.tags, vec!["admin", "keepers", "zoo"]);
    }
}
