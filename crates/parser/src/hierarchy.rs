//! Resource tree construction
//!
//! Path templates are grouped by resource chain; each group becomes one
//! `ResourceNode`. Nodes are then nested under their nearest existing
//! ancestor chain, so every node lands in the tree exactly once.

use crate::classifier::ResourceClassifier;
use crate::naming::humanize;
use crate::openapi::Document;
use crate::operation_extractor::OperationExtractor;
use crate::path_classifier::{has_parameters, literal_segments, parameter_name, PathClassifier, ResourceChain};
use crate::schema_resolver::SchemaResolver;
use crate::type_mapper::TypeMapper;
use restmap_common::{
    FieldDefinition, HttpMethod, OperationInfo, ParserConfig, ResourceNode, SchemaStrategy,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// One path template and the operations extracted from it
struct PathMember {
    path: String,
    operations: Vec<OperationInfo>,
}

/// Path templates sharing one resource chain
struct ResourceGroup {
    chain: ResourceChain,
    members: Vec<PathMember>,
}

/// Builds the resource tree of one document
pub struct ResourceHierarchyBuilder<'a> {
    doc: &'a Document,
    classifier: PathClassifier,
    strategy: SchemaStrategy,
    max_ref_depth: usize,
}

impl<'a> ResourceHierarchyBuilder<'a> {
    pub fn new(doc: &'a Document, config: &ParserConfig) -> Self {
        Self {
            doc,
            classifier: PathClassifier::new(config),
            strategy: config.schema_strategy,
            max_ref_depth: config.max_ref_depth,
        }
    }

    /// Root-level resource nodes, children nested in `sub_resources`
    pub fn build(&self) -> Vec<ResourceNode> {
        let nodes = self
            .group_paths()
            .into_values()
            .map(|group| self.build_node(group))
            .collect();

        assemble_tree(nodes)
    }

    fn group_paths(&self) -> BTreeMap<String, ResourceGroup> {
        let mut resolver = SchemaResolver::new(self.doc).with_max_ref_depth(self.max_ref_depth);
        let extractor = OperationExtractor::new(self.doc);
        let mut groups: BTreeMap<String, ResourceGroup> = BTreeMap::new();

        for (path, item) in self.doc.paths() {
            let chain = self.classifier.classify(path);
            if chain.is_empty() {
                debug!(path, "path has no resource segments, skipping");
                continue;
            }
            debug!(path, chain = %chain, "classified path");

            let operations = extractor.extract(path, item, &mut resolver);
            groups
                .entry(chain.key())
                .or_insert_with(|| ResourceGroup {
                    chain,
                    members: Vec::new(),
                })
                .members
                .push(PathMember {
                    path: path.clone(),
                    operations,
                });
        }

        groups
    }

    fn build_node(&self, mut group: ResourceGroup) -> (ResourceChain, ResourceNode) {
        group.members.sort_by(|a, b| canonical_order(&a.path, &b.path));

        let chain = group.chain;
        let name = chain.name().unwrap_or_default().to_string();
        let canonical = group
            .members
            .first()
            .map(|m| m.path.clone())
            .unwrap_or_default();

        let mut methods = BTreeSet::new();
        let mut tags = BTreeSet::new();
        let mut operations: BTreeMap<HttpMethod, Vec<OperationInfo>> = BTreeMap::new();
        for op in group.members.iter().flat_map(|m| m.operations.iter()) {
            methods.insert(op.method);
            tags.extend(op.tags.iter().cloned());
            operations.entry(op.method).or_default().push(op.clone());
        }

        let schema = self.merge_schema(&operations);
        let id_param = group
            .members
            .iter()
            .find_map(|m| id_param_of(&m.path, &name));
        let id_field = identifying_field(&schema, id_param.as_deref());
        let classification = ResourceClassifier::classify(&methods);
        let is_restful = ResourceClassifier::is_restful(&methods);

        debug!(
            key = %chain,
            paths = group.members.len(),
            %classification,
            "built resource node"
        );

        let node = ResourceNode {
            key: chain.key(),
            display_name: humanize(&name),
            name,
            description: describe(&operations),
            base_path: base_path(&canonical),
            path: canonical,
            paths: group.members.into_iter().map(|m| m.path).collect(),
            id_param,
            id_field,
            methods,
            schema,
            operations,
            sub_resources: Vec::new(),
            parent_key: chain.parent().map(|p| p.key()),
            depth: chain.depth(),
            classification,
            is_restful,
            tags,
        };

        (chain, node)
    }

    /// Resource fields under the configured strategy, first-seen-wins by name
    fn merge_schema(
        &self,
        operations: &BTreeMap<HttpMethod, Vec<OperationInfo>>,
    ) -> Vec<FieldDefinition> {
        let mut merged = Vec::new();
        let mut seen = HashSet::new();

        // BTreeMap order puts GET first, so read responses take precedence
        for op in operations.values().flatten() {
            if let Some(fields) = op.success_fields() {
                merge_fields(&mut merged, &mut seen, fields);
            }
        }

        let include_bodies = match self.strategy {
            SchemaStrategy::ResponseEnvelope => merged.is_empty(),
            SchemaStrategy::OperationAggregate => true,
        };
        if include_bodies {
            for body in operations.values().flatten().filter_map(|op| op.request_body.as_ref()) {
                merge_fields(&mut merged, &mut seen, body);
            }
        }

        merged
    }
}

fn merge_fields(
    merged: &mut Vec<FieldDefinition>,
    seen: &mut HashSet<String>,
    fields: &[FieldDefinition],
) {
    for field in fields {
        if seen.insert(field.name.clone()) {
            merged.push(field.clone());
        }
    }
}

/// Fewer segments first, then templates without parameters, then lexicographic
fn canonical_order(a: &str, b: &str) -> std::cmp::Ordering {
    let rank = |path: &str| (segment_count(path), has_parameters(path));
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

fn segment_count(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

/// The parameter directly following the last occurrence of `name`
fn id_param_of(path: &str, name: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let position = segments
        .iter()
        .rposition(|segment| literal_segments(segment).first().map(String::as_str) == Some(name))?;

    segments
        .get(position + 1)
        .and_then(|segment| parameter_name(segment))
        .map(str::to_string)
}

/// A field named after the id parameter, else `id`/`uuid`, else the first
/// identifier-looking field
fn identifying_field(schema: &[FieldDefinition], id_param: Option<&str>) -> Option<String> {
    let by_param = id_param.and_then(|param| schema.iter().find(|f| f.name == param));
    let plain = || {
        schema
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case("id") || f.name.eq_ignore_ascii_case("uuid"))
    };
    let any = || schema.iter().find(|f| TypeMapper::is_identifier(&f.name));

    by_param
        .or_else(plain)
        .or_else(any)
        .map(|f| f.name.clone())
}

/// First summary or description, GET operations first
fn describe(operations: &BTreeMap<HttpMethod, Vec<OperationInfo>>) -> Option<String> {
    operations
        .values()
        .flatten()
        .find_map(|op| op.summary.clone().or_else(|| op.description.clone()))
}

fn base_path(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    while segments
        .last()
        .is_some_and(|segment| parameter_name(segment).is_some())
    {
        segments.pop();
    }
    format!("/{}", segments.join("/"))
}

/// Nest nodes under their nearest existing ancestor; nodes without one
/// become roots
fn assemble_tree(mut nodes: Vec<(ResourceChain, ResourceNode)>) -> Vec<ResourceNode> {
    nodes.sort_by(|(a, _), (b, _)| a.depth().cmp(&b.depth()).then_with(|| a.cmp(b)));

    let keys: HashSet<String> = nodes.iter().map(|(_, node)| node.key.clone()).collect();
    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    let mut roots = Vec::new();

    for (chain, node) in &nodes {
        match chain.ancestors().map(|a| a.key()).find(|key| keys.contains(key)) {
            Some(ancestor) => {
                if node.parent_key.as_deref() != Some(ancestor.as_str()) {
                    debug!(key = %node.key, %ancestor, "parent resource missing, attaching to ancestor");
                }
                children.entry(ancestor).or_default().push(node.key.clone());
            }
            None => {
                if node.parent_key.is_some() {
                    debug!(key = %node.key, "no ancestor resource, promoting to root");
                }
                roots.push(node.key.clone());
            }
        }
    }

    let mut by_key: HashMap<String, ResourceNode> = nodes
        .into_iter()
        .map(|(_, node)| (node.key.clone(), node))
        .collect();

    roots
        .iter()
        .filter_map(|key| take_subtree(key, &mut by_key, &children))
        .collect()
}

fn take_subtree(
    key: &str,
    nodes: &mut HashMap<String, ResourceNode>,
    children: &HashMap<String, Vec<String>>,
) -> Option<ResourceNode> {
    let mut node = nodes.remove(key)?;
    if let Some(child_keys) = children.get(key) {
        node.sub_resources = child_keys
            .iter()
            .filter_map(|child| take_subtree(child, nodes, children))
            .collect();
    }
    Some(node)
}
