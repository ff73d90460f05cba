//! Resource nodes and the operations attached to them

use crate::field::FieldDefinition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// HTTP methods recognised on a path item
///
/// Declaration order is the canonical ordering used for method sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    /// The four methods that make a resource RESTful
    pub const CRUD: [HttpMethod; 4] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Case-insensitive parse
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown HTTP method: {}", s))
    }
}

/// Where a parameter is carried in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// Swagger 2.0 form fields
    FormData,
}

impl ParameterLocation {
    /// Parse the `in` keyword; `body` is not a parameter location
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            "formData" => Some(ParameterLocation::FormData),
            _ => None,
        }
    }
}

/// A parameter normalised across dialects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,

    pub location: ParameterLocation,

    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Resolved schema of the parameter value, named after the parameter
    pub schema: FieldDefinition,
}

/// One HTTP operation on a path template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub method: HttpMethod,

    /// Path template the operation was declared on
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,

    /// Request body fields; `None` when the operation takes no body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Vec<FieldDefinition>>,

    /// Fields per status code ("200", "201", "default", ...)
    #[serde(default)]
    pub responses: BTreeMap<String, Vec<FieldDefinition>>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub deprecated: bool,
}

impl OperationInfo {
    /// Fields of the first successful (2xx) response that has any
    pub fn success_fields(&self) -> Option<&[FieldDefinition]> {
        self.responses
            .iter()
            .filter(|(status, _)| status.starts_with('2') || status.as_str() == "2XX")
            .map(|(_, fields)| fields.as_slice())
            .find(|fields| !fields.is_empty())
    }
}

/// Capability classification of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Supports GET, POST, PUT and DELETE
    FullCrud,
    /// Supports GET and nothing else
    ReadOnly,
    Custom,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::FullCrud => write!(f, "full_crud"),
            Classification::ReadOnly => write!(f, "read_only"),
            Classification::Custom => write!(f, "custom"),
        }
    }
}

/// A RESTful entity inferred from one or more path templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Dot-joined resource chain, unique within one analysis
    pub key: String,

    /// Last chain segment
    pub name: String,

    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Canonical path template
    pub path: String,

    /// Canonical path without trailing parameter segments
    pub base_path: String,

    /// Every path template grouped into this resource, canonical first
    pub paths: Vec<String>,

    /// Path parameter identifying a single item, if any template has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_param: Option<String>,

    /// Schema field that identifies an item (`id`, `uuid`, `*_id`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,

    pub methods: BTreeSet<HttpMethod>,

    pub schema: Vec<FieldDefinition>,

    pub operations: BTreeMap<HttpMethod, Vec<OperationInfo>>,

    #[serde(default)]
    pub sub_resources: Vec<ResourceNode>,

    /// Chain minus its last segment; the node may not exist in the tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,

    /// Chain length minus one
    pub depth: usize,

    pub classification: Classification,

    pub is_restful: bool,

    pub tags: BTreeSet<String>,
}

/// Join resource names into a key
///
/// Names are separated by `.`; a `.` or `\` inside a name is escaped with
/// `\`, so `/a.b/c` and `/a/b.c` get distinct keys.
///
/// # Examples
/// ```
/// use restmap_common::{join_key, split_key};
///
/// assert_eq!(join_key(&["users", "posts"]), "users.posts");
/// assert_eq!(join_key(&["a.b", "c"]), "a\\.b.c");
/// assert_eq!(split_key("a\\.b.c"), vec!["a.b", "c"]);
/// ```
pub fn join_key<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|name| name.as_ref().replace('\\', "\\\\").replace('.', "\\."))
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a key produced by [`join_key`] back into names
pub fn split_key(key: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut chars = key.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => current.extend(chars.next()),
            '.' => names.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    names.push(current);
    names
}

impl ResourceNode {
    /// Case-insensitive method membership
    pub fn supports(&self, method: &str) -> bool {
        method
            .parse::<HttpMethod>()
            .map(|m| self.methods.contains(&m))
            .unwrap_or(false)
    }

    pub fn has_sub_resources(&self) -> bool {
        !self.sub_resources.is_empty()
    }
}
