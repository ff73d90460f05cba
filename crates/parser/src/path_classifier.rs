//! Path template → resource chain
//!
//! `/users/{id}/posts/{postId}/comments` becomes `users.posts.comments`:
//! parameters are dropped, action words are dropped, and what remains names
//! the resource and its ancestors.

use restmap_common::{join_key, ParserConfig};
use std::collections::HashSet;
use std::fmt;

/// Ordered resource-name segments derived from one path template
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceChain(Vec<String>);

impl ResourceChain {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Chain length minus one; root resources have depth 0
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Dot-joined chain, see [`join_key`]
    pub fn key(&self) -> String {
        join_key(self.0.as_slice())
    }

    /// Resource name (last segment)
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Chain with the last segment removed, `None` for roots
    pub fn parent(&self) -> Option<ResourceChain> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Every proper prefix, longest first
    pub fn ancestors(&self) -> impl Iterator<Item = ResourceChain> + '_ {
        (1..self.0.len())
            .rev()
            .map(move |len| Self(self.0[..len].to_vec()))
    }
}

impl fmt::Display for ResourceChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Classifies path templates into resource chains
#[derive(Debug, Clone)]
pub struct PathClassifier {
    action_words: HashSet<String>,
    ignored: HashSet<String>,
    strip_versions: bool,
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl PathClassifier {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            action_words: config.action_words().map(str::to_lowercase).collect(),
            ignored: config
                .ignored_segments
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            strip_versions: config.strip_version_segments,
        }
    }

    /// Derive the resource chain of a path template
    ///
    /// Action words are always removed. When that removal is the only reason
    /// the chain came out empty, the last action word becomes the chain
    /// (`/health` → `health`), so a standalone action endpoint still shows
    /// up as a resource.
    ///
    /// # Examples
    /// ```
    /// use restmap_parser::PathClassifier;
    ///
    /// let chain = PathClassifier::default().classify("/users/{id}/posts/{postId}/comments");
    /// assert_eq!(chain.key(), "users.posts.comments");
    /// ```
    pub fn classify(&self, path: &str) -> ResourceChain {
        let mut segments = Vec::new();
        let mut last_action = None;

        for literal in literal_segments(path) {
            let lower = literal.to_lowercase();
            if self.ignored.contains(&lower) || (self.strip_versions && is_version(&lower)) {
                continue;
            }
            if self.action_words.contains(&lower) {
                last_action = Some(literal);
                continue;
            }
            segments.push(literal);
        }

        if segments.is_empty() {
            if let Some(action) = last_action {
                segments.push(action);
            }
        }

        ResourceChain(segments)
    }
}

/// Non-parameter segments of a template, with `{name}` tokens stripped and
/// `:name` segments dropped
pub fn literal_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.starts_with(':'))
        .map(strip_parameter_tokens)
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Parameter name when the whole segment is a parameter (`{id}` or `:id`)
pub fn parameter_name(segment: &str) -> Option<&str> {
    if let Some(name) = segment.strip_prefix(':') {
        return (!name.is_empty()).then_some(name);
    }
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
}

/// Whether the template contains any parameter
pub fn has_parameters(path: &str) -> bool {
    path.contains('{') || path.split('/').any(|s| s.starts_with(':'))
}

fn strip_parameter_tokens(segment: &str) -> String {
    let mut result = String::with_capacity(segment.len());
    let mut depth = 0usize;
    for ch in segment.chars() {
        match ch {
            '{' => depth += 1,
            '}' if depth > 0 => depth -= 1,
            _ if depth == 0 => result.push(ch),
            _ => {}
        }
    }
    result
}

fn is_version(segment: &str) -> bool {
    segment.strip_prefix('v').is_some_and(|rest| {
        rest.starts_with(|c: char| c.is_ascii_digit())
            && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
    })
}
