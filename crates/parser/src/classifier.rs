//! Resource capability classification
//!
//! Labels a resource from its method set:
//! - GET, POST, PUT and DELETE all present → `full_crud`
//! - GET and nothing else → `read_only`
//! - anything else → `custom`
//!
//! RESTful-ness is weaker than full CRUD: any one of the four is enough.

use restmap_common::{Classification, HttpMethod};
use std::collections::BTreeSet;

/// Classifies resource nodes by the HTTP methods they support
pub struct ResourceClassifier;

impl ResourceClassifier {
    /// Classify a method set
    ///
    /// # Examples
    /// ```
    /// use restmap_common::{Classification, HttpMethod};
    /// use restmap_parser::ResourceClassifier;
    /// use std::collections::BTreeSet;
    ///
    /// let methods: BTreeSet<_> = [HttpMethod::Get].into_iter().collect();
    /// assert_eq!(ResourceClassifier::classify(&methods), Classification::ReadOnly);
    /// ```
    pub fn classify(methods: &BTreeSet<HttpMethod>) -> Classification {
        if HttpMethod::CRUD.iter().all(|m| methods.contains(m)) {
            Classification::FullCrud
        } else if methods.len() == 1 && methods.contains(&HttpMethod::Get) {
            Classification::ReadOnly
        } else {
            Classification::Custom
        }
    }

    /// Whether the method set intersects GET/POST/PUT/DELETE
    pub fn is_restful(methods: &BTreeSet<HttpMethod>) -> bool {
        HttpMethod::CRUD.iter().any(|m| methods.contains(m))
    }
}
