//! Path item → normalised operation records
//!
//! Reconciles the two dialects: Swagger 2.0 carries the request body as an
//! `in: body` parameter (or a set of `formData` parameters), OpenAPI 3.x as a
//! `requestBody` object. Both end up as `OperationInfo::request_body`.

use crate::openapi::{
    preferred_schema, Document, Operation, Parameter, PathItem, ReferenceOr, RequestBody,
};
use crate::schema_resolver::SchemaResolver;
use restmap_common::{
    Dialect, FieldDefinition, HttpMethod, OperationInfo, ParameterInfo, ParameterLocation,
};
use std::collections::BTreeMap;
use tracing::warn;

/// Extracts operations from path items of one document
pub struct OperationExtractor<'a> {
    doc: &'a Document,
}

impl<'a> OperationExtractor<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// One `OperationInfo` per HTTP method present on the path item, in
    /// `HttpMethod::ALL` order
    pub fn extract(
        &self,
        path: &str,
        item: &'a PathItem,
        resolver: &mut SchemaResolver<'a>,
    ) -> Vec<OperationInfo> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(|method| operation_for(item, method).map(|op| (method, op)))
            .map(|(method, op)| self.extract_operation(path, method, item, op, resolver))
            .collect()
    }

    fn extract_operation(
        &self,
        path: &str,
        method: HttpMethod,
        item: &'a PathItem,
        op: &'a Operation,
        resolver: &mut SchemaResolver<'a>,
    ) -> OperationInfo {
        let mut parameters = Vec::new();
        let mut body_param = None;
        let mut form_fields = Vec::new();

        for param in self.merged_parameters(path, item, op) {
            if param.location == "body" {
                body_param = Some(param);
                continue;
            }

            let Some(location) = ParameterLocation::from_keyword(&param.location) else {
                warn!(path, parameter = %param.name, location = %param.location, "unknown parameter location");
                continue;
            };
            // Path parameters are required whatever the document says
            let required = param.required || location == ParameterLocation::Path;
            let mut schema = resolver.field(&param.name, &param.effective_schema(), required);
            if schema.description.is_none() {
                schema.description = param.description.clone();
            }

            if location == ParameterLocation::FormData {
                form_fields.push(schema);
                continue;
            }

            parameters.push(ParameterInfo {
                name: param.name.clone(),
                location,
                required,
                description: param.description.clone(),
                schema,
            });
        }

        let request_body = match self.doc.dialect() {
            Dialect::OpenApi3 => {
                if body_param.is_some() {
                    warn!(path, %method, "ignoring `in: body` parameter in an OpenAPI 3 document");
                }
                op.request_body
                    .as_ref()
                    .and_then(|body| self.request_body_fields(path, body, resolver))
            }
            Dialect::Swagger2 => match body_param {
                Some(param) => Some(resolver.fields(&param.effective_schema())),
                None if !form_fields.is_empty() => Some(form_fields),
                None => None,
            },
        };

        OperationInfo {
            method,
            path: path.to_string(),
            operation_id: op.operation_id.clone(),
            summary: op.summary.clone(),
            description: op.description.clone(),
            parameters,
            request_body,
            responses: self.response_fields(path, op, resolver),
            tags: op.tags.clone(),
            deprecated: op.deprecated,
        }
    }

    /// Path-level parameters followed by operation-level ones; an operation
    /// parameter replaces a path parameter with the same name and location
    fn merged_parameters(
        &self,
        path: &str,
        item: &'a PathItem,
        op: &'a Operation,
    ) -> Vec<&'a Parameter> {
        let mut merged: Vec<&'a Parameter> = Vec::new();

        for param in item.parameters.iter().chain(op.parameters.iter()) {
            let Some(resolved) = self.doc.resolve_parameter(param) else {
                if let ReferenceOr::Reference { ref_path } = param {
                    warn!(path, reference = %ref_path, "unresolved parameter reference");
                }
                continue;
            };

            match merged
                .iter_mut()
                .find(|p| p.name == resolved.name && p.location == resolved.location)
            {
                Some(existing) => *existing = resolved,
                None => merged.push(resolved),
            }
        }

        merged
    }

    fn request_body_fields(
        &self,
        path: &str,
        body: &'a ReferenceOr<RequestBody>,
        resolver: &mut SchemaResolver<'a>,
    ) -> Option<Vec<FieldDefinition>> {
        let Some(body) = self.doc.resolve_request_body(body) else {
            warn!(path, "unresolved request body reference");
            return None;
        };

        Some(
            preferred_schema(&body.content)
                .map(|schema| resolver.fields(schema))
                .unwrap_or_default(),
        )
    }

    fn response_fields(
        &self,
        path: &str,
        op: &'a Operation,
        resolver: &mut SchemaResolver<'a>,
    ) -> BTreeMap<String, Vec<FieldDefinition>> {
        let mut responses = BTreeMap::new();

        for (status, response) in &op.responses {
            let Some(response) = self.doc.resolve_response(response) else {
                warn!(path, status = %status, "unresolved response reference");
                continue;
            };

            let schema = match self.doc.dialect() {
                Dialect::OpenApi3 => preferred_schema(&response.content),
                Dialect::Swagger2 => response.schema.as_ref(),
            };
            let fields = schema
                .map(|schema| resolver.resource_fields(schema))
                .unwrap_or_default();
            responses.insert(status.clone(), fields);
        }

        responses
    }
}

/// The operation declared for `method`, if any
pub fn operation_for(item: &PathItem, method: HttpMethod) -> Option<&Operation> {
    match method {
        HttpMethod::Get => item.get.as_ref(),
        HttpMethod::Post => item.post.as_ref(),
        HttpMethod::Put => item.put.as_ref(),
        HttpMethod::Patch => item.patch.as_ref(),
        HttpMethod::Delete => item.delete.as_ref(),
        HttpMethod::Options => item.options.as_ref(),
        HttpMethod::Head => item.head.as_ref(),
    }
}
