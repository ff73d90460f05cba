//! OpenAPI 3.x and Swagger 2.0 documents
//!
//! Loads a document from a URL or file, validates its structure and exposes
//! it through one dialect-neutral [`Document`].
//!
//! ## Dialects
//! - **OpenAPI 3.x**: `openapi` marker, `servers`, `requestBody`,
//!   `components.schemas`
//! - **Swagger 2.0**: `swagger` marker, `host`/`basePath`/`schemes`,
//!   `in: body` and `formData` parameters, `definitions`
//!
//! ## Usage
//! ```rust,ignore
//! use restmap_parser::openapi::{Document, DocumentSource, SpecLoader};
//!
//! let loader = SpecLoader::new(Duration::from_secs(30))?;
//! let doc = Document::from_value(loader.fetch("petstore.yaml").await?)?;
//! println!("{} ({})", doc.info().title, doc.dialect());
//! ```

mod document;
mod loader;
mod types;

pub use document::Document;
#[cfg(test)]
pub use loader::MockDocumentSource;
pub use loader::{parse_content, DocumentSource, SpecLoader};
pub use types::*;
