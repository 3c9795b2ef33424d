//! bibtex-doctree: expands bibliography placeholders in document trees.
//!
//! This library provides functionality to:
//! - Model a document tree with text leaves and typed elements
//! - Post-process citation text (curly bracket stripping, `\url{...}` links)
//! - Resolve citation styles by name from a registry
//! - Replace bibliography placeholders with formatted citation nodes

pub mod backend;
pub mod cache;
pub mod nodes;
pub mod style;
pub mod text_transform;
pub mod transform;

pub use backend::{Backend, DoctreeBackend};
pub use cache::{BibFile, BibliographyConfig, BibtexCache, CacheError, Entry};
pub use nodes::{Attributes, Document, Element, ElementKind, Node, NodePath};
pub use style::{FormattedEntry, RichText, Style, StyleError, StyleFactory, StyleRegistry};
pub use text_transform::{apply_to_text, recognize_url_escape, strip_curly_brackets};
pub use transform::{BibliographyTransform, TransformError};
