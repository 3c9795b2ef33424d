//! Bibliography expansion.
//!
//! Replaces every bibliography placeholder in a document with the formatted
//! citations of the bibliography files configured for it.

use std::collections::HashSet;

use log::debug;
use thiserror::Error;

use crate::backend::Backend;
use crate::cache::{BibliographyConfig, BibtexCache, Entry};
use crate::nodes::{Document, Element, ElementKind, Node};
use crate::style::{StyleError, StyleRegistry};
use crate::text_transform::{apply_to_text, recognize_url_escape, strip_curly_brackets};

/// Errors that can occur while expanding bibliographies.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Bibliography placeholder has no id")]
    PlaceholderWithoutId,

    #[error("No bibliography configuration registered for id '{0}'")]
    BibliographyNotFound(String),

    #[error("Bibliography '{bibliography}' refers to '{bibfile}', which is not in the cache")]
    BibfileNotFound {
        bibliography: String,
        bibfile: String,
    },

    #[error(transparent)]
    Style(#[from] StyleError),
}

/// Expands bibliography placeholders into citation lists.
pub struct BibliographyTransform<'a> {
    cache: &'a BibtexCache,
    styles: &'a StyleRegistry,
    backend: &'a dyn Backend,
}

impl<'a> BibliographyTransform<'a> {
    /// Priority in the host's transform pipeline. Must run before references
    /// are resolved.
    pub const DEFAULT_PRIORITY: u32 = 10;

    /// Creates a transform.
    ///
    /// # Arguments
    ///
    /// * `cache` - Placeholder configurations and bibliography entries
    /// * `styles` - Styles available to the configurations
    /// * `backend` - Renders formatted entries into citation nodes
    pub fn new(cache: &'a BibtexCache, styles: &'a StyleRegistry, backend: &'a dyn Backend) -> Self {
        Self {
            cache,
            styles,
            backend,
        }
    }

    /// Replaces each placeholder in `document` with a paragraph holding one
    /// citation per formatted entry.
    ///
    /// # Arguments
    ///
    /// * `document` - The document to expand in place
    ///
    /// # Errors
    ///
    /// Stops at the first placeholder that cannot be expanded. Placeholders
    /// before it have already been replaced.
    pub fn apply(&self, document: &mut Document) -> Result<(), TransformError> {
        for path in document.find_paths(ElementKind::Bibliography) {
            let id = match document.get(&path) {
                Some(Node::Element(placeholder)) => placeholder
                    .id()
                    .ok_or(TransformError::PlaceholderWithoutId)?
                    .to_string(),
                _ => continue,
            };
            let citations = self.render_bibliography(&id, document)?;
            document.replace(&path, citations.into());
        }
        Ok(())
    }

    fn render_bibliography(&self, id: &str, document: &Document) -> Result<Element, TransformError> {
        let config = self
            .cache
            .bibliography(id)
            .ok_or_else(|| TransformError::BibliographyNotFound(id.to_string()))?;

        let entries = self.collect_entries(id, config)?;
        debug!(
            "expanding bibliography '{}': {} entries, style '{}'",
            id,
            entries.len(),
            config.style
        );

        let mut style = self.styles.resolve(&config.style)?();

        let mut container = Element::new(ElementKind::Paragraph);
        let mut used_ids = HashSet::new();
        for entry in style.format_entries(entries) {
            let mut citation = match self.backend.entry_to_node(&entry, document) {
                Node::Element(element) => element,
                text @ Node::Text(_) => Element::new(ElementKind::Inline).with_child(text),
            };
            reserve_ids(&mut citation, document, &mut used_ids);
            apply_to_text(&mut citation, recognize_url_escape);
            if config.curly_bracket_strip {
                apply_to_text(&mut citation, strip_curly_brackets);
            }
            container.push(citation);
        }
        Ok(container)
    }

    /// Clones the entries of every configured file, in file order.
    ///
    /// The style takes ownership of what it formats, so the cached entries
    /// are never handed out.
    fn collect_entries(
        &self,
        id: &str,
        config: &BibliographyConfig,
    ) -> Result<Vec<Entry>, TransformError> {
        let mut entries = Vec::new();
        for bibfile in &config.bibfiles {
            let data = self
                .cache
                .bibfile(bibfile)
                .ok_or_else(|| TransformError::BibfileNotFound {
                    bibliography: id.to_string(),
                    bibfile: bibfile.clone(),
                })?;
            entries.extend(data.entries.values().cloned());
        }
        Ok(entries)
    }
}

/// Renames ids of `citation` already handed out to an earlier citation of
/// the same bibliography, then records them in `used`.
///
/// The backend only sees the document, not the citations rendered before
/// this one, so two keys that normalize alike get the same id from it.
fn reserve_ids(citation: &mut Element, document: &Document, used: &mut HashSet<String>) {
    for id in citation.attributes.ids.iter_mut() {
        if used.contains(id.as_str()) {
            let base = id.clone();
            *id = (1..)
                .map(|n| format!("{}-{}", base, n))
                .find(|candidate| !used.contains(candidate) && !document.contains_id(candidate))
                .unwrap_or(base);
        }
        used.insert(id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DoctreeBackend;
    use crate::cache::BibFile;
    use crate::style::{FormattedEntry, RichText, Style};

    /// Uses the raw title as text and the position as label.
    struct TitleOnly;

    impl Style for TitleOnly {
        fn format_entries(&mut self, entries: Vec<Entry>) -> Vec<FormattedEntry> {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, entry)| FormattedEntry {
                    label: (i + 1).to_string(),
                    text: vec![RichText::plain(entry.field("title").unwrap_or_default())],
                    key: entry.key,
                })
                .collect()
        }
    }

    fn registry() -> StyleRegistry {
        let mut styles = StyleRegistry::new();
        styles.register("plain", || Box::new(TitleOnly));
        styles
    }

    fn cache(curly_bracket_strip: bool) -> BibtexCache {
        let mut cache = BibtexCache::new();
        cache.add_bibfile(
            "refs.bib",
            BibFile::from_entries([
                Entry::new("one", "book").with_field("title", "{One}"),
                Entry::new("two", "book").with_field("title", "Two"),
            ]),
        );
        cache.add_bibfile(
            "more.bib",
            BibFile::from_entries([Entry::new("three", "misc").with_field("title", "Three")]),
        );
        cache.add_bibliography(
            "bib-0",
            BibliographyConfig {
                bibfiles: vec!["refs.bib".into(), "more.bib".into()],
                curly_bracket_strip,
                ..BibliographyConfig::default()
            },
        );
        cache
    }

    fn document_with(ids: &[&str]) -> Document {
        let mut doc = Document::new();
        doc.push(Element::new(ElementKind::Paragraph).with_child(Node::text("Intro")));
        for id in ids {
            doc.push(Element::new(ElementKind::Bibliography).with_id(*id));
        }
        doc
    }

    // ============================================
    // Tests for apply()
    // ============================================

    #[test]
    fn test_apply_replaces_placeholder() {
        // Given: A document with one placeholder over two files
        let cache = cache(true);
        let styles = registry();
        let mut doc = document_with(&["bib-0"]);

        // When: We expand it
        BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap();

        // Then: The placeholder is now a paragraph of citations in file order
        assert!(doc.find_paths(ElementKind::Bibliography).is_empty());
        let container = doc.get(&[1]).and_then(Node::as_element).unwrap();
        assert_eq!(container.kind, ElementKind::Paragraph);
        let names: Vec<_> = container
            .children
            .iter()
            .filter_map(Node::as_element)
            .map(|c| c.attributes.names[0].as_str())
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(container.astext(), "1One2Two3Three");
    }

    #[test]
    fn test_apply_without_bracket_strip() {
        let cache = cache(false);
        let styles = registry();
        let mut doc = document_with(&["bib-0"]);

        BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap();

        assert!(doc.astext().contains("{One}"));
    }

    #[test]
    fn test_apply_no_placeholders_is_noop() {
        let cache = cache(true);
        let styles = registry();
        let mut doc = document_with(&[]);
        let before = doc.clone();

        BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap();

        assert_eq!(doc, before);
    }

    #[test]
    fn test_apply_missing_configuration() {
        let cache = cache(true);
        let styles = registry();
        let mut doc = document_with(&["unknown"]);

        let err = BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap_err();

        assert!(
            matches!(err, TransformError::BibliographyNotFound(ref id) if id == "unknown"),
            "got: {:?}",
            err
        );
    }

    #[test]
    fn test_apply_placeholder_without_id() {
        let cache = cache(true);
        let styles = registry();
        let mut doc = Document::new();
        doc.push(Element::new(ElementKind::Bibliography));

        let err = BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap_err();

        assert!(matches!(err, TransformError::PlaceholderWithoutId));
    }

    #[test]
    fn test_apply_missing_bibfile() {
        let mut cache = cache(true);
        cache.add_bibliography(
            "bib-1",
            BibliographyConfig {
                bibfiles: vec!["missing.bib".into()],
                ..BibliographyConfig::default()
            },
        );
        let styles = registry();
        let mut doc = document_with(&["bib-1"]);

        let err = BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap_err();

        match err {
            TransformError::BibfileNotFound {
                bibliography,
                bibfile,
            } => {
                assert_eq!(bibliography, "bib-1");
                assert_eq!(bibfile, "missing.bib");
            }
            other => panic!("Expected BibfileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_unknown_style() {
        let mut cache = cache(true);
        cache.add_bibliography(
            "bib-1",
            BibliographyConfig {
                style: "fancy".into(),
                ..BibliographyConfig::default()
            },
        );
        let styles = registry();
        let mut doc = document_with(&["bib-1"]);

        let err = BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap_err();

        assert!(matches!(err, TransformError::Style(StyleError::NotFound { .. })));
        assert!(err.to_string().contains("fancy"));
    }

    #[test]
    fn test_apply_empty_bibliography() {
        let mut cache = cache(true);
        cache.add_bibliography("bib-1", BibliographyConfig::default());
        let styles = registry();
        let mut doc = document_with(&["bib-1"]);

        BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap();

        let container = doc.get(&[1]).and_then(Node::as_element).unwrap();
        assert_eq!(container.kind, ElementKind::Paragraph);
        assert!(container.children.is_empty());
    }

    #[test]
    fn test_apply_citation_ids_unique_within_bibliography() {
        // Given: Keys that normalize to the same ids
        let mut cache = BibtexCache::new();
        cache.add_bibfile(
            "clash.bib",
            BibFile::from_entries([
                Entry::new("Smith2020", "misc"),
                Entry::new("smith2020", "misc"),
                Entry::new("1999", "misc"),
                Entry::new("2000", "misc"),
            ]),
        );
        cache.add_bibliography(
            "bib-0",
            BibliographyConfig {
                bibfiles: vec!["clash.bib".into()],
                ..BibliographyConfig::default()
            },
        );
        let styles = registry();
        let mut doc = document_with(&["bib-0"]);

        // When: We expand the bibliography
        BibliographyTransform::new(&cache, &styles, &DoctreeBackend)
            .apply(&mut doc)
            .unwrap();

        // Then: Every citation has its own id
        let ids: Vec<_> = doc
            .root()
            .descendants_of_kind(ElementKind::Citation)
            .iter()
            .filter_map(|c| c.id())
            .collect();
        assert_eq!(ids, vec!["smith2020", "smith2020-1", "id", "id-1"]);
    }

    #[test]
    fn test_reserve_ids_skips_ids_in_document() {
        // Given: A document already using "knuth-1"
        let mut doc = Document::new();
        doc.push(Element::new(ElementKind::Section).with_id("knuth-1"));
        let mut used = HashSet::new();
        used.insert("knuth".to_string());
        let mut citation = Element::new(ElementKind::Citation).with_id("knuth");

        // When: We reserve the colliding id
        reserve_ids(&mut citation, &doc, &mut used);

        // Then: The next free suffix is used
        assert_eq!(citation.id(), Some("knuth-2"));
        assert!(used.contains("knuth-2"));
    }

    #[test]
    fn test_apply_text_backend_output_is_wrapped() {
        struct TextBackend;
        impl Backend for TextBackend {
            fn entry_to_node(&self, entry: &FormattedEntry, _document: &Document) -> Node {
                Node::text(format!("[{}] {{{}}}", entry.label, entry.key))
            }
        }

        let cache = cache(true);
        let styles = registry();
        let mut doc = document_with(&["bib-0"]);

        BibliographyTransform::new(&cache, &styles, &TextBackend)
            .apply(&mut doc)
            .unwrap();

        let container = doc.get(&[1]).and_then(Node::as_element).unwrap();
        let first = container.children[0].as_element().unwrap();
        assert_eq!(first.kind, ElementKind::Inline);
        assert_eq!(first.astext(), "[1] one");
    }
}
