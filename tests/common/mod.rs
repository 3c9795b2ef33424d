//! Shared styles and builders for integration tests.

use bibtex_doctree::{
    BibFile, BibliographyConfig, BibtexCache, Document, Element, ElementKind, Entry,
    FormattedEntry, Node, RichText, Style, StyleRegistry,
};

/// Formats each entry as its raw `note` field, labelled by position.
#[allow(dead_code)]
pub struct NoteStyle;

impl Style for NoteStyle {
    fn format_entries(&mut self, entries: Vec<Entry>) -> Vec<FormattedEntry> {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| FormattedEntry {
                label: (i + 1).to_string(),
                text: vec![RichText::plain(entry.field("note").unwrap_or_default())],
                key: entry.key,
            })
            .collect()
    }
}

/// Registry with [`NoteStyle`] registered as "plain".
#[allow(dead_code)]
pub fn note_registry() -> StyleRegistry {
    let mut styles = StyleRegistry::new();
    styles.register("plain", || Box::new(NoteStyle));
    styles
}

/// Builds a cache with one bibliography `bib-0` over a single file whose
/// entries have the given notes, keyed `entry-1`, `entry-2`, ...
#[allow(dead_code)]
pub fn build_cache(notes: &[&str], curly_bracket_strip: bool) -> BibtexCache {
    let entries = notes.iter().enumerate().map(|(i, note)| {
        Entry::new(format!("entry-{}", i + 1), "misc").with_field("note", *note)
    });
    let mut cache = BibtexCache::new();
    cache.add_bibfile("refs.bib", BibFile::from_entries(entries));
    cache.add_bibliography(
        "bib-0",
        BibliographyConfig {
            bibfiles: vec!["refs.bib".to_string()],
            curly_bracket_strip,
            ..BibliographyConfig::default()
        },
    );
    cache
}

/// A document with a heading paragraph followed by one placeholder per id.
#[allow(dead_code)]
pub fn document_with_placeholders(ids: &[&str]) -> Document {
    let mut doc = Document::new().with_source("index.rst");
    doc.push(
        Element::new(ElementKind::Section)
            .with_id("references")
            .with_child(Element::new(ElementKind::Paragraph).with_child(Node::text("References"))),
    );
    for id in ids {
        doc.push(Element::new(ElementKind::Bibliography).with_id(*id));
    }
    doc
}
