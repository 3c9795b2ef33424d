//! Rendering of formatted entries into document nodes.

use crate::nodes::{Document, Element, ElementKind, Node};
use crate::style::{FormattedEntry, RichText};

/// Converts formatted entries into citation subtrees.
pub trait Backend {
    /// Renders one entry. `document` is the document the citation will be
    /// inserted into.
    fn entry_to_node(&self, entry: &FormattedEntry, document: &Document) -> Node;
}

/// Renders entries as citation elements.
///
/// Each citation has an id derived from the entry key, the key as its name,
/// a label child and a paragraph holding the formatted text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoctreeBackend;

impl Backend for DoctreeBackend {
    fn entry_to_node(&self, entry: &FormattedEntry, document: &Document) -> Node {
        let mut paragraph = Element::new(ElementKind::Paragraph);
        for part in &entry.text {
            paragraph.push(render_rich_text(part));
        }

        Element::new(ElementKind::Citation)
            .with_id(document.make_id(&entry.key))
            .with_name(entry.key.as_str())
            .with_child(Element::new(ElementKind::Label).with_child(Node::text(entry.label.as_str())))
            .with_child(paragraph)
            .into()
    }
}

fn render_rich_text(text: &RichText) -> Node {
    match text {
        RichText::Plain(s) => Node::text(s.as_str()),
        RichText::Emphasis(parts) => render_container(ElementKind::Emphasis, parts),
        RichText::Strong(parts) => render_container(ElementKind::Strong, parts),
    }
}

fn render_container(kind: ElementKind, parts: &[RichText]) -> Node {
    let mut element = Element::new(kind);
    for part in parts {
        element.push(render_rich_text(part));
    }
    element.into()
}
