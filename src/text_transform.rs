//! Text post-processing for rendered citations.
//!
//! Transforms take ownership of a text leaf's content and return the node
//! that replaces it. When nothing needs to change they hand back the same
//! string, so the common case allocates nothing.

use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use crate::nodes::{Element, ElementKind, Node};

/// Matches `\url{...}`. Spaces may separate the marker from the brace;
/// leading spaces and braces inside the argument are not part of the URL,
/// and an argument made only of them is not a match. The argument ends at
/// the first closing brace.
static URL_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\url *\{[ {]*([^ {}][^}]*)\}").unwrap());

/// Applies `transform` to every text leaf below `element`.
///
/// Element children are recursed into; only text leaves are replaced.
/// Nodes returned by `transform` are not visited again.
pub fn apply_to_text<F>(element: &mut Element, transform: F)
where
    F: Fn(String) -> Node,
{
    apply_to_text_inner(element, &transform);
}

fn apply_to_text_inner<F>(element: &mut Element, transform: &F)
where
    F: Fn(String) -> Node,
{
    for child in element.children.iter_mut() {
        match child {
            Node::Text(text) => {
                let text = std::mem::take(text);
                *child = transform(text);
            }
            Node::Element(inner) => apply_to_text_inner(inner, transform),
        }
    }
}

/// Removes `{` and `}` from text.
pub fn strip_curly_brackets(text: String) -> Node {
    if text.contains(['{', '}']) {
        Node::Text(text.replace(['{', '}'], ""))
    } else {
        Node::Text(text)
    }
}

/// Converts `\url{...}` escapes into hyperlinks.
///
/// # Arguments
///
/// * `text` - Content of a text leaf
///
/// # Returns
///
/// An inline element holding, for each escape, the text before it followed
/// by a reference whose target and label are the URL, and finally the text
/// after the last escape. Text pieces are kept even when empty. Text without
/// a complete escape is returned unchanged, including an unterminated
/// `\url{`.
pub fn recognize_url_escape(text: String) -> Node {
    if !URL_ESCAPE.is_match(&text) {
        return Node::Text(text);
    }

    let mut inline = Element::new(ElementKind::Inline);
    let mut last = 0;
    for captures in URL_ESCAPE.captures_iter(&text) {
        let (Some(whole), Some(url)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let url = url.as_str();
        trace!("recognized url escape: {}", url);

        inline.push(Node::text(&text[last..whole.start()]));
        inline.push(
            Element::new(ElementKind::Reference)
                .with_refuri(url)
                .with_child(Node::text(url)),
        );
        last = whole.end();
    }
    inline.push(Node::text(&text[last..]));
    inline.into()
}
