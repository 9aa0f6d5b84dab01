//! HTML serialization for documents and markup fragments.

use crate::core::document::{Document, NodeId, NodeKind};
use crate::core::markup::MarkupNode;

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "hr", "img", "input", "link", "meta", "source", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn push_open_tag<'a>(out: &mut String, tag: &str, attrs: impl Iterator<Item = (&'a str, &'a str)>) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');
}

pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(node) {
        write_node(doc, *child, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        None => {}
        Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
        Some(NodeKind::Element { tag }) => {
            let attrs = doc
                .attrs(node)
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()));
            push_open_tag(out, tag, attrs);
            if is_void_element(tag) {
                return;
            }
            for child in doc.children(node) {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

pub fn markup_to_html(nodes: &[MarkupNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_markup(node, &mut out);
    }
    out
}

fn write_markup(node: &MarkupNode, out: &mut String) {
    match node {
        MarkupNode::Text { text } => out.push_str(&escape_text(text)),
        MarkupNode::Element {
            tag,
            attrs,
            children,
        } => {
            push_open_tag(
                out,
                tag,
                attrs.iter().map(|(name, value)| (name.as_str(), value.as_str())),
            );
            if is_void_element(tag) {
                return;
            }
            for child in children {
                write_markup(child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{markup_to_html, outer_html};
    use crate::core::document::Document;
    use crate::core::markup::MarkupNode;

    #[test]
    fn document_serializes_with_escaping() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        doc.set_attr(node, "title", "a \"quoted\" <value>");
        doc.set_text(node, "1 < 2 & 3");
        assert_eq!(
            outer_html(&doc, node),
            "<div title=\"a &quot;quoted&quot; &lt;value&gt;\">1 &lt; 2 &amp; 3</div>"
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let html = markup_to_html(&[MarkupNode::element(
            "p",
            [],
            vec![MarkupNode::text("a"), MarkupNode::element("br", [], vec![]), MarkupNode::text("b")],
        )]);
        assert_eq!(html, "<p>a<br>b</p>");
    }
}
