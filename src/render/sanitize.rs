//! Markup sanitizer.
//!
//! Guarantees for everything that leaves [`sanitize`]:
//! - no script-capable elements and no event-handler attributes;
//! - no `id`, `name`, `style`, or `data-*` attributes, so untrusted content can never
//!   satisfy a landmark, group, or slot lookup;
//! - no engine-reserved class names;
//! - `href`/`src` limited to http(s), mailto, and relative URLs.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::core::markup::MarkupNode;
use crate::core::tags::RESERVED_CLASSES;
use crate::render::SafeHtml;

/// Elements removed together with their content.
static DROPPED_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "applet", "base", "button", "embed", "form", "frame", "frameset", "iframe", "link", "math",
        "meta", "noscript", "object", "script", "select", "style", "svg", "template", "textarea",
        "title",
    ]
    .into_iter()
    .collect()
});

static ALLOWED_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "abbr", "b", "blockquote", "br", "caption", "code", "dd", "del", "details", "div",
        "dl", "dt", "em", "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i",
        "img", "input", "kbd", "li", "mark", "ol", "p", "pre", "s", "small", "span", "strong",
        "sub", "summary", "sup", "table", "tbody", "td", "th", "thead", "tr", "u", "ul",
    ]
    .into_iter()
    .collect()
});

const GLOBAL_ATTRS: &[&str] = &["class", "title", "lang", "dir"];

static TAG_ATTRS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    map.insert("a", &["href"]);
    map.insert("img", &["src", "alt", "width", "height"]);
    map.insert("input", &["type", "checked", "disabled"]);
    map.insert("ol", &["start"]);
    map.insert("td", &["align", "colspan", "rowspan"]);
    map.insert("th", &["align", "colspan", "rowspan"]);
    map.insert("details", &["open"]);
    map
});

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

pub fn sanitize(nodes: &[MarkupNode]) -> SafeHtml {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        sanitize_node(node, &mut out);
    }
    SafeHtml::from_sanitized(out)
}

fn sanitize_node(node: &MarkupNode, out: &mut Vec<MarkupNode>) {
    let (tag, attrs, children) = match node {
        MarkupNode::Text { text } => {
            out.push(MarkupNode::text(text.clone()));
            return;
        }
        MarkupNode::Element {
            tag,
            attrs,
            children,
        } => (tag.to_ascii_lowercase(), attrs, children),
    };

    if DROPPED_TAGS.contains(tag.as_str()) {
        return;
    }

    let mut clean_children = Vec::with_capacity(children.len());
    for child in children {
        sanitize_node(child, &mut clean_children);
    }

    if !ALLOWED_TAGS.contains(tag.as_str()) {
        out.extend(clean_children);
        return;
    }

    let Some(clean_attrs) = sanitize_attrs(&tag, attrs) else {
        return;
    };

    out.push(MarkupNode::Element {
        tag,
        attrs: clean_attrs,
        children: clean_children,
    });
}

/// Returns `None` when the element itself must be dropped.
fn sanitize_attrs(tag: &str, attrs: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    let per_tag = TAG_ATTRS.get(tag).copied().unwrap_or(&[]);
    let mut clean = BTreeMap::new();

    for (name, value) in attrs {
        let name = name.to_ascii_lowercase();
        if !GLOBAL_ATTRS.contains(&name.as_str()) && !per_tag.contains(&name.as_str()) {
            continue;
        }
        match name.as_str() {
            "class" => {
                let classes = filter_classes(value);
                if !classes.is_empty() {
                    clean.insert(name, classes);
                }
            }
            "href" | "src" => {
                if is_safe_url(value) {
                    clean.insert(name, value.trim().to_string());
                }
            }
            _ => {
                clean.insert(name, value.clone());
            }
        }
    }

    if tag == "input" {
        if clean.get("type").map(String::as_str) != Some("checkbox") {
            return None;
        }
        clean.insert("disabled".to_string(), String::new());
    }
    if tag == "a" && clean.contains_key("href") {
        clean.insert("rel".to_string(), "noopener noreferrer".to_string());
    }

    Some(clean)
}

fn filter_classes(value: &str) -> String {
    value
        .split_ascii_whitespace()
        .filter(|token| !RESERVED_CLASSES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_safe_url(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|ch| !ch.is_ascii_control() && !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let scheme_end = normalized.find(':');
    let path_start = normalized.find(&['/', '?', '#'][..]);
    match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => true,
        (Some(colon), _) => SAFE_SCHEMES.contains(&&normalized[..colon]),
        (None, _) => true,
    }
}
