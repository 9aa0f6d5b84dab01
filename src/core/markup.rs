//! Structured markup fragments.
//!
//! Markup is what renderers produce and what the backend sends for embeds and applets.
//! It is plain data; nothing here is trusted until it has passed through
//! [`crate::render::sanitize::sanitize`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkupNode {
    Element {
        tag: String,
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<MarkupNode>,
    },
    Text {
        text: String,
    },
}

impl MarkupNode {
    pub fn element<'a>(
        tag: &str,
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
        children: Vec<MarkupNode>,
    ) -> Self {
        Self::Element {
            tag: tag.to_string(),
            attrs: attrs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag.as_str()),
            Self::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[MarkupNode] {
        match self {
            Self::Element { children, .. } => children,
            Self::Text { .. } => &[],
        }
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        push_plain_text(self, &mut out);
        out
    }
}

fn push_plain_text(node: &MarkupNode, out: &mut String) {
    match node {
        MarkupNode::Text { text } => out.push_str(text),
        MarkupNode::Element { children, .. } => {
            for child in children {
                push_plain_text(child, out);
            }
        }
    }
}
