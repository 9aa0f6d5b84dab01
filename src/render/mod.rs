//! Rendering: the render-function boundary, sanitization, and HTML serialization.

pub mod html;
pub mod markdown;
pub mod sanitize;

pub use markdown::MarkdownRenderer;

use crate::core::markup::MarkupNode;
use crate::error::RenderError;

/// Sanitized markup, safe to attach under any slot.
///
/// Only [`sanitize::sanitize`] and [`SafeHtml::escaped_text`] construct values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeHtml {
    nodes: Vec<MarkupNode>,
}

impl SafeHtml {
    pub(crate) fn from_sanitized(nodes: Vec<MarkupNode>) -> Self {
        Self { nodes }
    }

    /// Plain text fallback; the text is never interpreted as markup.
    pub fn escaped_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            nodes: vec![MarkupNode::text(text)],
        }
    }

    pub fn nodes(&self) -> &[MarkupNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_html(&self) -> String {
        html::markup_to_html(&self.nodes)
    }

    pub fn plain_text(&self) -> String {
        self.nodes.iter().map(MarkupNode::plain_text).collect()
    }
}

/// Markdown-to-safe-markup function used by the content writer.
///
/// Contract: pure (no document access, same input gives equivalent output), and the
/// returned markup must already be sanitized. Implementations should be total; the writer
/// still contains errors and panics by falling back to plain text.
pub trait Renderer {
    fn render(&self, raw: &str) -> Result<SafeHtml, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> Result<SafeHtml, RenderError>,
{
    fn render(&self, raw: &str) -> Result<SafeHtml, RenderError> {
        self(raw)
    }
}
