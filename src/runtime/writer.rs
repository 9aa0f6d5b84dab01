//! Content writer.
//!
//! Fills a slot according to its content tag. Every full write replaces the slot's
//! children wholesale; collapse and toggle attributes on the slot itself are left alone.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

use crate::core::document::{Document, NodeId};
use crate::core::markup::MarkupNode;
use crate::core::tags::{
    WriteStrategy, ATTR_STATUS, ATTR_SUMMARY, ATTR_TOOL_NAME, CLASS_RENDERED, CLASS_THINKING,
    STATUS_DONE, STATUS_ERROR, STATUS_RUNNING, THINKING_LABEL,
};
use crate::core::text::{single_line, truncate_to_width};
use crate::error::{EngineError, RenderError};
use crate::render::sanitize::sanitize;
use crate::render::{Renderer, SafeHtml};
use crate::runtime::inserter::slot_tag;

/// Argument fields that best describe a tool call, in preference order.
const SUMMARY_FIELDS: &[&str] = &[
    "command", "cmd", "path", "file_path", "pattern", "query", "url", "name",
];

#[derive(Clone, Copy, Debug)]
pub enum Payload<'a> {
    /// Raw text: markdown for rendered tags, verbatim for plain-text tags.
    Text(&'a str),
    /// Backend-supplied markup; always sanitized before it is attached.
    Markup(&'a [MarkupNode]),
}

impl Payload<'_> {
    fn plain_text(&self) -> String {
        match self {
            Payload::Text(text) => (*text).to_string(),
            Payload::Markup(nodes) => nodes.iter().map(MarkupNode::plain_text).collect(),
        }
    }
}

#[derive(Debug)]
pub struct ContentWriter<R> {
    renderer: R,
    summary_width: usize,
}

impl<R: Renderer> ContentWriter<R> {
    pub fn new(renderer: R, summary_width: usize) -> Self {
        Self {
            renderer,
            summary_width,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Writes `payload` into `slot` using the strategy of the slot's content tag.
    pub fn write(&self, doc: &mut Document, slot: NodeId, payload: Payload<'_>) -> Result<(), EngineError> {
        let tag = slot_tag(doc, slot).ok_or(EngineError::NotASlot(slot))?;
        if !doc.is_attached(slot) {
            return Err(EngineError::Detached(slot));
        }

        match tag.write_strategy() {
            WriteStrategy::PlainText => self.write_plain(doc, slot, &payload.plain_text()),
            WriteStrategy::Rendered => match payload {
                Payload::Text(raw) => self.write_rendered(doc, slot, raw),
                Payload::Markup(nodes) => self.write_safe(doc, slot, &sanitize(nodes)),
            },
            WriteStrategy::Embed => {
                let safe = match payload {
                    Payload::Markup(nodes) => sanitize(nodes),
                    Payload::Text(text) => SafeHtml::escaped_text(text),
                };
                self.write_safe(doc, slot, &safe);
            }
            WriteStrategy::Placeholder => self.write_placeholder(doc, slot),
        }
        Ok(())
    }

    /// Calls the renderer, turning both errors and panics into [`RenderError`].
    pub fn render(&self, raw: &str) -> Result<SafeHtml, RenderError> {
        match catch_unwind(AssertUnwindSafe(|| self.renderer.render(raw))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|message| (*message).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                Err(RenderError::Panicked(message))
            }
        }
    }

    pub(crate) fn write_rendered(&self, doc: &mut Document, slot: NodeId, raw: &str) {
        match self.render(raw) {
            Ok(safe) => self.write_safe(doc, slot, &safe),
            Err(err) => {
                tracing::warn!(slot = ?slot, error = %err, "render failed; writing plain text");
                self.write_plain(doc, slot, raw);
            }
        }
    }

    pub(crate) fn write_safe(&self, doc: &mut Document, slot: NodeId, safe: &SafeHtml) {
        doc.clear_children(slot);
        doc.append_markup(slot, safe.nodes());
        doc.add_class(slot, CLASS_RENDERED);
    }

    pub(crate) fn write_plain(&self, doc: &mut Document, slot: NodeId, text: &str) {
        doc.set_text(slot, text);
        doc.remove_class(slot, CLASS_RENDERED);
    }

    pub(crate) fn write_placeholder(&self, doc: &mut Document, slot: NodeId) {
        doc.add_class(slot, CLASS_THINKING);
        doc.set_text(slot, THINKING_LABEL);
    }

    pub(crate) fn set_tool_started(&self, doc: &mut Document, slot: NodeId, name: &str, arguments: Option<&Value>) {
        doc.set_attr(slot, ATTR_TOOL_NAME, name);
        match arguments.and_then(summarize_arguments) {
            Some(summary) => {
                let summary = truncate_to_width(&single_line(&summary), self.summary_width);
                doc.set_attr(slot, ATTR_SUMMARY, &summary);
            }
            None => {
                doc.remove_attr(slot, ATTR_SUMMARY);
            }
        }
        doc.set_attr(slot, ATTR_STATUS, STATUS_RUNNING);
    }

    pub(crate) fn set_tool_finished(&self, doc: &mut Document, slot: NodeId, is_error: bool) {
        let status = if is_error { STATUS_ERROR } else { STATUS_DONE };
        doc.set_attr(slot, ATTR_STATUS, status);
    }
}

/// One-line description of a tool call's arguments.
pub fn summarize_arguments(arguments: &Value) -> Option<String> {
    let summary = match arguments {
        Value::Null => return None,
        Value::Object(map) if map.is_empty() => return None,
        Value::Object(map) => SUMMARY_FIELDS
            .iter()
            .find_map(|field| map.get(*field))
            .map(value_text)
            .unwrap_or_else(|| arguments.to_string()),
        other => value_text(other),
    };
    let summary = summary.trim().to_string();
    (!summary.is_empty()).then_some(summary)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}
