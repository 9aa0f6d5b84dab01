//! Context footer region owner: token usage for the active session.

use crate::core::document::{Document, NodeId};
use crate::core::region::{RegionController, RegionName};
use crate::core::tags::CLASS_CONTEXT_USAGE;
use crate::core::text::truncate_to_width;

const ATTR_USAGE_LEVEL: &str = "data-usage-level";
const MODEL_LABEL_WIDTH: usize = 32;
const WARN_PERCENT: u64 = 80;
const CRITICAL_PERCENT: u64 = 95;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsageLevel {
    Ok,
    Warn,
    Critical,
}

impl UsageLevel {
    pub fn from_percent(percent: u64) -> Self {
        if percent >= CRITICAL_PERCENT {
            Self::Critical
        } else if percent >= WARN_PERCENT {
            Self::Warn
        } else {
            Self::Ok
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextUsage {
    pub used_tokens: u64,
    pub max_tokens: u64,
    pub model: Option<String>,
}

impl ContextUsage {
    /// Whole percent of the window in use; an unknown window reads as 0.
    pub fn percent(&self) -> u64 {
        if self.max_tokens == 0 {
            return 0;
        }
        self.used_tokens.saturating_mul(100) / self.max_tokens
    }

    pub fn level(&self) -> UsageLevel {
        UsageLevel::from_percent(self.percent())
    }

    pub fn label(&self) -> String {
        let counts = format!(
            "{} / {} tokens ({}%)",
            format_tokens(self.used_tokens),
            format_tokens(self.max_tokens),
            self.percent()
        );
        match self.model.as_deref().map(str::trim).filter(|model| !model.is_empty()) {
            Some(model) => format!("{} · {counts}", truncate_to_width(model, MODEL_LABEL_WIDTH)),
            None => counts,
        }
    }
}

/// Compact token count: `950`, `12.5k`, `200k`, `1.2M`.
pub fn format_tokens(tokens: u64) -> String {
    fn scaled(value: u64, unit: u64, suffix: &str) -> String {
        let tenths = value.saturating_mul(10) / unit;
        if tenths % 10 == 0 {
            format!("{}{suffix}", tenths / 10)
        } else {
            format!("{}.{}{suffix}", tenths / 10, tenths % 10)
        }
    }

    match tokens {
        0..=999 => tokens.to_string(),
        1_000..=999_999 => scaled(tokens, 1_000, "k"),
        _ => scaled(tokens, 1_000_000, "M"),
    }
}

#[derive(Debug)]
pub struct ContextFooter {
    root: NodeId,
    usage: Option<ContextUsage>,
}

impl ContextFooter {
    pub(crate) fn new(root: NodeId) -> Self {
        Self { root, usage: None }
    }

    pub fn usage(&self) -> Option<&ContextUsage> {
        self.usage.as_ref()
    }

    pub(crate) fn update(&mut self, doc: &mut Document, usage: ContextUsage) {
        if self.usage.as_ref() == Some(&usage) {
            return;
        }
        doc.clear_children(self.root);
        let meter = doc.create_element("div");
        doc.set_attr(meter, "class", CLASS_CONTEXT_USAGE);
        doc.set_attr(meter, ATTR_USAGE_LEVEL, usage.level().as_str());
        doc.set_text(meter, &usage.label());
        doc.append_child(self.root, meter);
        self.usage = Some(usage);
    }
}

impl RegionController for ContextFooter {
    fn region(&self) -> RegionName {
        RegionName::ContextFooter
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn clear(&mut self, doc: &mut Document) {
        doc.clear_children(self.root);
        self.usage = None;
    }
}
