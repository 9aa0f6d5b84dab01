//! Classification tags, content tags, and the attribute vocabulary the engine writes.
//!
//! Every `data-*` name below is engine-owned. The sanitizer strips the whole `data-*`
//! class from untrusted content, so none of these can appear inside rendered output.

pub const ATTR_GROUP: &str = "data-group";
pub const ATTR_GROUP_STATE: &str = "data-state";
pub const ATTR_SLOT: &str = "data-slot";
pub const ATTR_KEY: &str = "data-key";
pub const ATTR_COLLAPSED: &str = "data-collapsed";
pub const ATTR_USER_TOGGLED: &str = "data-user-toggled";
pub const ATTR_STREAMING: &str = "data-streaming";
pub const ATTR_STREAM_TAIL: &str = "data-stream-tail";
/// Set once a streaming slot has received its final text for the current turn.
pub const ATTR_FINAL: &str = "data-final";
pub const ATTR_TOOL_NAME: &str = "data-tool-name";
pub const ATTR_SUMMARY: &str = "data-summary";
pub const ATTR_STATUS: &str = "data-status";
pub const ATTR_LANDMARK: &str = "data-landmark";
pub const ATTR_APPLET: &str = "data-applet";

pub const CLASS_GROUP: &str = "group";
pub const CLASS_SLOT: &str = "slot";
pub const CLASS_RENDERED: &str = "rendered";
pub const CLASS_STREAM_TAIL: &str = "stream-tail";
pub const CLASS_THINKING: &str = "thinking";
pub const CLASS_APPLET: &str = "applet";
pub const CLASS_CONTEXT_USAGE: &str = "context-usage";

/// Class names styled by the application chrome; stripped from untrusted markup.
pub const RESERVED_CLASSES: &[&str] = &[
    CLASS_GROUP,
    CLASS_SLOT,
    CLASS_RENDERED,
    CLASS_STREAM_TAIL,
    CLASS_THINKING,
    CLASS_APPLET,
    "applet-title",
    "applet-body",
    CLASS_CONTEXT_USAGE,
];

pub const STATE_OPEN: &str = "open";
pub const STATE_FINALIZED: &str = "finalized";

pub const THINKING_LABEL: &str = "Thinking…";

pub const STATUS_RUNNING: &str = "running";
pub const STATUS_DONE: &str = "done";
pub const STATUS_ERROR: &str = "error";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupTag {
    User,
    Activity,
    Assistant,
    System,
}

impl GroupTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Activity => "activity",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "activity" => Some(Self::Activity),
            "assistant" => Some(Self::Assistant),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// How the content writer fills a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteStrategy {
    PlainText,
    Rendered,
    Embed,
    Placeholder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotTag {
    Thinking,
    UserText,
    Intent,
    Reasoning,
    Tool,
    AssistantText,
    Embed,
    Notice,
}

impl SlotTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::UserText => "user_text",
            Self::Intent => "intent",
            Self::Reasoning => "reasoning",
            Self::Tool => "tool",
            Self::AssistantText => "assistant_text",
            Self::Embed => "embed",
            Self::Notice => "notice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "thinking" => Some(Self::Thinking),
            "user_text" => Some(Self::UserText),
            "intent" => Some(Self::Intent),
            "reasoning" => Some(Self::Reasoning),
            "tool" => Some(Self::Tool),
            "assistant_text" => Some(Self::AssistantText),
            "embed" => Some(Self::Embed),
            "notice" => Some(Self::Notice),
            _ => None,
        }
    }

    pub const fn write_strategy(self) -> WriteStrategy {
        match self {
            Self::Thinking => WriteStrategy::Placeholder,
            Self::Intent | Self::Notice => WriteStrategy::PlainText,
            Self::UserText | Self::Reasoning | Self::Tool | Self::AssistantText => {
                WriteStrategy::Rendered
            }
            Self::Embed => WriteStrategy::Embed,
        }
    }

    /// Unkeyed events with these tags always add a slot; every other tag rewrites a
    /// matching last slot in place.
    pub const fn appends_unkeyed(self) -> bool {
        matches!(self, Self::UserText | Self::Embed | Self::Notice)
    }

    pub const fn is_collapsible(self) -> bool {
        matches!(self, Self::Reasoning | Self::Tool)
    }

    /// Visual state applied once, when the slot is created.
    pub const fn collapsed_on_create(self) -> bool {
        matches!(self, Self::Tool)
    }

    /// Visual state applied at turn end unless the user toggled the slot.
    pub const fn collapsed_on_finalize(self) -> bool {
        matches!(self, Self::Reasoning | Self::Tool)
    }
}
