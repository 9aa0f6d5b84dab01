//! Event stream model.
//!
//! Events arrive as `{ "type": ..., "data": { ... } }` objects and decode into the closed
//! [`Event`] enum. The engine handles them with an exhaustive `match`; there is no runtime
//! lookup by type string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::markup::MarkupNode;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    SessionSwitch {
        session_id: String,
    },
    HistoryReplayStart {
        #[serde(default)]
        session_id: Option<String>,
    },
    HistoryReplayEnd {
        #[serde(default)]
        session_id: Option<String>,
    },
    TurnStart {
        #[serde(default)]
        turn_id: Option<String>,
    },
    TurnEnd {
        #[serde(default)]
        turn_id: Option<String>,
    },
    UserMessage {
        #[serde(default)]
        id: Option<String>,
        text: String,
    },
    Intent {
        text: String,
    },
    Reasoning {
        id: String,
        text: String,
    },
    ReasoningDelta {
        id: String,
        delta: String,
    },
    ToolStart {
        id: String,
        name: String,
        #[serde(default)]
        arguments: Option<Value>,
    },
    ToolOutputDelta {
        id: String,
        delta: String,
    },
    ToolEnd {
        id: String,
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        is_error: bool,
    },
    Message {
        id: String,
        text: String,
    },
    MessageDelta {
        id: String,
        delta: String,
    },
    Embed {
        #[serde(default)]
        id: Option<String>,
        markup: Vec<MarkupNode>,
    },
    Notice {
        text: String,
    },
    ContextUsage {
        used_tokens: u64,
        max_tokens: u64,
        #[serde(default)]
        model: Option<String>,
    },
    AppletOpen {
        id: String,
        title: String,
        #[serde(default)]
        markup: Vec<MarkupNode>,
    },
    AppletUpdate {
        id: String,
        markup: Vec<MarkupNode>,
    },
    AppletClose {
        id: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventCategory {
    /// Session, replay, and turn boundaries.
    Boundary,
    /// Complete content for a transcript slot.
    Content,
    /// Incremental content for a streaming slot.
    Delta,
    /// Content for the context footer or applet panel.
    Auxiliary,
}

impl Event {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::SessionSwitch { .. } => "session_switch",
            Self::HistoryReplayStart { .. } => "history_replay_start",
            Self::HistoryReplayEnd { .. } => "history_replay_end",
            Self::TurnStart { .. } => "turn_start",
            Self::TurnEnd { .. } => "turn_end",
            Self::UserMessage { .. } => "user_message",
            Self::Intent { .. } => "intent",
            Self::Reasoning { .. } => "reasoning",
            Self::ReasoningDelta { .. } => "reasoning_delta",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolOutputDelta { .. } => "tool_output_delta",
            Self::ToolEnd { .. } => "tool_end",
            Self::Message { .. } => "message",
            Self::MessageDelta { .. } => "message_delta",
            Self::Embed { .. } => "embed",
            Self::Notice { .. } => "notice",
            Self::ContextUsage { .. } => "context_usage",
            Self::AppletOpen { .. } => "applet_open",
            Self::AppletUpdate { .. } => "applet_update",
            Self::AppletClose { .. } => "applet_close",
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            Self::SessionSwitch { .. }
            | Self::HistoryReplayStart { .. }
            | Self::HistoryReplayEnd { .. }
            | Self::TurnStart { .. }
            | Self::TurnEnd { .. } => EventCategory::Boundary,
            Self::UserMessage { .. }
            | Self::Intent { .. }
            | Self::Reasoning { .. }
            | Self::ToolStart { .. }
            | Self::ToolEnd { .. }
            | Self::Message { .. }
            | Self::Embed { .. }
            | Self::Notice { .. } => EventCategory::Content,
            Self::ReasoningDelta { .. } | Self::ToolOutputDelta { .. } | Self::MessageDelta { .. } => {
                EventCategory::Delta
            }
            Self::ContextUsage { .. }
            | Self::AppletOpen { .. }
            | Self::AppletUpdate { .. }
            | Self::AppletClose { .. } => EventCategory::Auxiliary,
        }
    }

    /// Streaming signals that are never written to replay history.
    pub fn is_ephemeral(&self) -> bool {
        self.category() == EventCategory::Delta
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Decodes one event per non-blank line; line numbers are 1-based.
pub fn decode_lines(input: &str) -> impl Iterator<Item = Result<Event, EngineError>> + '_ {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| Event::decode(line).map_err(|err| EngineError::decode(index + 1, err)))
}

#[cfg(test)]
mod tests {
    use super::{decode_lines, Event, EventCategory};
    use crate::error::EngineError;

    #[test]
    fn wire_shape_decodes_into_variants() {
        let event = Event::decode(
            r#"{"type":"tool_start","data":{"id":"t1","name":"grep","arguments":{"pattern":"fn main"}}}"#,
        )
        .expect("tool_start decodes");
        match event {
            Event::ToolStart {
                id,
                name,
                arguments,
            } => {
                assert_eq!(id, "t1");
                assert_eq!(name, "grep");
                assert_eq!(
                    arguments.and_then(|value| value.get("pattern").cloned()),
                    Some(serde_json::json!("fn main"))
                );
            }
            other => panic!("unexpected event {other:?}"),
        }

        let boundary = Event::decode(r#"{"type":"turn_start","data":{}}"#).expect("turn_start decodes");
        assert_eq!(boundary, Event::TurnStart { turn_id: None });
        assert_eq!(boundary.category(), EventCategory::Boundary);
    }

    #[test]
    fn deltas_are_ephemeral() {
        let delta = Event::MessageDelta {
            id: "m1".to_string(),
            delta: "hi".to_string(),
        };
        let last = Event::Message {
            id: "m1".to_string(),
            text: "hi".to_string(),
        };
        assert!(delta.is_ephemeral());
        assert!(!last.is_ephemeral());
    }

    #[test]
    fn decode_lines_reports_line_numbers_and_skips_blanks() {
        let input = "{\"type\":\"notice\",\"data\":{\"text\":\"ok\"}}\n\n{\"type\":\"bogus\",\"data\":{}}\n";
        let results: Vec<_> = decode_lines(input).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EngineError::Decode { line: 3, .. })));
    }
}
