//! Engine error taxonomy.

use thiserror::Error;

use crate::core::document::NodeId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown region '{name}'")]
    UnknownRegion { name: String },

    #[error("no slot with key '{key}' in any open group")]
    SlotNotFound { key: String },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("node {0:?} is not a transcript slot")]
    NotASlot(NodeId),

    #[error("node {0:?} is no longer attached to the document")]
    Detached(NodeId),

    #[error("failed to decode event on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineError {
    #[must_use]
    pub fn unknown_region(name: impl Into<String>) -> Self {
        Self::UnknownRegion { name: name.into() }
    }

    #[must_use]
    pub fn slot_not_found(key: impl Into<String>) -> Self {
        Self::SlotNotFound { key: key.into() }
    }

    #[must_use]
    pub fn decode(line: usize, source: serde_json::Error) -> Self {
        Self::Decode { line, source }
    }
}

/// Failure reported by a [`crate::render::Renderer`].
///
/// The default renderer never returns this; the content writer still handles it for
/// renderers that break the contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("renderer rejected input: {0}")]
    Rejected(String),

    #[error("renderer panicked: {0}")]
    Panicked(String),
}
