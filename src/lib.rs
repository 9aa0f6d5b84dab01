//! Incremental reconciliation engine for agent chat transcripts.
//!
//! Invariant: single mutation gate. Only the region owners in [`widgets`] change the
//! [`Document`]; hosts drive the [`Engine`] with events and read the tree back.
//!
//! # Public API Overview
//! - Feed decoded [`Event`]s (or JSON lines) to an [`Engine`]; live delivery and history
//!   replay share one code path.
//! - Advance the engine's virtual clock to run batched stream renders.
//! - Inspect regions through [`Engine::region_html`], [`Engine::snapshot`], and the
//!   read-only [`Document`] API.
//! - Plug in a custom markdown pipeline by implementing [`Renderer`].

#![allow(clippy::type_complexity)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Engine configuration.
pub use crate::config::{EngineConfig, StreamRenderMode};
/// Error taxonomy.
pub use crate::error::{EngineError, RenderError};

/// Document model and event types.
pub use crate::core::document::{Document, NodeId, NodeKind};
pub use crate::core::event::{decode_lines, Event, EventCategory};
pub use crate::core::markup::MarkupNode;
pub use crate::core::region::{RegionController, RegionName};
pub use crate::core::tags::{GroupTag, SlotTag};

/// Rendering boundary and the default markdown renderer.
pub use crate::render::{MarkdownRenderer, Renderer, SafeHtml};

/// Runtime entry points.
pub use crate::runtime::{Engine, HandleReport};

/// Region owners and snapshots.
pub use crate::widgets::{
    AppletPanel, ContextFooter, ContextUsage, GroupSnapshot, RegionSnapshot, SlotSnapshot,
    Transcript, UsageLevel,
};

/// Width-aware truncation helper used for tool summaries.
pub use crate::core::text::truncate_to_width;
