//! Engine: the single entry point that turns events into document mutations.
//!
//! Invariant: every document mutation goes through one of the three region owners. The
//! engine only routes events and boundary operations to them.

use crate::config::EngineConfig;
use crate::core::document::{Document, NodeId};
use crate::core::event::{decode_lines, Event};
use crate::core::region::{RegionController, RegionName, RegionRegistry};
use crate::core::tags::{GroupTag, SlotTag};
use crate::error::EngineError;
use crate::render::{MarkdownRenderer, Renderer};
use crate::runtime::activity;
use crate::runtime::streaming::StreamingAccumulator;
use crate::runtime::writer::{ContentWriter, Payload};
use crate::widgets::{AppletPanel, ContextFooter, ContextUsage, RegionSnapshot, Transcript};

/// Outcome counts for a batch of events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandleReport {
    pub handled: usize,
    pub failed: usize,
    pub decode_errors: usize,
}

impl HandleReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.decode_errors == 0
    }
}

pub struct Engine<R: Renderer = MarkdownRenderer> {
    pub(super) doc: Document,
    pub(super) registry: RegionRegistry,
    pub(super) transcript: Transcript,
    pub(super) footer: ContextFooter,
    pub(super) applets: AppletPanel,
    pub(super) streams: StreamingAccumulator,
    pub(super) writer: ContentWriter<R>,
    pub(super) config: EngineConfig,
    pub(super) session_id: Option<String>,
    pub(super) replaying: bool,
}

impl Default for Engine<MarkdownRenderer> {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine<MarkdownRenderer> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_renderer(config, MarkdownRenderer::new())
    }
}

impl<R: Renderer> Engine<R> {
    /// Builds the application shell and the region owners.
    pub fn with_renderer(config: EngineConfig, renderer: R) -> Self {
        let mut doc = Document::new();
        let registry = RegionRegistry::build(&mut doc);
        let transcript = Transcript::new(registry.root(RegionName::Transcript));
        let footer = ContextFooter::new(registry.root(RegionName::ContextFooter));
        let applets = AppletPanel::new(registry.root(RegionName::AppletPanel));
        let streams = StreamingAccumulator::new(config.stream_mode, config.batch_ms);
        let writer = ContentWriter::new(renderer, config.summary_width);
        Self {
            doc,
            registry,
            transcript,
            footer,
            applets,
            streams,
            writer,
            config,
            session_id: None,
            replaying: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn context_usage(&self) -> Option<&ContextUsage> {
        self.footer.usage()
    }

    pub fn applet_ids(&self) -> Vec<&str> {
        self.applets.applet_ids(&self.doc)
    }

    /// Applies one event. Live delivery and replay both come through here.
    pub fn handle(&mut self, event: &Event) -> Result<(), EngineError> {
        tracing::debug!(event = event.kind_name(), replaying = self.replaying, "handling event");
        match event {
            Event::SessionSwitch { session_id } => self.on_session_switch(session_id),
            Event::HistoryReplayStart { session_id } => self.on_history_replay_start(session_id.as_deref()),
            Event::HistoryReplayEnd { .. } => {
                self.on_history_replay_end();
            }
            Event::TurnStart { .. } => {
                self.transcript
                    .begin_turn(&mut self.doc, &mut self.streams, &self.writer);
            }
            Event::TurnEnd { .. } => {
                self.transcript
                    .end_turn(&mut self.doc, &mut self.streams, &self.writer);
            }
            Event::UserMessage { id, text } => {
                self.write_content(GroupTag::User, SlotTag::UserText, id.as_deref(), Payload::Text(text))?;
            }
            Event::Intent { text } => {
                self.write_content(GroupTag::Activity, SlotTag::Intent, None, Payload::Text(text))?;
            }
            Event::Reasoning { id, text } => {
                self.finalize_stream(GroupTag::Activity, SlotTag::Reasoning, id, Some(text));
            }
            Event::ReasoningDelta { id, delta } => {
                self.append_delta(GroupTag::Activity, SlotTag::Reasoning, id, delta);
            }
            Event::ToolStart {
                id,
                name,
                arguments,
            } => {
                let slot = self
                    .transcript
                    .keyed_slot(&mut self.doc, GroupTag::Activity, SlotTag::Tool, id);
                self.writer
                    .set_tool_started(&mut self.doc, slot, name, arguments.as_ref());
            }
            Event::ToolOutputDelta { id, delta } => {
                self.append_delta(GroupTag::Activity, SlotTag::Tool, id, delta);
            }
            Event::ToolEnd {
                id,
                output,
                is_error,
            } => {
                let slot = self.finalize_stream(GroupTag::Activity, SlotTag::Tool, id, output.as_deref());
                self.writer.set_tool_finished(&mut self.doc, slot, *is_error);
            }
            Event::Message { id, text } => {
                self.finalize_stream(GroupTag::Assistant, SlotTag::AssistantText, id, Some(text));
            }
            Event::MessageDelta { id, delta } => {
                self.append_delta(GroupTag::Assistant, SlotTag::AssistantText, id, delta);
            }
            Event::Embed { id, markup } => {
                self.write_content(GroupTag::Assistant, SlotTag::Embed, id.as_deref(), Payload::Markup(markup))?;
            }
            Event::Notice { text } => {
                self.write_content(GroupTag::System, SlotTag::Notice, None, Payload::Text(text))?;
            }
            Event::ContextUsage {
                used_tokens,
                max_tokens,
                model,
            } => {
                let usage = ContextUsage {
                    used_tokens: *used_tokens,
                    max_tokens: *max_tokens,
                    model: model.clone(),
                };
                self.footer.update(&mut self.doc, usage);
            }
            Event::AppletOpen { id, title, markup } => {
                self.applets.open(&mut self.doc, id, title, markup);
            }
            Event::AppletUpdate { id, markup } => {
                self.applets.update(&mut self.doc, id, markup);
            }
            Event::AppletClose { id } => {
                self.applets.close(&mut self.doc, id);
            }
        }
        Ok(())
    }

    /// Applies events in order; a failing event is logged and skipped.
    pub fn handle_all<'a, I>(&mut self, events: I) -> HandleReport
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut report = HandleReport::default();
        for event in events {
            match self.handle(event) {
                Ok(()) => report.handled += 1,
                Err(err) => {
                    tracing::warn!(event = event.kind_name(), error = %err, "event handling failed");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Decodes one JSON event per line and applies each as it is decoded.
    pub fn handle_json_lines(&mut self, input: &str) -> HandleReport {
        let mut report = HandleReport::default();
        for decoded in decode_lines(input) {
            let event = match decoded {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping undecodable event");
                    report.decode_errors += 1;
                    continue;
                }
            };
            match self.handle(&event) {
                Ok(()) => report.handled += 1,
                Err(err) => {
                    tracing::warn!(event = event.kind_name(), error = %err, "event handling failed");
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn write_content(
        &mut self,
        group: GroupTag,
        slot: SlotTag,
        key: Option<&str>,
        payload: Payload<'_>,
    ) -> Result<NodeId, EngineError> {
        let node = self.transcript.content_slot(&mut self.doc, group, slot, key);
        if self.streams.discard(node) {
            tracing::debug!(slot = ?node, "full write replaced an open stream");
        }
        self.writer.write(&mut self.doc, node, payload)?;
        Ok(node)
    }

    fn append_delta(&mut self, group: GroupTag, slot: SlotTag, key: &str, delta: &str) -> NodeId {
        let node = self.transcript.keyed_slot(&mut self.doc, group, slot, key);
        self.streams.on_delta(&mut self.doc, node, delta);
        node
    }

    fn finalize_stream(&mut self, group: GroupTag, slot: SlotTag, key: &str, final_text: Option<&str>) -> NodeId {
        let node = self.transcript.keyed_slot(&mut self.doc, group, slot, key);
        self.streams
            .finalize(&mut self.doc, &self.writer, node, final_text);
        node
    }

    /// Moves the scheduler clock; returns the number of batched renders that ran.
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        self.streams.advance(&mut self.doc, &self.writer, elapsed_ms)
    }

    /// Runs every pending batched render now.
    pub fn run_pending(&mut self) -> usize {
        self.streams.run_pending(&mut self.doc, &self.writer)
    }

    pub fn pending_renders(&self) -> usize {
        self.streams.pending_renders()
    }

    /// Flips a collapsible transcript slot in response to a user click.
    pub fn toggle_slot(&mut self, slot: NodeId) -> Result<bool, EngineError> {
        if !self.doc.is_attached(slot) {
            return Err(EngineError::Detached(slot));
        }
        if !self.belongs_to(slot, RegionName::Transcript) {
            return Err(EngineError::NotASlot(slot));
        }
        activity::toggle_slot(&mut self.doc, slot)
    }

    fn belongs_to(&self, node: NodeId, region: RegionName) -> bool {
        let root = self.registry.root(region);
        let mut current = self.doc.parent(node);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.doc.parent(id);
        }
        false
    }

    fn resolve_region(&self, name: &str) -> Result<Option<RegionName>, EngineError> {
        match name.parse::<RegionName>() {
            Ok(region) => Ok(Some(region)),
            Err(err) if self.config.strict_regions => Err(err),
            Err(err) => {
                tracing::error!(error = %err, "ignoring operation on undeclared region");
                Ok(None)
            }
        }
    }

    /// Read-only view of a region's owner.
    pub fn owner(&self, name: &str) -> Result<&dyn RegionController, EngineError> {
        let region = name.parse::<RegionName>()?;
        Ok(match region {
            RegionName::Transcript => &self.transcript,
            RegionName::ContextFooter => &self.footer,
            RegionName::AppletPanel => &self.applets,
        })
    }

    pub fn clear_region(&mut self, name: &str) -> Result<(), EngineError> {
        let Some(region) = self.resolve_region(name)? else {
            return Ok(());
        };
        self.clear(region);
        Ok(())
    }

    pub(super) fn clear(&mut self, region: RegionName) {
        if region == RegionName::Transcript {
            let cancelled = self.streams.reset();
            if cancelled > 0 {
                tracing::debug!(cancelled, "cancelled pending renders for cleared transcript");
            }
        }
        let doc = &mut self.doc;
        match region {
            RegionName::Transcript => self.transcript.clear(doc),
            RegionName::ContextFooter => self.footer.clear(doc),
            RegionName::AppletPanel => self.applets.clear(doc),
        }
    }

    pub fn set_region_visible(&mut self, name: &str, visible: bool) -> Result<(), EngineError> {
        let Some(region) = self.resolve_region(name)? else {
            return Ok(());
        };
        let doc = &mut self.doc;
        match region {
            RegionName::Transcript => self.transcript.set_visible(doc, visible),
            RegionName::ContextFooter => self.footer.set_visible(doc, visible),
            RegionName::AppletPanel => self.applets.set_visible(doc, visible),
        }
        Ok(())
    }

    pub fn region_root(&self, name: &str) -> Result<NodeId, EngineError> {
        self.registry.root_element(name)
    }

    pub fn region_html(&self, name: &str) -> Result<String, EngineError> {
        Ok(self.doc.inner_html(self.region_root(name)?))
    }

    /// Structural snapshot of the transcript region.
    pub fn snapshot(&self) -> RegionSnapshot {
        self.transcript.snapshot(&self.doc)
    }
}
