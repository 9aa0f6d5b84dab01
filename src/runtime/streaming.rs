//! Streaming accumulator.
//!
//! Each streaming slot owns one buffer and at most one pending batched render. Deltas
//! only append and schedule; the document is touched when the batch fires or the slot
//! is finalized. A buffer never outlives its slot: a batch that finds its slot detached
//! drops the buffer without writing.

use std::collections::HashMap;

use crate::config::StreamRenderMode;
use crate::core::document::{Document, NodeId};
use crate::core::tags::{ATTR_FINAL, ATTR_STREAMING, ATTR_STREAM_TAIL, CLASS_STREAM_TAIL};
use crate::render::Renderer;
use crate::runtime::scheduler::{ScheduledTask, Scheduler, TimerHandle};
use crate::runtime::writer::{ContentWriter, Payload};

#[derive(Debug, Default)]
struct StreamBuffer {
    raw: String,
    /// Byte offset in `raw` where fragments not yet shown as committed text begin.
    tail_start: usize,
    pending: Option<TimerHandle>,
}

#[derive(Debug)]
pub struct StreamingAccumulator {
    buffers: HashMap<NodeId, StreamBuffer>,
    scheduler: Scheduler,
    mode: StreamRenderMode,
    batch_ms: u64,
}

impl StreamingAccumulator {
    pub fn new(mode: StreamRenderMode, batch_ms: u64) -> Self {
        Self {
            buffers: HashMap::new(),
            scheduler: Scheduler::new(),
            mode,
            batch_ms: batch_ms.max(1),
        }
    }

    pub fn mode(&self) -> StreamRenderMode {
        self.mode
    }

    pub fn has_buffer(&self, slot: NodeId) -> bool {
        self.buffers.contains_key(&slot)
    }

    pub fn pending_renders(&self) -> usize {
        self.scheduler.pending_len()
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Appends `delta` to the slot's buffer and schedules a batched render if none is
    /// pending. Deltas for a slot that already holds its final text are dropped.
    pub fn on_delta(&mut self, doc: &mut Document, slot: NodeId, delta: &str) {
        if delta.is_empty() {
            return;
        }
        if doc.has_attr(slot, ATTR_FINAL) {
            tracing::debug!(slot = ?slot, "ignoring delta for a finalized slot");
            return;
        }
        let buffer = self.buffers.entry(slot).or_default();
        buffer.raw.push_str(delta);
        if buffer.pending.is_none() {
            buffer.pending = Some(
                self.scheduler
                    .schedule(self.batch_ms, ScheduledTask::FlushStream(slot)),
            );
        }
        doc.set_attr(slot, ATTR_STREAMING, "true");
    }

    /// Batched render of one slot.
    pub fn flush<R: Renderer>(&mut self, doc: &mut Document, writer: &ContentWriter<R>, slot: NodeId) {
        let Some(buffer) = self.buffers.get_mut(&slot) else {
            return;
        };
        if let Some(handle) = buffer.pending.take() {
            self.scheduler.cancel(handle);
        }
        if !doc.is_attached(slot) {
            tracing::debug!(slot = ?slot, "dropping stream buffer for detached slot");
            self.buffers.remove(&slot);
            return;
        }

        remove_tail_marker(doc, slot);
        match self.mode {
            StreamRenderMode::Tail => {
                let committed = &buffer.raw[..buffer.tail_start];
                let tail = &buffer.raw[buffer.tail_start..];
                writer.write_plain(doc, slot, committed);
                if !tail.is_empty() {
                    let marker = doc.create_element("span");
                    doc.set_attr(marker, "class", CLASS_STREAM_TAIL);
                    doc.set_attr(marker, ATTR_STREAM_TAIL, "");
                    doc.set_text(marker, tail);
                    doc.append_child(slot, marker);
                }
                buffer.tail_start = buffer.raw.len();
            }
            StreamRenderMode::Markdown => {
                if let Err(err) = writer.write(doc, slot, Payload::Text(&buffer.raw)) {
                    tracing::debug!(slot = ?slot, error = %err, "batched render skipped");
                }
            }
        }
    }

    /// Cancels the pending render, removes the tail marker, and renders once with the
    /// authoritative text if given, else the accumulated text. Drops the buffer.
    pub fn finalize<R: Renderer>(
        &mut self,
        doc: &mut Document,
        writer: &ContentWriter<R>,
        slot: NodeId,
        final_text: Option<&str>,
    ) {
        let buffer = self.discard_buffer(slot);
        if !doc.is_attached(slot) {
            return;
        }
        remove_tail_marker(doc, slot);
        doc.remove_attr(slot, ATTR_STREAMING);
        doc.set_attr(slot, ATTR_FINAL, "true");

        let text = final_text.or(buffer.as_ref().map(|buffer| buffer.raw.as_str()));
        if let Some(text) = text {
            if let Err(err) = writer.write(doc, slot, Payload::Text(text)) {
                tracing::debug!(slot = ?slot, error = %err, "final render skipped");
            }
        }
    }

    /// Drops the slot's buffer and pending render without touching the document.
    pub fn discard(&mut self, slot: NodeId) -> bool {
        self.discard_buffer(slot).is_some()
    }

    fn discard_buffer(&mut self, slot: NodeId) -> Option<StreamBuffer> {
        let buffer = self.buffers.remove(&slot)?;
        if let Some(handle) = buffer.pending {
            self.scheduler.cancel(handle);
        }
        Some(buffer)
    }

    /// Drops every buffer and cancels every pending render; returns the cancelled count.
    pub fn reset(&mut self) -> usize {
        self.buffers.clear();
        self.scheduler.cancel_all()
    }

    /// Moves the clock and runs the batched renders that became due.
    pub fn advance<R: Renderer>(&mut self, doc: &mut Document, writer: &ContentWriter<R>, elapsed_ms: u64) -> usize {
        let due = self.scheduler.advance(elapsed_ms);
        self.run(doc, writer, due)
    }

    /// Runs every pending batched render immediately.
    pub fn run_pending<R: Renderer>(&mut self, doc: &mut Document, writer: &ContentWriter<R>) -> usize {
        let due = self.scheduler.drain_all();
        self.run(doc, writer, due)
    }

    fn run<R: Renderer>(&mut self, doc: &mut Document, writer: &ContentWriter<R>, tasks: Vec<ScheduledTask>) -> usize {
        let count = tasks.len();
        for task in tasks {
            match task {
                ScheduledTask::FlushStream(slot) => {
                    if let Some(buffer) = self.buffers.get_mut(&slot) {
                        buffer.pending = None;
                    }
                    self.flush(doc, writer, slot);
                }
            }
        }
        count
    }
}

fn remove_tail_marker(doc: &mut Document, slot: NodeId) {
    let markers: Vec<NodeId> = doc
        .children(slot)
        .iter()
        .copied()
        .filter(|child| doc.has_attr(*child, ATTR_STREAM_TAIL))
        .collect();
    for marker in markers {
        doc.remove(marker);
    }
}
