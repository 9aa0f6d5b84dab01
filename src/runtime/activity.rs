//! Activity lifecycle: turn start, first-content placement, turn end, and user toggles.
//!
//! A turn moves through `awaiting-first-content` (its activity Group holds only the
//! thinking placeholder), `has-content`, and `finalized`. The placeholder is only ever
//! looked for inside the region's last Group.

use crate::core::document::{Document, NodeId};
use crate::core::locator::{locate, Selector};
use crate::core::tags::{
    GroupTag, SlotTag, ATTR_COLLAPSED, ATTR_SLOT, ATTR_STREAMING, ATTR_USER_TOGGLED,
};
use crate::error::EngineError;
use crate::render::Renderer;
use crate::runtime::inserter::{
    append_group, append_slot, group_tag, mark_finalized, open_groups, resolve_group,
    resolve_slot, slot_tag,
};
use crate::runtime::streaming::StreamingAccumulator;
use crate::runtime::writer::ContentWriter;

/// Appends a fresh activity Group holding only a thinking placeholder.
///
/// Callers finish any still-open Groups first; see [`finish_turn`].
pub fn start_turn<R: Renderer>(doc: &mut Document, writer: &ContentWriter<R>, region: NodeId) -> NodeId {
    let group = append_group(doc, region, GroupTag::Activity);
    let placeholder = append_slot(doc, group, SlotTag::Thinking, None);
    writer.write_placeholder(doc, placeholder);
    placeholder
}

/// Removes every thinking placeholder that is a direct child of `group`.
///
/// Sibling slots and other Groups are never touched. Returns whether anything was
/// removed; a missing placeholder is a no-op.
pub fn clear_placeholder(doc: &mut Document, group: NodeId) -> bool {
    let mut removed = false;
    while let Some(placeholder) = locate(
        doc,
        group,
        Selector::ChildTagged {
            attr: ATTR_SLOT,
            value: SlotTag::Thinking.as_str(),
        },
    ) {
        removed |= doc.remove(placeholder);
    }
    removed
}

/// Places content for a new slot as one step: clear the placeholder from the region's
/// last Group, drop that Group if it is now empty and `group` differs from its tag, then
/// resolve the Group and the Slot.
pub fn place_content(
    doc: &mut Document,
    region: NodeId,
    group: GroupTag,
    slot: SlotTag,
    key: Option<&str>,
) -> NodeId {
    if let Some(last) = locate(doc, region, Selector::LastChild) {
        if let Some(last_tag) = group_tag(doc, last) {
            if clear_placeholder(doc, last) && doc.children(last).is_empty() && last_tag != group {
                doc.remove(last);
            }
        }
    }
    let target = resolve_group(doc, region, group);
    resolve_slot(doc, target, slot, key)
}

/// Ends the current turn for every open Group of the region.
///
/// Leftover placeholders go (with their Group when it empties), streaming buffers are
/// finalized, collapsible slots take their turn-end state unless the user toggled them,
/// and each Group is marked finalized. Returns the number of Groups finalized.
pub fn finish_turn<R: Renderer>(
    doc: &mut Document,
    streams: &mut StreamingAccumulator,
    writer: &ContentWriter<R>,
    region: NodeId,
) -> usize {
    let mut finalized = 0;
    for group in open_groups(doc, region) {
        if clear_placeholder(doc, group) && doc.children(group).is_empty() {
            doc.remove(group);
            continue;
        }

        let slots = doc.children(group).to_vec();
        for slot in slots {
            if streams.has_buffer(slot) {
                streams.finalize(doc, writer, slot, None);
            }
            doc.remove_attr(slot, ATTR_STREAMING);
            apply_finalize_collapse(doc, slot);
        }
        mark_finalized(doc, group);
        finalized += 1;
    }
    finalized
}

fn apply_finalize_collapse(doc: &mut Document, slot: NodeId) {
    let Some(tag) = slot_tag(doc, slot) else {
        return;
    };
    if !tag.is_collapsible() || doc.has_attr(slot, ATTR_USER_TOGGLED) {
        return;
    }
    let collapsed = if tag.collapsed_on_finalize() { "true" } else { "false" };
    doc.set_attr(slot, ATTR_COLLAPSED, collapsed);
}

/// Flips a collapsible slot's collapsed state and records the user override.
///
/// Returns the new collapsed state. Non-collapsible slots are left unchanged.
pub fn toggle_slot(doc: &mut Document, slot: NodeId) -> Result<bool, EngineError> {
    let tag = slot_tag(doc, slot).ok_or(EngineError::NotASlot(slot))?;
    if !doc.is_attached(slot) {
        return Err(EngineError::Detached(slot));
    }
    if !tag.is_collapsible() {
        return Ok(false);
    }
    let collapsed = doc.attr(slot, ATTR_COLLAPSED) != Some("true");
    doc.set_attr(slot, ATTR_COLLAPSED, if collapsed { "true" } else { "false" });
    doc.set_attr(slot, ATTR_USER_TOGGLED, "true");
    Ok(collapsed)
}
