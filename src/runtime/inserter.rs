//! Structural inserter: resolve-or-create for Groups and Slots.
//!
//! Reuse decisions are pure functions of the current tree. Nothing here caches a "last
//! group" between calls; every decision re-reads the region's last child.

use crate::core::document::{Document, NodeId};
use crate::core::locator::{locate, Selector};
use crate::core::tags::{
    GroupTag, SlotTag, ATTR_COLLAPSED, ATTR_GROUP, ATTR_GROUP_STATE, ATTR_KEY, ATTR_SLOT,
    CLASS_GROUP, CLASS_SLOT, STATE_FINALIZED, STATE_OPEN,
};

pub fn group_tag(doc: &Document, node: NodeId) -> Option<GroupTag> {
    doc.attr(node, ATTR_GROUP).and_then(GroupTag::parse)
}

pub fn slot_tag(doc: &Document, node: NodeId) -> Option<SlotTag> {
    doc.attr(node, ATTR_SLOT).and_then(SlotTag::parse)
}

pub fn slot_key(doc: &Document, node: NodeId) -> Option<&str> {
    doc.attr(node, ATTR_KEY)
}

pub fn is_open_group(doc: &Document, node: NodeId) -> bool {
    group_tag(doc, node).is_some() && doc.attr(node, ATTR_GROUP_STATE) == Some(STATE_OPEN)
}

pub(crate) fn mark_finalized(doc: &mut Document, group: NodeId) {
    doc.set_attr(group, ATTR_GROUP_STATE, STATE_FINALIZED);
}

/// Returns the region's last child when it is an open Group with `tag`, else appends a
/// new open Group.
pub fn resolve_group(doc: &mut Document, region: NodeId, tag: GroupTag) -> NodeId {
    if let Some(last) = locate(doc, region, Selector::LastChild) {
        if is_open_group(doc, last) && group_tag(doc, last) == Some(tag) {
            return last;
        }
    }
    append_group(doc, region, tag)
}

pub(crate) fn append_group(doc: &mut Document, region: NodeId, tag: GroupTag) -> NodeId {
    let group = doc.create_element("section");
    doc.set_attr(group, "class", CLASS_GROUP);
    doc.set_attr(group, ATTR_GROUP, tag.as_str());
    doc.set_attr(group, ATTR_GROUP_STATE, STATE_OPEN);
    doc.append_child(region, group);
    group
}

/// Keyed: scoped lookup among `group`'s children, create on miss.
/// Unkeyed: reuse `group`'s last child when its tag matches, else create. Tags that
/// accumulate ([`SlotTag::appends_unkeyed`]) always create.
pub fn resolve_slot(doc: &mut Document, group: NodeId, tag: SlotTag, key: Option<&str>) -> NodeId {
    let existing = match key {
        Some(key) => locate(
            doc,
            group,
            Selector::Keyed {
                attr: ATTR_SLOT,
                value: tag.as_str(),
                key,
            },
        ),
        None if tag.appends_unkeyed() => None,
        None => locate(doc, group, Selector::LastChild)
            .filter(|last| slot_tag(doc, *last) == Some(tag) && slot_key(doc, *last).is_none()),
    };
    match existing {
        Some(slot) => slot,
        None => append_slot(doc, group, tag, key),
    }
}

pub(crate) fn append_slot(doc: &mut Document, group: NodeId, tag: SlotTag, key: Option<&str>) -> NodeId {
    let slot = doc.create_element("div");
    doc.set_attr(slot, "class", CLASS_SLOT);
    doc.set_attr(slot, ATTR_SLOT, tag.as_str());
    if let Some(key) = key {
        doc.set_attr(slot, ATTR_KEY, key);
    }
    if tag.is_collapsible() {
        let collapsed = if tag.collapsed_on_create() { "true" } else { "false" };
        doc.set_attr(slot, ATTR_COLLAPSED, collapsed);
    }
    doc.append_child(group, slot);
    slot
}

/// Groups of the region that are still open, newest first.
///
/// The walk stops at the first Group that is not open, so it never crosses a turn
/// boundary.
pub fn open_groups(doc: &Document, region: NodeId) -> Vec<NodeId> {
    doc.children(region)
        .iter()
        .rev()
        .take_while(|node| is_open_group(doc, **node))
        .copied()
        .collect()
}

/// Scoped keyed lookup across the region's open Groups, newest first.
pub fn find_keyed_slot(doc: &Document, region: NodeId, tag: SlotTag, key: &str) -> Option<NodeId> {
    open_groups(doc, region).into_iter().find_map(|group| {
        locate(
            doc,
            group,
            Selector::Keyed {
                attr: ATTR_SLOT,
                value: tag.as_str(),
                key,
            },
        )
    })
}
