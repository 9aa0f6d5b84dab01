//! Transcript region owner.
//!
//! The only code that creates or removes Groups and Slots. Event handlers in the engine
//! come through here; the algorithms themselves live in [`crate::runtime::activity`] and
//! [`crate::runtime::inserter`].

use serde::Serialize;

use crate::core::document::{Document, NodeId};
use crate::core::region::{RegionController, RegionName};
use crate::core::tags::{
    GroupTag, SlotTag, ATTR_COLLAPSED, ATTR_GROUP_STATE, ATTR_STATUS, ATTR_TOOL_NAME,
    ATTR_USER_TOGGLED,
};
use crate::error::EngineError;
use crate::render::Renderer;
use crate::runtime::activity::{finish_turn, place_content, start_turn};
use crate::runtime::inserter::{find_keyed_slot, group_tag, slot_key, slot_tag};
use crate::runtime::streaming::StreamingAccumulator;
use crate::runtime::writer::ContentWriter;

#[derive(Debug)]
pub struct Transcript {
    root: NodeId,
}

impl Transcript {
    pub(crate) fn new(root: NodeId) -> Self {
        Self { root }
    }

    /// Finishes any open Groups, then opens a new activity Group with a placeholder.
    pub(crate) fn begin_turn<R: Renderer>(
        &mut self,
        doc: &mut Document,
        streams: &mut StreamingAccumulator,
        writer: &ContentWriter<R>,
    ) -> NodeId {
        let implicit = finish_turn(doc, streams, writer, self.root);
        if implicit > 0 {
            tracing::debug!(groups = implicit, "turn start closed groups left open");
        }
        start_turn(doc, writer, self.root)
    }

    pub(crate) fn end_turn<R: Renderer>(
        &mut self,
        doc: &mut Document,
        streams: &mut StreamingAccumulator,
        writer: &ContentWriter<R>,
    ) -> usize {
        finish_turn(doc, streams, writer, self.root)
    }

    /// Slot for a content event; keyed events reuse their slot from any open Group.
    pub(crate) fn content_slot(
        &mut self,
        doc: &mut Document,
        group: GroupTag,
        slot: SlotTag,
        key: Option<&str>,
    ) -> NodeId {
        match key {
            Some(key) => self.keyed_slot(doc, group, slot, key),
            None => place_content(doc, self.root, group, slot, None),
        }
    }

    /// Slot for an update-only keyed event. A miss is not an error: the slot is created
    /// through the normal placement path.
    pub(crate) fn keyed_slot(&mut self, doc: &mut Document, group: GroupTag, slot: SlotTag, key: &str) -> NodeId {
        match self.lookup_keyed(doc, slot, key) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(error = %err, slot = slot.as_str(), "creating slot on demand");
                place_content(doc, self.root, group, slot, Some(key))
            }
        }
    }

    fn lookup_keyed(&self, doc: &Document, slot: SlotTag, key: &str) -> Result<NodeId, EngineError> {
        find_keyed_slot(doc, self.root, slot, key).ok_or_else(|| EngineError::slot_not_found(key))
    }

    pub fn snapshot(&self, doc: &Document) -> RegionSnapshot {
        let groups = doc
            .children(self.root)
            .iter()
            .filter_map(|group| {
                let tag = group_tag(doc, *group)?;
                let slots = doc
                    .children(*group)
                    .iter()
                    .filter_map(|slot| SlotSnapshot::capture(doc, *slot))
                    .collect();
                Some(GroupSnapshot {
                    tag: tag.as_str().to_string(),
                    state: doc.attr(*group, ATTR_GROUP_STATE).unwrap_or_default().to_string(),
                    slots,
                })
            })
            .collect();
        RegionSnapshot { groups }
    }
}

impl RegionController for Transcript {
    fn region(&self) -> RegionName {
        RegionName::Transcript
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn clear(&mut self, doc: &mut Document) {
        doc.clear_children(self.root);
    }
}

/// Structural summary of the transcript: Group and Slot tags, keys, and final content.
///
/// Two transcripts with equal snapshots are isomorphic for display purposes; node ids
/// and streaming-only attributes are not part of the comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionSnapshot {
    pub groups: Vec<GroupSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSnapshot {
    pub tag: String,
    pub state: String,
    pub slots: Vec<SlotSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    pub user_toggled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub html: String,
}

impl SlotSnapshot {
    fn capture(doc: &Document, slot: NodeId) -> Option<Self> {
        let tag = slot_tag(doc, slot)?;
        Some(Self {
            tag: tag.as_str().to_string(),
            key: slot_key(doc, slot).map(str::to_string),
            collapsed: doc.attr(slot, ATTR_COLLAPSED).map(|value| value == "true"),
            user_toggled: doc.has_attr(slot, ATTR_USER_TOGGLED),
            tool_name: doc.attr(slot, ATTR_TOOL_NAME).map(str::to_string),
            status: doc.attr(slot, ATTR_STATUS).map(str::to_string),
            html: doc.inner_html(slot),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Transcript;
    use crate::core::document::Document;
    use crate::core::region::{RegionName, RegionRegistry};
    use crate::core::tags::{GroupTag, SlotTag};
    use crate::error::EngineError;

    #[test]
    fn keyed_miss_reports_slot_not_found_then_creates_the_slot() {
        let mut doc = Document::new();
        let registry = RegionRegistry::build(&mut doc);
        let mut transcript = Transcript::new(registry.root(RegionName::Transcript));

        let miss = transcript.lookup_keyed(&doc, SlotTag::Tool, "t1");
        assert!(matches!(miss, Err(EngineError::SlotNotFound { ref key }) if key == "t1"));

        let created = transcript.keyed_slot(&mut doc, GroupTag::Activity, SlotTag::Tool, "t1");
        assert_eq!(transcript.lookup_keyed(&doc, SlotTag::Tool, "t1").ok(), Some(created));
        assert_eq!(
            transcript.keyed_slot(&mut doc, GroupTag::Activity, SlotTag::Tool, "t1"),
            created
        );
    }
}
