//! Element locator.
//!
//! Two lookup strategies are sanctioned inside regions:
//! - scoped attribute key ([`Selector::Landmark`]) for persistent landmarks, searched below
//!   an explicit scope and never inside slot or rendered subtrees;
//! - scoped structural queries ([`Selector::LastChild`], [`Selector::ChildTagged`],
//!   [`Selector::Keyed`]) over the direct children of a node the caller already holds.
//!
//! Global `id` lookup ([`Selector::StaticId`]) exists only for the static shell landmarks
//! created at startup. This module is the only code that performs a document-wide query.

use crate::core::document::{Document, NodeId};
use crate::core::region::APP_ID;
use crate::core::tags::{ATTR_APPLET, ATTR_KEY, ATTR_LANDMARK, ATTR_SLOT, CLASS_RENDERED};

/// Ids that may be resolved with a document-wide lookup.
pub const STATIC_LANDMARK_IDS: &[&str] = &[APP_ID, "transcript"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector<'a> {
    /// Descendant of the scope carrying `data-landmark=<name>`.
    Landmark(&'a str),
    /// Last direct child of the scope.
    LastChild,
    /// First direct child of the scope with `attr=value`.
    ChildTagged { attr: &'a str, value: &'a str },
    /// Direct child of the scope with `attr=value` and `data-key=key`.
    Keyed {
        attr: &'a str,
        value: &'a str,
        key: &'a str,
    },
    /// Document-wide `id` lookup; the scope is ignored.
    StaticId(&'a str),
}

pub fn locate(doc: &Document, scope: NodeId, selector: Selector<'_>) -> Option<NodeId> {
    match selector {
        Selector::Landmark(name) => find_landmark(doc, scope, name),
        Selector::LastChild => doc.last_child(scope),
        Selector::ChildTagged { attr, value } => doc
            .children(scope)
            .iter()
            .find(|child| doc.attr(**child, attr) == Some(value))
            .copied(),
        Selector::Keyed { attr, value, key } => doc
            .children(scope)
            .iter()
            .find(|child| {
                doc.attr(**child, attr) == Some(value) && doc.attr(**child, ATTR_KEY) == Some(key)
            })
            .copied(),
        Selector::StaticId(id) => {
            if !STATIC_LANDMARK_IDS.contains(&id) {
                tracing::debug!(id, "refusing global id lookup for non-static element");
                return None;
            }
            doc.element_by_id(id)
        }
    }
}

/// Content subtrees never hold landmarks, so the search does not descend into them.
fn is_content_subtree(doc: &Document, node: NodeId) -> bool {
    doc.has_attr(node, ATTR_SLOT) || doc.has_attr(node, ATTR_APPLET) || doc.has_class(node, CLASS_RENDERED)
}

fn find_landmark(doc: &Document, scope: NodeId, name: &str) -> Option<NodeId> {
    let mut stack: Vec<NodeId> = doc.children(scope).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if doc.attr(node, ATTR_LANDMARK) == Some(name) {
            return Some(node);
        }
        if is_content_subtree(doc, node) {
            continue;
        }
        stack.extend(doc.children(node).iter().rev().copied());
    }
    None
}
