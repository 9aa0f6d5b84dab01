//! Applet panel region owner.
//!
//! Each applet is `section.applet[data-applet=<id>]` holding a title header followed by
//! a sanitized body. The panel is shown while at least one applet is open.

use crate::core::document::{Document, NodeId};
use crate::core::locator::{locate, Selector};
use crate::core::markup::MarkupNode;
use crate::core::region::{RegionController, RegionName};
use crate::core::tags::{ATTR_APPLET, CLASS_APPLET, CLASS_RENDERED};
use crate::render::sanitize::sanitize;

#[derive(Debug)]
pub struct AppletPanel {
    root: NodeId,
}

impl AppletPanel {
    pub(crate) fn new(root: NodeId) -> Self {
        Self { root }
    }

    fn find(&self, doc: &Document, id: &str) -> Option<NodeId> {
        locate(
            doc,
            self.root,
            Selector::ChildTagged {
                attr: ATTR_APPLET,
                value: id,
            },
        )
    }

    pub fn applet_ids<'a>(&self, doc: &'a Document) -> Vec<&'a str> {
        doc.children(self.root)
            .iter()
            .filter_map(|node| doc.attr(*node, ATTR_APPLET))
            .collect()
    }

    /// Opens an applet, or replaces title and body when `id` is already open.
    pub(crate) fn open(&mut self, doc: &mut Document, id: &str, title: &str, markup: &[MarkupNode]) -> NodeId {
        let applet = match self.find(doc, id) {
            Some(existing) => {
                doc.clear_children(existing);
                existing
            }
            None => {
                let applet = doc.create_element("section");
                doc.set_attr(applet, "class", CLASS_APPLET);
                doc.set_attr(applet, ATTR_APPLET, id);
                doc.append_child(self.root, applet);
                applet
            }
        };

        let header = doc.create_element("header");
        doc.set_attr(header, "class", "applet-title");
        doc.set_text(header, title);
        doc.append_child(applet, header);

        let body = doc.create_element("div");
        doc.set_attr(body, "class", "applet-body");
        doc.append_child(applet, body);
        write_body(doc, body, markup);

        self.set_visible(doc, true);
        applet
    }

    /// Replaces the body of an open applet. Returns false when `id` is not open.
    pub(crate) fn update(&mut self, doc: &mut Document, id: &str, markup: &[MarkupNode]) -> bool {
        let Some(body) = self
            .find(doc, id)
            .and_then(|applet| locate(doc, applet, Selector::LastChild))
        else {
            tracing::debug!(applet = id, "update for an applet that is not open");
            return false;
        };
        write_body(doc, body, markup);
        true
    }

    pub(crate) fn close(&mut self, doc: &mut Document, id: &str) -> bool {
        let Some(applet) = self.find(doc, id) else {
            return false;
        };
        doc.remove(applet);
        if doc.children(self.root).is_empty() {
            self.set_visible(doc, false);
        }
        true
    }
}

fn write_body(doc: &mut Document, body: NodeId, markup: &[MarkupNode]) {
    let safe = sanitize(markup);
    doc.clear_children(body);
    doc.append_markup(body, safe.nodes());
    doc.add_class(body, CLASS_RENDERED);
}

impl RegionController for AppletPanel {
    fn region(&self) -> RegionName {
        RegionName::AppletPanel
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn clear(&mut self, doc: &mut Document) {
        doc.clear_children(self.root);
        self.set_visible(doc, false);
    }
}
