//! Region registry.
//!
//! Regions are the fixed, singly owned subtree roots of the application shell. The
//! registry is built once when the engine starts and is read-only afterwards.

use std::fmt;
use std::str::FromStr;

use crate::core::document::{Document, NodeId};
use crate::core::tags::ATTR_LANDMARK;
use crate::error::EngineError;

/// `id` of the shell element that hosts every region.
pub const APP_ID: &str = "app";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionName {
    Transcript,
    ContextFooter,
    AppletPanel,
}

impl RegionName {
    pub const ALL: [RegionName; 3] = [
        RegionName::Transcript,
        RegionName::ContextFooter,
        RegionName::AppletPanel,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transcript => "transcript",
            Self::ContextFooter => "contextFooter",
            Self::AppletPanel => "appletPanel",
        }
    }

    /// Value of the `data-landmark` attribute on the region root.
    pub const fn landmark(self) -> &'static str {
        match self {
            Self::Transcript => "transcript",
            Self::ContextFooter => "context-footer",
            Self::AppletPanel => "applet-panel",
        }
    }

    const fn element_tag(self) -> &'static str {
        match self {
            Self::Transcript => "main",
            Self::ContextFooter => "footer",
            Self::AppletPanel => "aside",
        }
    }

    /// Static `id` for regions that are also global landmarks.
    pub const fn static_id(self) -> Option<&'static str> {
        match self {
            Self::Transcript => Some("transcript"),
            Self::ContextFooter | Self::AppletPanel => None,
        }
    }

    /// Whether the region's content belongs to one session and is cleared on switch.
    pub const fn is_session_scoped(self) -> bool {
        match self {
            Self::Transcript | Self::ContextFooter | Self::AppletPanel => true,
        }
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionName {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|region| region.as_str() == value)
            .ok_or_else(|| EngineError::unknown_region(value))
    }
}

/// Mutating owner of exactly one region.
pub trait RegionController {
    fn region(&self) -> RegionName;

    fn root(&self) -> NodeId;

    /// Removes every child of the region root.
    fn clear(&mut self, doc: &mut Document);

    fn set_visible(&mut self, doc: &mut Document, visible: bool) {
        if visible {
            doc.remove_attr(self.root(), "hidden");
        } else {
            doc.set_attr(self.root(), "hidden", "");
        }
    }

    fn is_visible(&self, doc: &Document) -> bool {
        !doc.has_attr(self.root(), "hidden")
    }
}

#[derive(Debug, Clone)]
pub struct RegionRegistry {
    app: NodeId,
    entries: Vec<(RegionName, NodeId)>,
}

impl RegionRegistry {
    /// Builds the application shell under the document root and records each region.
    pub(crate) fn build(doc: &mut Document) -> Self {
        let app = doc.create_element("div");
        doc.set_attr(app, "id", APP_ID);
        doc.append_child(doc.root(), app);

        let mut entries = Vec::with_capacity(RegionName::ALL.len());
        for region in RegionName::ALL {
            let node = doc.create_element(region.element_tag());
            doc.set_attr(node, ATTR_LANDMARK, region.landmark());
            if let Some(id) = region.static_id() {
                doc.set_attr(node, "id", id);
            }
            if region == RegionName::AppletPanel {
                doc.set_attr(node, "hidden", "");
            }
            doc.append_child(app, node);
            entries.push((region, node));
        }

        Self { app, entries }
    }

    pub fn app(&self) -> NodeId {
        self.app
    }

    pub fn root(&self, region: RegionName) -> NodeId {
        self.entries
            .iter()
            .find(|(name, _)| *name == region)
            .map(|(_, node)| *node)
            .unwrap_or(self.app)
    }

    pub fn root_element(&self, name: &str) -> Result<NodeId, EngineError> {
        let region = name.parse::<RegionName>()?;
        Ok(self.root(region))
    }

    pub fn regions(&self) -> impl Iterator<Item = RegionName> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}
