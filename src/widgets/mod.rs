//! Region owners.

pub mod applet_panel;
pub mod context_footer;
pub mod transcript;

pub use applet_panel::AppletPanel;
pub use context_footer::{ContextFooter, ContextUsage, UsageLevel};
pub use transcript::{GroupSnapshot, RegionSnapshot, SlotSnapshot, Transcript};
