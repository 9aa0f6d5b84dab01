//! Session boundaries: switch, history replay start, and replay end.
//!
//! Switching sessions and starting a replay both leave every session-scoped region empty
//! with no buffer or pending render left behind. Replay itself has no separate code
//! path; it feeds events through [`Engine::handle`].

use crate::core::event::Event;
use crate::core::region::RegionName;
use crate::render::Renderer;
use crate::runtime::engine::{Engine, HandleReport};

impl<R: Renderer> Engine<R> {
    pub fn on_session_switch(&mut self, session_id: &str) {
        self.clear_session_regions();
        self.replaying = false;
        self.session_id = Some(session_id.to_string());
        tracing::debug!(session_id, "switched session");
    }

    pub fn on_history_replay_start(&mut self, session_id: Option<&str>) {
        self.clear_session_regions();
        self.replaying = true;
        if let Some(session_id) = session_id {
            self.session_id = Some(session_id.to_string());
        }
    }

    /// Leaves replay mode and runs every pending batched render immediately.
    pub fn on_history_replay_end(&mut self) -> usize {
        self.replaying = false;
        self.run_pending()
    }

    /// Rebuilds the regions from a history log through the live event path.
    pub fn replay<'a, I>(&mut self, events: I) -> HandleReport
    where
        I: IntoIterator<Item = &'a Event>,
    {
        self.on_history_replay_start(None);
        let report = self.handle_all(events);
        let flushed = self.on_history_replay_end();
        tracing::debug!(
            handled = report.handled,
            failed = report.failed,
            flushed,
            "history replay finished"
        );
        report
    }

    fn clear_session_regions(&mut self) {
        for region in RegionName::ALL {
            if region.is_session_scoped() {
                self.clear(region);
            }
        }
    }
}
