//! Virtual-clock scheduler for deferred engine work.
//!
//! Tasks are plain data and never hold document references; whoever fires a task must
//! re-validate the nodes it names. The clock only moves when the host calls
//! [`Scheduler::advance`], so tests drive time explicitly.

use crate::core::document::NodeId;

/// Handle for one scheduled task. Never reused within a scheduler.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Batched render of one streaming slot.
    FlushStream(NodeId),
}

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    due_ms: u64,
    task: ScheduledTask,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_handle: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule(&mut self, delay_ms: u64, task: ScheduledTask) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.timers.push(Timer {
            handle,
            due_ms: self.now_ms.saturating_add(delay_ms),
            task,
        });
        handle
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.timers.len() != before
    }

    /// Drops every pending task; returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.timers.len();
        self.timers.clear();
        dropped
    }

    pub fn pending_len(&self) -> usize {
        self.timers.len()
    }

    /// Moves the clock forward and removes the tasks that became due, in due order.
    ///
    /// Tasks due at the same instant fire in scheduling order.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<ScheduledTask> {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
        let now = self.now_ms;
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) =
            self.timers.drain(..).partition(|timer| timer.due_ms <= now);
        self.timers = pending;
        due.sort_by_key(|timer| (timer.due_ms, timer.handle));
        due.into_iter().map(|timer| timer.task).collect()
    }

    /// Removes every pending task regardless of its due time, without moving the clock.
    pub fn drain_all(&mut self) -> Vec<ScheduledTask> {
        let mut timers = std::mem::take(&mut self.timers);
        timers.sort_by_key(|timer| (timer.due_ms, timer.handle));
        timers.into_iter().map(|timer| timer.task).collect()
    }
}
