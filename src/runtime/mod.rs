//! Event-driven runtime: structural insertion, content writing, streaming, and the
//! turn and session lifecycles.

pub mod activity;
pub mod engine;
pub mod inserter;
pub mod scheduler;
pub mod session;
pub mod streaming;
pub mod writer;

pub use engine::{Engine, HandleReport};
pub use scheduler::{ScheduledTask, Scheduler, TimerHandle};
pub use streaming::StreamingAccumulator;
pub use writer::{ContentWriter, Payload};
