//! Core document model, events, and lookup rules.

pub mod document;
pub mod event;
pub mod locator;
pub mod markup;
pub mod region;
pub mod tags;
pub mod text;
