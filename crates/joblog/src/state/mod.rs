//! State module: the composition root and the events it publishes.

pub mod app;
pub mod event;

pub use app::{JobLogState, SharedState};
pub use event::JobLogEvent;
