//! Client module: how job traces and statuses reach this crate.
//!
//! - `source.rs`: the [`TraceSource`] trait every caller goes through
//! - `error.rs`: [`SourceError`]
//! - `fake.rs`: an in-memory [`FakeTraceSource`] for tests

pub mod error;
pub mod fake;
pub mod source;

pub use error::SourceError;
pub use fake::FakeTraceSource;
pub use source::{JobStatus, TraceIncrement, TraceSource};
