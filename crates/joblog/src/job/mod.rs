//! Job module: live job logs.
//!
//! - `cache.rs`: per-job trace cache
//! - `refresher.rs`: polling task for one running job
//! - `pool.rs`: at most one refresher per job
//! - `uri.rs`: locator for a job log document
//! - `view.rs`: rendered log, folding regions, document content, export
//! - `metrics.rs`: refresher counters

use thiserror::Error;

use crate::client::SourceError;

pub mod cache;
pub mod metrics;
pub mod pool;
pub mod refresher;
pub mod uri;
pub mod view;

pub use cache::{CacheItem, LogCache};
pub use metrics::{RefreshMetrics, RefreshSnapshot};
pub use pool::RefresherPool;
pub use refresher::{LogRefresher, RefreshConfig, RefreshContext, RefreshTask, TickOutcome};
pub use uri::{JobLogUri, LocatorError, JOB_LOG_URI_SCHEME};

/// CI job id.
pub type JobId = u64;

#[derive(Error, Debug)]
pub enum JobLogError {
    #[error("Invalid job log locator: {0}")]
    Locator(#[from] LocatorError),
    #[error("Trace source error: {0}")]
    Source(#[from] SourceError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No trace available for job {0}")]
    TraceUnavailable(JobId),
}
