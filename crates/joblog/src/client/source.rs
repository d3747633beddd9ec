//! TraceSource: the remote CI server as seen by the log cache.
//!
//! Implementations fetch a job's trace (conditionally, with a sync token)
//! and its current status. `fake.rs` provides the test double.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use super::error::SourceError;
use crate::job::JobId;

/// The complete trace as of `sync_token`.
///
/// Always the whole trace, never a delta. Every response carries a token;
/// an entry loses its token only when the job is known to be finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceIncrement {
    pub raw_trace: String,
    pub sync_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
}

impl JobStatus {
    /// Only `running` keeps a log live; pending jobs have no trace to poll.
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }
}

/// Async interface over the CI server.
///
/// Object-safe thanks to `Pin<Box<…>>` returns, and `Send + Sync` so one
/// instance can be shared by every refresher task.
pub trait TraceSource: Send + Sync {
    /// Fetch the trace of `job`.
    ///
    /// With a `sync_token`, `Ok(None)` means nothing changed since the
    /// response that produced that token.
    fn job_trace<'a>(
        &'a self,
        repository_root: &'a str,
        job: JobId,
        sync_token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TraceIncrement>, SourceError>> + Send + 'a>>;

    fn job_status<'a>(
        &'a self,
        repository_root: &'a str,
        job: JobId,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus, SourceError>> + Send + 'a>>;
}
