//! Fake: test double for the CI server.
//!
//! [`FakeTraceSource`] keeps jobs in memory and hands out a fresh sync
//! token every time a trace changes, so conditional fetches behave like
//! the real server's. Calls are counted for assertions.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::Mutex;

use super::error::SourceError;
use super::source::{JobStatus, TraceIncrement, TraceSource};
use crate::job::JobId;

// ── In-memory state ─────────────────────────────────────────────

#[derive(Clone, Debug)]
struct FakeJob {
    raw_trace: String,
    version: u64,
    status: JobStatus,
}

impl FakeJob {
    fn token(&self) -> String {
        format!("W/\"{}\"", self.version)
    }
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, FakeJob>,
    fail_traces: bool,
    fail_statuses: bool,
    trace_calls: usize,
    status_calls: usize,
}

/// A fake CI server for deterministic testing.
pub struct FakeTraceSource {
    inner: Mutex<Inner>,
}

impl FakeTraceSource {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }

    /// Seed or replace a job's trace. A changed trace gets a new sync token.
    pub async fn set_trace(&self, job: JobId, raw_trace: &str, status: JobStatus) {
        let mut state = self.inner.lock().await;
        let entry = state.jobs.entry(job).or_insert_with(|| FakeJob {
            raw_trace: String::new(),
            version: 0,
            status,
        });
        if entry.raw_trace != raw_trace || entry.version == 0 {
            entry.raw_trace = raw_trace.to_string();
            entry.version += 1;
        }
        entry.status = status;
    }

    /// Append to a job's trace, as a runner streaming output would.
    pub async fn append_trace(&self, job: JobId, text: &str) {
        let mut state = self.inner.lock().await;
        if let Some(entry) = state.jobs.get_mut(&job) {
            entry.raw_trace.push_str(text);
            entry.version += 1;
        }
    }

    pub async fn set_status(&self, job: JobId, status: JobStatus) {
        if let Some(entry) = self.inner.lock().await.jobs.get_mut(&job) {
            entry.status = status;
        }
    }

    /// Make every following trace request fail.
    pub async fn fail_traces(&self, fail: bool) {
        self.inner.lock().await.fail_traces = fail;
    }

    /// Make every following status request fail.
    pub async fn fail_statuses(&self, fail: bool) {
        self.inner.lock().await.fail_statuses = fail;
    }

    pub async fn trace_calls(&self) -> usize {
        self.inner.lock().await.trace_calls
    }

    pub async fn status_calls(&self) -> usize {
        self.inner.lock().await.status_calls
    }
}

impl Default for FakeTraceSource {
    fn default() -> Self {
        Self::new()
    }
}

// ── TraceSource implementation ──────────────────────────────────

impl TraceSource for FakeTraceSource {
    fn job_trace<'a>(
        &'a self,
        _repository_root: &'a str,
        job: JobId,
        sync_token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TraceIncrement>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.inner.lock().await;
            state.trace_calls += 1;
            if state.fail_traces {
                return Err(SourceError::Request("connection reset".to_string()));
            }
            let entry = state.jobs.get(&job).ok_or(SourceError::NotFound(job))?;
            let token = entry.token();
            if sync_token == Some(token.as_str()) {
                return Ok(None);
            }
            Ok(Some(TraceIncrement {
                raw_trace: entry.raw_trace.clone(),
                sync_token: token,
            }))
        })
    }

    fn job_status<'a>(
        &'a self,
        _repository_root: &'a str,
        job: JobId,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.inner.lock().await;
            state.status_calls += 1;
            if state.fail_statuses {
                return Err(SourceError::Request("connection reset".to_string()));
            }
            state.jobs.get(&job).map(|entry| entry.status).ok_or(SourceError::NotFound(job))
        })
    }
}
