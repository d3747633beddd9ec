//! Refresher: keeps the cached trace of a running job up to date.
//!
//! Each refresher is one tokio task polling the [`TraceSource`] with the
//! entry's sync token. While the trace keeps changing the task only
//! fetches; the first time it stops changing the job status is checked
//! once, and a job that is no longer running is demoted to a final entry.
//! The task ends on the tick after that, when it finds no live entry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cache::LogCache;
use super::metrics::RefreshMetrics;
use super::JobId;
use crate::client::TraceSource;
use crate::conf::RefreshSettings;
use crate::state::JobLogEvent;

/// Poll cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Delay before the first tick; short so finished jobs settle quickly.
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            interval: Duration::from_millis(3000),
        }
    }
}

impl From<&RefreshSettings> for RefreshConfig {
    fn from(settings: &RefreshSettings) -> Self {
        Self {
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            interval: Duration::from_millis(settings.interval_ms),
        }
    }
}

/// Everything a refresher task needs, cheap to clone into each task.
#[derive(Clone)]
pub struct RefreshContext {
    pub cache: Arc<LogCache>,
    pub source: Arc<dyn TraceSource>,
    pub events: broadcast::Sender<JobLogEvent>,
    pub config: RefreshConfig,
    pub metrics: Arc<RefreshMetrics>,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No live cache entry; the refresher must stop.
    Dispose,
    /// New trace content was stored.
    Updated,
    /// The job stopped running and its entry was demoted.
    Finished,
    /// Nothing to do this tick.
    Unchanged,
    /// A fetch or status request failed; the next tick retries.
    Failed,
}

/// The state machine behind one refresher.
pub struct RefreshTask {
    job_id: JobId,
    /// Armed by new content, spent by one status check.
    should_recheck_status: bool,
    ctx: RefreshContext,
}

impl RefreshTask {
    pub fn new(job_id: JobId, ctx: RefreshContext) -> Self {
        Self {
            job_id,
            should_recheck_status: true,
            ctx,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Run one transition. Never fails: errors are logged and counted.
    pub async fn tick(&mut self) -> TickOutcome {
        let outcome = self.advance().await;
        self.ctx.metrics.record_tick(outcome);
        outcome
    }

    async fn advance(&mut self) -> TickOutcome {
        let job_id = self.job_id;
        let Some(item) = self.ctx.cache.get(job_id) else {
            return TickOutcome::Dispose;
        };
        let Some(root) = item.repository_root.as_deref() else {
            return TickOutcome::Dispose;
        };

        let fetched = self
            .ctx
            .source
            .job_trace(root, job_id, item.sync_token.as_deref())
            .await;

        match fetched {
            Ok(Some(increment)) => {
                self.should_recheck_status = true;
                self.ctx
                    .cache
                    .set_for_running(root, job_id, &increment.raw_trace, increment.sync_token);
                debug!(job_id, bytes = increment.raw_trace.len(), "Job trace updated");
                TickOutcome::Updated
            }
            Ok(None) if self.should_recheck_status => {
                self.should_recheck_status = false;
                self.ctx.metrics.record_status_check();

                match self.ctx.source.job_status(root, job_id).await {
                    Ok(status) if !status.is_running() => {
                        info!(job_id, ?status, "Job is no longer running, finalizing its log");
                        // No subscribers is fine.
                        let event = JobLogEvent::JobNoLongerLive { job_id, status };
                        let _ = self.ctx.events.send(event);
                        self.ctx.cache.set(job_id, &item.raw_trace);
                        TickOutcome::Finished
                    }
                    Ok(_) => TickOutcome::Unchanged,
                    Err(e) => {
                        self.ctx.metrics.record_status_failure();
                        warn!(job_id, "Failed to check job status: {}", e);
                        TickOutcome::Failed
                    }
                }
            }
            Ok(None) => TickOutcome::Unchanged,
            Err(e) => {
                self.ctx.metrics.record_fetch_failure();
                warn!(job_id, "Failed to fetch job trace: {}", e);
                TickOutcome::Failed
            }
        }
    }
}

/// Keeps the active-refresher gauge right even when the task is aborted.
struct ActiveGuard(Arc<RefreshMetrics>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.refresher_stopped();
    }
}

async fn run<F>(mut task: RefreshTask, disposed: Arc<AtomicBool>, _guard: ActiveGuard, on_stop: F)
where
    F: FnOnce(JobId),
{
    let RefreshConfig { initial_delay, interval } = task.ctx.config;
    tokio::time::sleep(initial_delay).await;

    while !disposed.load(Ordering::Acquire) {
        if task.tick().await == TickOutcome::Dispose {
            disposed.store(true, Ordering::Release);
            info!(job_id = task.job_id(), "Log refresher stopped, job log is final");
            on_stop(task.job_id());
            break;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Handle to a running refresher task. Dropping it disposes the task.
pub struct LogRefresher {
    job_id: JobId,
    disposed: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl LogRefresher {
    /// Spawn a refresher for `job_id` on the current tokio runtime.
    pub fn spawn(job_id: JobId, ctx: RefreshContext) -> Self {
        Self::spawn_with(job_id, ctx, |_| {})
    }

    /// Like [`Self::spawn`], calling `on_stop` from the task once it has
    /// disposed itself. Not called when the task is disposed from outside.
    pub fn spawn_with<F>(job_id: JobId, ctx: RefreshContext, on_stop: F) -> Self
    where
        F: FnOnce(JobId) + Send + 'static,
    {
        info!(job_id, "Starting log refresher (interval: {:?})", ctx.config.interval);
        ctx.metrics.refresher_started();
        let guard = ActiveGuard(Arc::clone(&ctx.metrics));

        let disposed = Arc::new(AtomicBool::new(false));
        let task = RefreshTask::new(job_id, ctx);
        let handle = tokio::spawn(run(task, Arc::clone(&disposed), guard, on_stop));

        Self { job_id, disposed, handle }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Stop the task. Safe to call any number of times.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.handle.abort();
        debug!(job_id = self.job_id, "Log refresher disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Drop for LogRefresher {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FakeTraceSource, JobStatus};

    const ROOT: &str = "/work/project";

    fn context(
        fake: &Arc<FakeTraceSource>,
    ) -> (RefreshContext, broadcast::Receiver<JobLogEvent>) {
        let (events, rx) = broadcast::channel(8);
        let source: Arc<dyn TraceSource> = fake.clone();
        let ctx = RefreshContext {
            cache: Arc::new(LogCache::new()),
            source,
            events,
            config: RefreshConfig::default(),
            metrics: Arc::new(RefreshMetrics::new()),
        };
        (ctx, rx)
    }

    async fn running_job(fake: &FakeTraceSource, ctx: &RefreshContext, trace: &str) {
        fake.set_trace(1, trace, JobStatus::Running).await;
        ctx.cache.set_for_running(ROOT, 1, "", "W/\"0\"".to_string());
    }

    // ── Ticks ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_missing_entry_disposes() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        let mut task = RefreshTask::new(1, ctx);

        assert_eq!(task.tick().await, TickOutcome::Dispose);
        assert_eq!(fake.trace_calls().await, 0);
    }

    #[tokio::test]
    async fn test_final_entry_disposes() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        ctx.cache.set(1, "done\n");
        let mut task = RefreshTask::new(1, ctx);

        assert_eq!(task.tick().await, TickOutcome::Dispose);
    }

    #[tokio::test]
    async fn test_increment_is_stored() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        running_job(&fake, &ctx, "line 1\n").await;
        let mut task = RefreshTask::new(1, ctx.clone());

        assert_eq!(task.tick().await, TickOutcome::Updated);
        let item = ctx.cache.get(1).unwrap();
        assert_eq!(&*item.raw_trace, "line 1\n");
        assert!(item.sync_token.is_some());
        assert_eq!(item.repository_root.as_deref(), Some(ROOT));
    }

    #[tokio::test]
    async fn test_status_checked_once_per_idle_streak() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        running_job(&fake, &ctx, "line 1\n").await;
        let mut task = RefreshTask::new(1, ctx.clone());

        assert_eq!(task.tick().await, TickOutcome::Updated);
        assert_eq!(task.tick().await, TickOutcome::Unchanged);
        assert_eq!(task.tick().await, TickOutcome::Unchanged);
        assert_eq!(fake.status_calls().await, 1);

        // New content re-arms the check.
        fake.append_trace(1, "line 2\n").await;
        assert_eq!(task.tick().await, TickOutcome::Updated);
        assert_eq!(task.tick().await, TickOutcome::Unchanged);
        assert_eq!(fake.status_calls().await, 2);
        assert_eq!(ctx.metrics.snapshot().status_checks, 2);
    }

    #[tokio::test]
    async fn test_finished_job_is_demoted() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, mut rx) = context(&fake);
        running_job(&fake, &ctx, "all done\n").await;
        let mut task = RefreshTask::new(1, ctx.clone());

        assert_eq!(task.tick().await, TickOutcome::Updated);
        fake.set_status(1, JobStatus::Success).await;
        assert_eq!(task.tick().await, TickOutcome::Finished);

        let item = ctx.cache.get(1).unwrap();
        assert_eq!(&*item.raw_trace, "all done\n");
        assert_eq!(item.sync_token, None);
        assert_eq!(item.repository_root, None);
        assert_eq!(
            rx.try_recv().unwrap(),
            JobLogEvent::JobNoLongerLive { job_id: 1, status: JobStatus::Success }
        );

        assert_eq!(task.tick().await, TickOutcome::Dispose);
    }

    #[tokio::test]
    async fn test_stored_token_lets_finished_job_settle() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        fake.set_trace(1, "done\n", JobStatus::Success).await;
        ctx.cache.set_for_running(ROOT, 1, "", "W/\"0\"".to_string());
        let mut task = RefreshTask::new(1, ctx.clone());

        let mut outcomes = Vec::new();
        for _ in 0..5 {
            outcomes.push(task.tick().await);
        }
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Updated,
                TickOutcome::Finished,
                TickOutcome::Dispose,
                TickOutcome::Dispose,
                TickOutcome::Dispose,
            ]
        );
        assert_eq!(fake.status_calls().await, 1);

        let item = ctx.cache.get(1).unwrap();
        assert_eq!(item.sync_token, None);
        assert_eq!(item.repository_root, None);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_going() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        running_job(&fake, &ctx, "line 1\n").await;
        let mut task = RefreshTask::new(1, ctx.clone());

        fake.fail_traces(true).await;
        assert_eq!(task.tick().await, TickOutcome::Failed);
        assert_eq!(&*ctx.cache.get(1).unwrap().raw_trace, "");

        fake.fail_traces(false).await;
        assert_eq!(task.tick().await, TickOutcome::Updated);
        assert_eq!(ctx.metrics.snapshot().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_status_failure_disarms() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        running_job(&fake, &ctx, "x\n").await;
        let mut task = RefreshTask::new(1, ctx.clone());

        assert_eq!(task.tick().await, TickOutcome::Updated);
        fake.fail_statuses(true).await;
        assert_eq!(task.tick().await, TickOutcome::Failed);
        assert_eq!(task.tick().await, TickOutcome::Unchanged);
        assert_eq!(ctx.metrics.snapshot().status_failures, 1);
    }

    // ── Task lifecycle ──────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_refresher_disposes_without_entry() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        let refresher = LogRefresher::spawn(1, ctx.clone());
        assert!(!refresher.is_disposed());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(refresher.is_disposed());
        assert_eq!(ctx.metrics.snapshot().active_refreshers, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_follows_job_to_completion() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, mut rx) = context(&fake);
        running_job(&fake, &ctx, "building\n").await;
        let refresher = LogRefresher::spawn(1, ctx.clone());

        // First tick after the initial delay picks up the trace.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(&*ctx.cache.get(1).unwrap().raw_trace, "building\n");

        fake.append_trace(1, "done\n").await;
        fake.set_status(1, JobStatus::Failed).await;

        // Tick 2 fetches the new content, tick 3 sees no change and checks status.
        tokio::time::sleep(Duration::from_millis(6000)).await;
        assert!(!ctx.cache.get(1).unwrap().is_live());
        assert!(matches!(rx.try_recv(), Ok(JobLogEvent::JobNoLongerLive { job_id: 1, .. })));

        // Tick 4 finds the entry final.
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert!(refresher.is_disposed());
        assert_eq!(&*ctx.cache.get(1).unwrap().raw_trace, "building\ndone\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_stop_runs_after_self_dispose() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        let (tx, mut stopped) = tokio::sync::mpsc::unbounded_channel();

        let refresher = LogRefresher::spawn_with(1, ctx, move |job_id| {
            let _ = tx.send(job_id);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(refresher.is_disposed());
        assert_eq!(stopped.try_recv().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_stop_skipped_on_external_dispose() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        let (tx, mut stopped) = tokio::sync::mpsc::unbounded_channel::<JobId>();

        let refresher = LogRefresher::spawn_with(1, ctx, move |job_id| {
            let _ = tx.send(job_id);
        });
        refresher.dispose();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(stopped.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_is_idempotent() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        running_job(&fake, &ctx, "x\n").await;

        let refresher = LogRefresher::spawn(1, ctx.clone());
        refresher.dispose();
        refresher.dispose();
        assert!(refresher.is_disposed());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fake.trace_calls().await, 0);
        assert_eq!(ctx.metrics.snapshot().active_refreshers, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_disposes() {
        let fake = Arc::new(FakeTraceSource::new());
        let (ctx, _rx) = context(&fake);
        running_job(&fake, &ctx, "x\n").await;

        drop(LogRefresher::spawn(1, ctx.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fake.trace_calls().await, 0);
    }
}
