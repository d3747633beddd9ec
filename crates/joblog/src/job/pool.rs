use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::refresher::{LogRefresher, RefreshContext};
use super::JobId;

type Refreshers = DashMap<JobId, LogRefresher>;

/// Registry of refreshers, at most one active per job.
///
/// A refresher that finds its job final removes itself from the registry.
pub struct RefresherPool {
    ctx: RefreshContext,
    refreshers: Arc<Refreshers>,
}

impl RefresherPool {
    pub fn new(ctx: RefreshContext) -> Self {
        Self {
            ctx,
            refreshers: Arc::new(DashMap::new()),
        }
    }

    fn spawn(&self, job_id: JobId) -> LogRefresher {
        let registry: Weak<Refreshers> = Arc::downgrade(&self.refreshers);
        LogRefresher::spawn_with(job_id, self.ctx.clone(), move |job_id| {
            if let Some(refreshers) = registry.upgrade() {
                // A replacement started after this one disposed is still active.
                refreshers.remove_if(&job_id, |_, refresher| refresher.is_disposed());
            }
        })
    }

    /// Start refreshing `job_id` unless an active refresher already does.
    ///
    /// A refresher that disposed itself is replaced. Returns `true` when a
    /// new refresher was spawned. Must be called from within a tokio runtime.
    pub fn start_refreshing(&self, job_id: JobId) -> bool {
        match self.refreshers.entry(job_id) {
            Entry::Occupied(entry) if !entry.get().is_disposed() => false,
            Entry::Occupied(mut entry) => {
                debug!(job_id, "Replacing finished log refresher");
                entry.insert(self.spawn(job_id));
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(self.spawn(job_id));
                true
            }
        }
    }

    /// Dispose the refresher of `job_id`, if any.
    pub fn stop_refreshing(&self, job_id: JobId) {
        // Dropping the handle disposes the task.
        self.refreshers.remove(&job_id);
    }

    pub fn stop_all(&self) {
        self.refreshers.clear();
    }

    pub fn is_refreshing(&self, job_id: JobId) -> bool {
        self.refreshers
            .get(&job_id)
            .is_some_and(|refresher| !refresher.is_disposed())
    }

    /// Forget refreshers that have disposed themselves but are still
    /// registered. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.refreshers.len();
        self.refreshers.retain(|_, refresher| !refresher.is_disposed());
        before - self.refreshers.len()
    }

    pub fn len(&self) -> usize {
        self.refreshers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refreshers.is_empty()
    }
}
