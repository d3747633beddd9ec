//! View: what the editor asks of a job log.
//!
//! Rendering is memoized in the cache. Anything read before an `.await`
//! is re-read from the cache afterwards, since a refresher may have
//! replaced the entry in between.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::uri::JobLogUri;
use super::{JobId, JobLogError};
use crate::logs::{folding_regions, render, FoldingRegion, RenderedLog};
use crate::state::JobLogState;

impl JobLogState {
    /// The rendered trace of `job_id`, if it is cached.
    pub fn rendered_log(&self, job_id: JobId) -> Option<Arc<RenderedLog>> {
        let item = self.cache.get(job_id)?;
        if let Some(rendered) = item.rendered {
            return Some(rendered);
        }

        let is_running = item.sync_token.is_some();
        let rendered = Arc::new(render(&item.raw_trace, is_running, self.parser_options()));
        self.cache.add_decorations(job_id, &item.raw_trace, Arc::clone(&rendered));
        Some(rendered)
    }

    pub fn folding_regions(&self, job_id: JobId) -> Vec<FoldingRegion> {
        self.rendered_log(job_id)
            .map(|rendered| folding_regions(&rendered.sections))
            .unwrap_or_default()
    }

    /// The filtered text of the document addressed by `uri`.
    ///
    /// On a cache miss the trace is fetched; a running job is then kept
    /// fresh by a refresher.
    pub async fn document_content(&self, uri: &JobLogUri) -> Result<String, JobLogError> {
        let job_id = uri.job;
        if self.cache.get(job_id).is_none() {
            info!(job_id, "Job log not cached, fetching trace");
            self.fetch_into_cache(uri).await?;
        }

        self.rendered_log(job_id)
            .map(|rendered| rendered.filtered_text.clone())
            .ok_or(JobLogError::TraceUnavailable(job_id))
    }

    /// [`Self::document_content`] for an encoded locator.
    pub async fn document_content_at(&self, locator: &str) -> Result<String, JobLogError> {
        let uri = JobLogUri::decode(locator)?;
        self.document_content(&uri).await
    }

    async fn fetch_into_cache(&self, uri: &JobLogUri) -> Result<(), JobLogError> {
        let (root, job_id) = (uri.repository_root.as_str(), uri.job);
        let increment = self
            .source
            .job_trace(root, job_id, None)
            .await?
            .ok_or(JobLogError::TraceUnavailable(job_id))?;
        let status = self.source.job_status(root, job_id).await?;

        if status.is_running() {
            self.cache
                .set_for_running(root, job_id, &increment.raw_trace, increment.sync_token);
            self.refreshers.start_refreshing(job_id);
        } else {
            self.cache.set(job_id, &increment.raw_trace);
        }
        Ok(())
    }

    /// Write the raw trace, escape sequences and all, to `path`.
    pub async fn export_raw_trace(
        &self,
        uri: &JobLogUri,
        path: impl AsRef<Path>,
    ) -> Result<(), JobLogError> {
        let job_id = uri.job;
        let raw_trace: Arc<str> = match self.cache.get(job_id) {
            Some(item) => item.raw_trace,
            None => {
                let increment = self
                    .source
                    .job_trace(&uri.repository_root, job_id, None)
                    .await?
                    .ok_or(JobLogError::TraceUnavailable(job_id))?;
                Arc::from(increment.raw_trace)
            }
        };

        let path = path.as_ref();
        tokio::fs::write(path, raw_trace.as_bytes()).await?;
        info!(job_id, "Saved raw job trace to {}", path.display());
        Ok(())
    }
}
