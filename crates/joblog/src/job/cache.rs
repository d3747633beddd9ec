use std::sync::Arc;

use dashmap::DashMap;

use super::JobId;
use crate::logs::RenderedLog;

/// What the cache knows about one job.
///
/// Cloning is cheap: the trace and the rendered output are shared.
#[derive(Debug, Clone)]
pub struct CacheItem {
    pub raw_trace: Arc<str>,
    /// Token of the last fetch. `None` once the trace is final.
    pub sync_token: Option<String>,
    /// Set only while the job is being refreshed.
    pub repository_root: Option<String>,
    /// Rendering of `raw_trace`, filled in lazily.
    pub rendered: Option<Arc<RenderedLog>>,
}

impl CacheItem {
    fn new(raw_trace: &str) -> Self {
        Self {
            raw_trace: Arc::from(raw_trace),
            sync_token: None,
            repository_root: None,
            rendered: None,
        }
    }

    /// A live entry is one a refresher still owns.
    pub fn is_live(&self) -> bool {
        self.repository_root.is_some()
    }
}

/// Per-job trace cache
///
/// Every write replaces the whole item, so a rendering attached to an item
/// always belongs to that item's trace.
#[derive(Debug, Default)]
pub struct LogCache {
    items: DashMap<JobId, CacheItem>,
}

impl LogCache {
    pub fn new() -> Self {
        Self { items: DashMap::new() }
    }

    /// Store a final trace. Drops the sync token and the repository root.
    pub fn set(&self, id: JobId, raw_trace: &str) {
        self.items.insert(id, CacheItem::new(raw_trace));
    }

    /// Store the trace of a job that is still running.
    pub fn set_for_running(
        &self,
        repository_root: &str,
        id: JobId,
        raw_trace: &str,
        sync_token: String,
    ) {
        self.items.insert(
            id,
            CacheItem {
                sync_token: Some(sync_token),
                repository_root: Some(repository_root.to_string()),
                ..CacheItem::new(raw_trace)
            },
        );
    }

    pub fn get(&self, id: JobId) -> Option<CacheItem> {
        self.items.get(&id).map(|r| r.clone())
    }

    /// Attach `rendered`, computed from `source`, to the current item.
    ///
    /// No-op when the item is gone or its trace is no longer `source`.
    pub fn add_decorations(&self, id: JobId, source: &Arc<str>, rendered: Arc<RenderedLog>) {
        if let Some(mut item) = self.items.get_mut(&id) {
            if Arc::ptr_eq(&item.raw_trace, source) {
                item.rendered = Some(rendered);
            }
        }
    }

    pub fn remove(&self, id: JobId) -> Option<CacheItem> {
        self.items.remove(&id).map(|(_, item)| item)
    }

    pub fn clear_all(&self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::render;
    use crate::parser::ParserOptions;

    fn rendered(raw: &str) -> Arc<RenderedLog> {
        Arc::new(render(raw, false, ParserOptions::default()))
    }

    #[test]
    fn test_set_is_final() {
        let cache = LogCache::new();
        cache.set(1, "t1");

        let item = cache.get(1).unwrap();
        assert_eq!(&*item.raw_trace, "t1");
        assert_eq!(item.sync_token, None);
        assert!(!item.is_live());
    }

    #[test]
    fn test_set_for_running_replaces() {
        let cache = LogCache::new();
        cache.set(1, "t1");
        cache.set_for_running("/r", 1, "t2", "tok".to_string());

        let item = cache.get(1).unwrap();
        assert_eq!(&*item.raw_trace, "t2");
        assert_eq!(item.sync_token.as_deref(), Some("tok"));
        assert_eq!(item.repository_root.as_deref(), Some("/r"));
        assert!(item.rendered.is_none());
    }

    #[test]
    fn test_demotion_clears_live_state() {
        let cache = LogCache::new();
        cache.set_for_running("/r", 1, "t", "tok".to_string());
        let old = cache.get(1).unwrap().raw_trace;
        cache.set(1, &old);

        let item = cache.get(1).unwrap();
        assert_eq!(item.repository_root, None);
        assert_eq!(item.sync_token, None);
    }

    #[test]
    fn test_add_decorations() {
        let cache = LogCache::new();
        cache.set(1, "hello");
        let source = cache.get(1).unwrap().raw_trace;
        cache.add_decorations(1, &source, rendered("hello"));

        let item = cache.get(1).unwrap();
        assert_eq!(item.rendered.unwrap().filtered_text, "hello\n");
    }

    #[test]
    fn test_add_decorations_missing_item() {
        let cache = LogCache::new();
        let source: Arc<str> = Arc::from("x");
        cache.add_decorations(9, &source, rendered("x"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stale_decorations_dropped() {
        let cache = LogCache::new();
        cache.set(1, "old");
        let stale = cache.get(1).unwrap().raw_trace;
        cache.set(1, "new");

        cache.add_decorations(1, &stale, rendered("old"));
        assert!(cache.get(1).unwrap().rendered.is_none());
    }

    #[test]
    fn test_replace_clears_decorations() {
        let cache = LogCache::new();
        cache.set(1, "a");
        let source = cache.get(1).unwrap().raw_trace;
        cache.add_decorations(1, &source, rendered("a"));
        cache.set_for_running("/r", 1, "ab", "tok".to_string());

        assert!(cache.get(1).unwrap().rendered.is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = LogCache::new();
        cache.set(1, "a");
        cache.set(2, "b");
        assert_eq!(cache.len(), 2);

        assert!(cache.remove(1).is_some());
        assert!(cache.get(1).is_none());

        cache.clear_all();
        assert!(cache.is_empty());
    }
}
