//! App state: JobLogState struct, shared state type alias.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::JobLogEvent;
use crate::client::TraceSource;
use crate::conf::JobLogConfig;
use crate::job::cache::LogCache;
use crate::job::metrics::RefreshMetrics;
use crate::job::pool::RefresherPool;
use crate::job::refresher::{RefreshConfig, RefreshContext};
use crate::parser::ParserOptions;

const EVENT_CAPACITY: usize = 64;

pub struct JobLogState {
    pub config: JobLogConfig,
    pub cache: Arc<LogCache>,
    pub source: Arc<dyn TraceSource>,
    pub events: broadcast::Sender<JobLogEvent>,
    pub metrics: Arc<RefreshMetrics>,
    pub refreshers: RefresherPool,
}

impl JobLogState {
    pub fn new(source: Arc<dyn TraceSource>, config: JobLogConfig) -> Self {
        let cache = Arc::new(LogCache::new());
        let metrics = Arc::new(RefreshMetrics::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let refreshers = RefresherPool::new(RefreshContext {
            cache: Arc::clone(&cache),
            source: Arc::clone(&source),
            events: events.clone(),
            config: RefreshConfig::from(&config.refresh),
            metrics: Arc::clone(&metrics),
        });

        Self {
            config,
            cache,
            source,
            events,
            metrics,
            refreshers,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobLogEvent> {
        self.events.subscribe()
    }

    pub fn parser_options(&self) -> ParserOptions {
        self.config.render.parser_options()
    }
}

pub type SharedState = Arc<JobLogState>;
