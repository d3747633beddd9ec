//! Boot: logging init, config load, state creation.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::TraceSource;
use crate::conf::JobLogConfig;
use crate::state::{JobLogState, SharedState};

/// Initialise the tracing / logging subsystem.
///
/// `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate the configuration (file or env).
pub fn load_config() -> Result<JobLogConfig, Box<dyn std::error::Error>> {
    let config = JobLogConfig::load()?;
    config.validate()?;
    Ok(config)
}

/// Build the shared state around `source`.
pub fn boot(
    source: Arc<dyn TraceSource>,
    config: JobLogConfig,
) -> Result<SharedState, Box<dyn std::error::Error>> {
    config.validate()?;
    info!(
        "Live job logs: first check after {}ms, then every {}ms",
        config.refresh.initial_delay_ms, config.refresh.interval_ms
    );

    let state = Arc::new(JobLogState::new(source, config));
    info!("Initialized shared job log state");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeTraceSource;

    #[test]
    fn test_boot_builds_state() {
        let state = boot(Arc::new(FakeTraceSource::new()), JobLogConfig::default()).unwrap();
        assert!(state.cache.is_empty());
        assert!(state.refreshers.is_empty());
    }

    #[test]
    fn test_boot_rejects_invalid_config() {
        let mut config = JobLogConfig::default();
        config.refresh.interval_ms = 0;
        assert!(boot(Arc::new(FakeTraceSource::new()), config).is_err());
    }
}
