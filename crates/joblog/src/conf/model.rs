//! Model: JobLogConfig and its sections.

use serde::{Deserialize, Serialize};

use crate::parser::ParserOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobLogConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub refresh: RefreshSettings,
    pub render: RenderSettings,
}

/// Poll cadence of live job logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Treat SGR 21 as double underline rather than "bold off".
    pub double_underline: bool,
}

impl Default for JobLogConfig {
    fn default() -> Self {
        Self {
            log_filter: "joblog=info".to_string(),
            refresh: RefreshSettings::default(),
            render: RenderSettings::default(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 10,
            interval_ms: 3000,
        }
    }
}

impl RefreshSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err("refresh.interval_ms must be > 0".to_string());
        }
        Ok(())
    }
}

impl RenderSettings {
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            double_underline: self.double_underline,
        }
    }
}
