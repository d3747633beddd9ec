//! Load: config loading from file and environment variables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::JobLogConfig;

const DEFAULT_CONFIG_FILE: &str = "/etc/joblog/config.toml";

impl JobLogConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("JOBLOG_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&config_path).exists() {
            tracing::debug!(
                "Config file not found at {}, using environment variables",
                config_path
            );
            return Ok(Self::from_env());
        }

        tracing::info!("Loading configuration from: {}", config_path);
        let mut config = Self::from_file(&config_path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: JobLogConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Apply `JOBLOG_*` overrides; unparsable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(filter) = lookup("JOBLOG_LOG") {
            self.log_filter = filter;
        }
        if let Some(interval) = lookup("JOBLOG_REFRESH_INTERVAL_MS").and_then(|s| s.parse().ok()) {
            self.refresh.interval_ms = interval;
        }
        if let Some(delay) = lookup("JOBLOG_INITIAL_DELAY_MS").and_then(|s| s.parse().ok()) {
            self.refresh.initial_delay_ms = delay;
        }
        if let Some(double) = lookup("JOBLOG_DOUBLE_UNDERLINE").and_then(|s| s.parse().ok()) {
            self.render.double_underline = double;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.log_filter.trim().is_empty() {
            return Err("log_filter must not be empty".to_string());
        }
        self.refresh.validate()?;
        Ok(())
    }
}
