use crate::data::{window, RetryPolicy, Symbol, EXMO_TICKER_URL};
use crate::error::ConfigError;
use crate::pipeline::SessionSettings;
use crate::ui::PlotOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(RetryPolicy::default())
    }
}

impl From<RetryPolicy> for RetryConfig {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub cadence_ms: u64,
    pub request_timeout_ms: u64,
    pub history_capacity: usize,
    pub chart: PlotOptions,
    pub retry: RetryConfig,
    pub log_file: PathBuf,
    pub last_symbol: Option<Symbol>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: EXMO_TICKER_URL.to_string(),
            cadence_ms: 1_000,
            request_timeout_ms: 5_000,
            history_capacity: window::DEFAULT_CAPACITY,
            chart: PlotOptions::default(),
            retry: RetryConfig::default(),
            log_file: PathBuf::from("tickerplot.log"),
            last_symbol: None,
        }
    }
}

impl AppConfig {
    pub fn sanitized(mut self) -> Self {
        if self.endpoint.trim().is_empty() {
            self.endpoint = EXMO_TICKER_URL.to_string();
        }

        self.cadence_ms = self.cadence_ms.clamp(100, 60_000);
        self.request_timeout_ms = self.request_timeout_ms.clamp(100, 60_000);
        self.history_capacity = self.history_capacity.clamp(1, 10_000);
        self.chart.width = self.chart.width.min(1_000);
        self.chart.height = self.chart.height.clamp(1, 50);
        self.chart.precision = self.chart.precision.min(8);
        self.retry.max_attempts = self.retry.max_attempts.clamp(1, 10);
        self.retry.base_delay_ms = self.retry.base_delay_ms.clamp(10, 10_000);
        self.retry.max_delay_ms = self
            .retry
            .max_delay_ms
            .clamp(self.retry.base_delay_ms, 60_000);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            cadence: Duration::from_millis(self.cadence_ms),
            capacity: self.history_capacity,
            retry: self.retry.policy(),
            plot: self.chart,
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("TICKERPLOT_CONFIG") {
        return PathBuf::from(path);
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".tickerplot.json")
}

/// Reads the config file; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(e) => return Err(e.into()),
    };

    let config = serde_json::from_str::<AppConfig>(&contents)?;
    Ok(config.sanitized())
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let payload = serde_json::to_string_pretty(config)?;
    std::fs::write(path, payload)?;
    Ok(())
}

/// Where settings are written back. A file that exists but could not be
/// loaded is never overwritten, so the user can still repair it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    writable: bool,
}

impl ConfigStore {
    pub fn new(path: PathBuf, writable: bool) -> Self {
        Self { path, writable }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `false` when the store is read-only and nothing was written.
    pub fn save(&self, config: &AppConfig) -> Result<bool, ConfigError> {
        if !self.writable {
            return Ok(false);
        }
        save_config(&self.path, config)?;
        Ok(true)
    }
}
