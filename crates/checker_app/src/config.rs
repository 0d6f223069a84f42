//! RON configuration file plus command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use checker_engine::{ClientSettings, DashboardSettings, DEFAULT_BASE_URL};
use checker_logging::checker_info;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILE: &str = "checker.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_report_bytes: u64,
    pub refresh_interval_ms: u64,
    pub recent_events_count: usize,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let dashboard = DashboardSettings::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: millis(client.poll_interval),
            max_poll_attempts: client.max_poll_attempts,
            connect_timeout_ms: millis(client.connect_timeout),
            request_timeout_ms: millis(client.request_timeout),
            max_report_bytes: client.max_report_bytes,
            refresh_interval_ms: millis(dashboard.refresh_interval),
            recent_events_count: dashboard.recent_events_count,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    /// Loads `explicit` (which must exist), else `./checker.ron` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        checker_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir = output_dir.clone();
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_poll_attempts: self.max_poll_attempts,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_report_bytes: self.max_report_bytes,
        }
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            refresh_interval: Duration::from_millis(self.refresh_interval_ms),
            recent_events_count: self.recent_events_count,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_match_engine_settings() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.max_poll_attempts, 30);
        assert_eq!(config.refresh_interval_ms, 10_000);
        assert_eq!(config.recent_events_count, 20);
        assert_eq!(
            config.client_settings().poll_interval,
            Duration::from_secs(3)
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config =
            AppConfig::parse(r#"(base_url: "https://checks.example.org", max_poll_attempts: 10)"#)
                .unwrap();
        assert_eq!(config.base_url, "https://checks.example.org");
        assert_eq!(config.max_poll_attempts, 10);
        assert_eq!(config.poll_interval_ms, 3000);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(AppConfig::load(Some(&temp.path().join("nope.ron"))).is_err());
    }

    #[test]
    fn explicit_file_is_loaded() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.ron");
        fs::write(&path, "(refresh_interval_ms: 500)").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.dashboard_settings().refresh_interval, Duration::from_millis(500));
    }

    #[test]
    fn command_line_wins_over_file() {
        let mut config = AppConfig::parse(r#"(base_url: "http://from-file")"#).unwrap();
        let cli = Cli::parse_from([
            "factcheck",
            "--base-url",
            "http://from-cli",
            "--output-dir",
            "reports",
            "report",
        ]);
        config.apply_overrides(&cli);
        assert_eq!(config.base_url, "http://from-cli");
        assert_eq!(config.output_dir, PathBuf::from("reports"));
    }
}
