#![deny(missing_docs)]
//! Shared logging utilities for the fact-check client workspace.
//!
//! This crate provides the `checker_*` logging macros used across the codebase,
//! the logger initialization used by the `factcheck` binary, and a minimal test
//! initializer for the global logger.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Default log file name, relative to the current working directory.
pub const DEFAULT_LOG_FILE: &str = "checker.log";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! checker_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! checker_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! checker_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! checker_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! checker_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the given file, truncating it.
    File(PathBuf),
    /// Write to the terminal (stderr for warnings and errors).
    Terminal,
    /// Write to both the given file and the terminal.
    Both(PathBuf),
}

/// Initialize the global logger with the specified destination and level.
///
/// A file that cannot be created is reported on stderr and skipped; the
/// remaining loggers are still installed. Calling this twice is harmless.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File(path) => create_file_logger(&path, level, config)
            .map(|logger| vec![logger as Box<dyn SharedLogger>])
            .unwrap_or_default(),
        LogDestination::Terminal => vec![term_logger(level, config)],
        LogDestination::Both(path) => {
            let mut loggers = vec![term_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(&path, level, config) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    if loggers.is_empty() {
        return;
    }
    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn term_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_file_is_skipped() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing_parent = temp.path().join("missing").join("checker.log");
        assert!(create_file_logger(&missing_parent, LevelFilter::Info, build_config()).is_none());
    }

    #[test]
    fn file_logger_creates_the_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_LOG_FILE);
        assert!(create_file_logger(&path, LevelFilter::Info, build_config()).is_some());
        assert!(path.is_file());
    }
}
