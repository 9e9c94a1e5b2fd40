// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature and a log
//! directory, also a daily-rolling file inside a timestamped run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── ensemble.log
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// How logging should be set up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Base level for crates without a debug flag
    pub level: String,
    /// Base directory for run folders; `None` logs to the console only
    pub log_dir: Option<PathBuf>,
    /// Run folders to keep, oldest removed first
    pub retention_runs: usize,
    pub ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            retention_runs: 10,
            ansi: true,
        }
    }
}

/// Keeps file writers alive; logs are flushed when it is dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder receiving log files, if any
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// `EnvFilter` for the base level plus every debug flag
///
/// # Errors
///
/// Fails if `level` is not a valid filter directive.
pub fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter: {}", directives))
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails on a bad level, when the log folder cannot be created, or when a
/// global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let filter = build_filter(debug_flags, &options.level)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(options.ansi)
        .with_filter(filter)
        .boxed();
    #[cfg_attr(not(feature = "file-logging"), allow(unused_mut))]
    let mut layers = vec![console_layer];

    #[cfg(feature = "file-logging")]
    let (file_guard, log_dir) = match &options.log_dir {
        Some(base) => {
            let run_folder = create_run_folder(base)?;
            cleanup_old_runs(base, options.retention_runs)?;

            let appender = tracing_appender::rolling::daily(&run_folder, "ensemble.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(build_filter(debug_flags, &options.level)?)
                    .boxed(),
            );
            (Some(guard), Some(run_folder))
        }
        None => (None, None),
    };

    #[cfg(not(feature = "file-logging"))]
    let log_dir = {
        if let Some(base) = &options.log_dir {
            eprintln!(
                "Log directory {} ignored: built without file-logging",
                base.display()
            );
        }
        None
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guard: file_guard,
        log_dir,
    })
}

/// Console logging at `info` plus flags from the environment
pub fn init_logging_default() -> Result<LoggingGuard> {
    init_logging(&crate::cli::parse_debug_flags(), &LoggingOptions::default())
}

#[cfg(feature = "file-logging")]
fn create_run_folder(base: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_folder = base.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    Ok(run_folder)
}

/// Remove all but the newest `keep` run folders
#[cfg(feature = "file-logging")]
fn cleanup_old_runs(base: &Path, keep: usize) -> Result<()> {
    let mut runs: Vec<(PathBuf, chrono::NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run_"))
            .and_then(|s| chrono::NaiveDateTime::parse_from_str(s, "%Y%m%d_%H%M%S").ok());
        if let Some(stamp) = stamp {
            runs.push((path, stamp));
        }
    }

    runs.sort_by_key(|(_, stamp)| *stamp);
    let excess = runs.len().saturating_sub(keep);
    for (path, _) in runs.iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }
    Ok(())
}
