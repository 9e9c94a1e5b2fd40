// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-ensemble-npu-plasticity` to raise one crate
//! to `debug` while everything else stays at the base level.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug, comma-separated or `all`
pub const DEBUG_ENV: &str = "ENSEMBLE_DEBUG";

/// Crates with debug logging switched on
///
/// # Example
/// ```rust
/// use ensemble_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(["--debug-ensemble-io".to_string()]);
/// assert!(flags.is_enabled("ensemble-io"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`.
    /// `--debug-all` enables every known crate.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Add crates from an `ENSEMBLE_DEBUG`-style value
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enable(crate_name);
            }
        }
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn enabled_crates(&self) -> impl Iterator<Item = &str> {
        self.enabled_crates.iter().map(String::as_str)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Directive string for `EnvFilter`
    ///
    /// Crate names are turned into tracing targets (dashes become
    /// underscores): `"warn,ensemble_io=debug"`.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut directives = vec![base_level.to_string()];
        directives.extend(
            self.enabled_crates
                .iter()
                .map(|name| format!("{}=debug", name.replace('-', "_"))),
        );
        directives.join(",")
    }
}

/// Debug flags from the process arguments and `ENSEMBLE_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    flags
}

/// Help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {env}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {env}=all                               Enable debug for all crates

Examples:
  --debug-ensemble-npu-plasticity
  {env}=ensemble-npu-burst-engine,ensemble-io
"#,
        KNOWN_CRATES.join(", "),
        env = DEBUG_ENV
    )
}
