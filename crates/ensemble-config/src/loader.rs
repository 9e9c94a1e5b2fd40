// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, EnsembleConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "ensemble_configuration.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "ENSEMBLE_CONFIG_PATH";

/// Find the ensemble configuration file
///
/// Search order:
/// 1. `ENSEMBLE_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML.
/// Call [`validate_config`](crate::validate_config) on the result before use.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<EnsembleConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: EnsembleConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = {:?}", name, value)))
}

/// `unbounded` (or `u32::MAX`) clears the run length
fn parse_run_ticks(name: &str, value: &str) -> ConfigResult<Option<u32>> {
    if value.trim().eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    let ticks: u32 = parse_override(name, value)?;
    Ok((ticks != u32::MAX).then_some(ticks))
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ENSEMBLE_MACHINE_TIMESTEP_US` -> `system.machine_timestep_us`
/// - `ENSEMBLE_RUN_TICKS` -> `system.run_ticks`
/// - `ENSEMBLE_TRANSMISSION_DELAY` -> `transmitter.transmission_delay`
/// - `ENSEMBLE_LOG_LEVEL` -> `logging.level`
///
/// # Errors
///
/// A variable that is set but does not parse is an error rather than ignored.
pub fn apply_environment_overrides(config: &mut EnsembleConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("ENSEMBLE_MACHINE_TIMESTEP_US") {
        config.system.machine_timestep_us =
            parse_override("ENSEMBLE_MACHINE_TIMESTEP_US", &value)?;
    }
    if let Ok(value) = env::var("ENSEMBLE_RUN_TICKS") {
        config.system.run_ticks = parse_run_ticks("ENSEMBLE_RUN_TICKS", &value)?;
    }
    if let Ok(value) = env::var("ENSEMBLE_TRANSMISSION_DELAY") {
        config.transmitter.transmission_delay =
            parse_override("ENSEMBLE_TRANSMISSION_DELAY", &value)?;
    }
    if let Ok(value) = env::var("ENSEMBLE_LOG_LEVEL") {
        config.logging.level = value;
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - CLI arguments keyed without dashes, e.g. `{"run_ticks": "1000"}`
///
/// Recognised keys: `machine_timestep_us`, `run_ticks`, `transmission_delay`,
/// `log_level`, `host`, `port`.
pub fn apply_cli_overrides(
    config: &mut EnsembleConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("machine_timestep_us") {
        config.system.machine_timestep_us = parse_override("machine_timestep_us", value)?;
    }
    if let Some(value) = cli_args.get("run_ticks") {
        config.system.run_ticks = parse_run_ticks("run_ticks", value)?;
    }
    if let Some(value) = cli_args.get("transmission_delay") {
        config.transmitter.transmission_delay = parse_override("transmission_delay", value)?;
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("host") {
        config.transmitter.host = value.clone();
    }
    if let Some(value) = cli_args.get("port") {
        config.transmitter.port = parse_override("port", value)?;
    }
    Ok(())
}
