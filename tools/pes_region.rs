// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
PES Region Builder

Reads an ensemble configuration, validates it, checks the learning rules
against the ensemble shape exactly as boot would, and writes the PES region
block the runtime loads.

Usage:
  cargo run --bin pes_region -- <output.bin> [config.toml] [--debug-<crate>]

Without a config path the file is discovered via ENSEMBLE_CONFIG_PATH or by
searching upwards for ensemble_configuration.toml.
*/

use anyhow::{bail, Context, Result};
use nengo_ensemble::observability::{init_logging, parse_debug_flags, LoggingOptions};
use nengo_ensemble::runtime::FilterCollection;
use nengo_ensemble::{build, load_config, PesRegistry};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    let positional: Vec<String> = env::args()
        .skip(1)
        .filter(|arg| !arg.starts_with("--"))
        .collect();
    let (output, config_path) = match positional.as_slice() {
        [output] => (PathBuf::from(output), None),
        [output, config] => (PathBuf::from(output), Some(PathBuf::from(config))),
        _ => bail!("Usage: pes_region <output.bin> [config.toml] [--debug-<crate>]"),
    };

    let config = load_config(config_path.as_deref(), None).context("Failed to load config")?;
    let _guard = init_logging(
        &parse_debug_flags(),
        &LoggingOptions {
            level: config.logging.level.clone(),
            log_dir: (!config.logging.log_dir.as_os_str().is_empty())
                .then(|| config.logging.log_dir.clone()),
            ansi: config.logging.ansi,
            ..LoggingOptions::default()
        },
    )?;

    let built = build(&config)?;
    let params = &built.ensemble;

    // Same checks the runtime performs at boot
    let registry = PesRegistry::initialise(&params.pes_region)?;
    let modulatory = FilterCollection::new(&params.modulatory_filters, &params.modulatory_routes)?;
    registry.validate(
        params.n_dimensions as usize,
        &modulatory,
        params.activity_filter_count as usize,
    )?;

    fs::write(&output, &params.pes_region)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "[PES] Wrote {} rules ({} bytes) to {}",
        registry.len(),
        params.pes_region.len(),
        output.display()
    );

    let summary = serde_json::json!({
        "output": output.display().to_string(),
        "bytes": params.pes_region.len(),
        "rules": registry.rules().iter().map(|rule| serde_json::json!({
            "learning_rate": rule.learning_rate.to_f64(),
            "error_channel": rule.error_channel_index(),
            "decoder_row": rule.decoder_row,
            "activity_filter_index": rule.activity_mode.to_index(),
        })).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
