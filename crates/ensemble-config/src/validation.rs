// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that values are within range and consistent with each other
//! before anything is built from them. Every violation is collected so a
//! single run reports all of them.

use crate::{ConfigError, ConfigResult, EnsembleConfig};

/// Largest vector a single SDP message carries
const MAX_SDP_DIMENSIONS: u32 = 64;

/// Error channels and their dimensions are each addressed by one key byte
const MAX_ERROR_CHANNELS: usize = 256;
const MAX_ERROR_WIDTH: u32 = 256;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    KeyConflict { first: String, second: String, key: u32 },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::KeyConflict { first, second, key } => {
                write!(
                    f,
                    "Key conflict: {} and {} both use key {:#010x}",
                    first, second, key
                )
            }
        }
    }
}

fn invalid(errors: &mut Vec<ConfigValidationError>, field: impl Into<String>, reason: &str) {
    errors.push(ConfigValidationError::InvalidValue {
        field: field.into(),
        reason: reason.to_string(),
    });
}

/// Validate the complete configuration
///
/// Checks for:
/// - Timing (non-zero timestep and transmission delay)
/// - Ensemble shape (populations, decoder size, filter time constants)
/// - Packet key prefixes (distinct under the key mask)
/// - Learning rules against the ensemble shape
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation found
pub fn validate_config(config: &EnsembleConfig) -> ConfigResult<()> {
    let errors = collect_violations(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every violation in `config`, in section order
pub fn collect_violations(config: &EnsembleConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_timing(config, &mut errors);
    validate_ensemble(config, &mut errors);
    validate_keys(config, &mut errors);
    validate_rules(config, &mut errors);
    validate_transmitter(config, &mut errors);
    errors
}

fn validate_timing(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.system.machine_timestep_us == 0 {
        invalid(errors, "system.machine_timestep_us", "must be positive");
    }
    if config.system.run_ticks == Some(u32::MAX) {
        invalid(
            errors,
            "system.run_ticks",
            "4294967295 is reserved; omit run_ticks to run until stopped",
        );
    }
}

fn validate_ensemble(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    let ensemble = &config.ensemble;
    if ensemble.population_lengths.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "ensemble.population_lengths".to_string(),
        });
    }
    if ensemble.n_dimensions == 0 {
        invalid(errors, "ensemble.n_dimensions", "must be positive");
    }
    if ensemble.input_dimensions == 0 {
        invalid(errors, "ensemble.input_dimensions", "must be positive");
    }
    if !ensemble.decoder.is_empty() {
        let expected = u64::from(ensemble.n_dimensions) * ensemble.n_neurons();
        if ensemble.decoder.len() as u64 != expected {
            errors.push(ConfigValidationError::InvalidValue {
                field: "ensemble.decoder".to_string(),
                reason: format!(
                    "has {} values, n_dimensions x neurons = {}",
                    ensemble.decoder.len(),
                    expected
                ),
            });
        }
    }
    if ensemble.error_widths.len() > MAX_ERROR_CHANNELS {
        invalid(errors, "ensemble.error_widths", "at most 256 error channels");
    }
    if ensemble
        .error_widths
        .iter()
        .any(|&w| w == 0 || w > MAX_ERROR_WIDTH)
    {
        invalid(
            errors,
            "ensemble.error_widths",
            "every channel needs between 1 and 256 dimensions",
        );
    }
    for (field, tau) in [
        ("ensemble.input_tau_s", ensemble.input_tau_s),
        ("ensemble.error_tau_s", ensemble.error_tau_s),
    ] {
        if !(tau >= 0.0 && tau.is_finite()) {
            invalid(errors, field, "must be a non-negative number of seconds");
        }
    }
}

fn validate_keys(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    let ensemble = &config.ensemble;
    let mask = ensemble.key_mask;
    if mask == 0 {
        invalid(errors, "ensemble.key_mask", "must select at least one bit");
    }
    if mask & 0x0000_FFFF != 0 {
        invalid(
            errors,
            "ensemble.key_mask",
            "low 16 bits are reserved for channel and dimension",
        );
    }

    let keys = [
        ("ensemble.input_key", ensemble.input_key),
        ("ensemble.error_key", ensemble.error_key),
        ("ensemble.output_key", ensemble.output_key),
    ];
    for (field, key) in keys {
        if key & !mask != 0 {
            invalid(errors, field, "has bits outside key_mask");
        }
    }
    for i in 0..keys.len() {
        for j in i + 1..keys.len() {
            if keys[i].1 & mask == keys[j].1 & mask {
                errors.push(ConfigValidationError::KeyConflict {
                    first: keys[i].0.to_string(),
                    second: keys[j].0.to_string(),
                    key: keys[i].1,
                });
            }
        }
    }
}

fn validate_rules(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    let ensemble = &config.ensemble;
    for (index, rule) in config.learning.rules.iter().enumerate() {
        let field = |name: &str| format!("learning.rules[{}].{}", index, name);

        if !rule.learning_rate.is_finite() {
            invalid(errors, field("learning_rate"), "must be finite");
        }

        let instantaneous = rule.activity_filter_index == -1;
        match rule.error_channel {
            -1 if instantaneous => invalid(
                errors,
                field("error_channel"),
                "instantaneous rules need an error channel",
            ),
            -1 => {}
            channel if channel < 0 => invalid(errors, field("error_channel"), "must be >= -1"),
            channel => match ensemble.error_widths.get(channel as usize) {
                None => invalid(
                    errors,
                    field("error_channel"),
                    "refers to an error channel that does not exist",
                ),
                Some(&width) => {
                    let end = u64::from(rule.decoder_row) + u64::from(width);
                    if end > u64::from(ensemble.n_dimensions) {
                        invalid(
                            errors,
                            field("decoder_row"),
                            "error rows run past the end of the decoder",
                        );
                    }
                }
            },
        }

        if rule.activity_filter_index < -1 {
            invalid(errors, field("activity_filter_index"), "must be >= -1");
        } else if !instantaneous
            && rule.activity_filter_index as u32 >= ensemble.activity_filter_count
        {
            invalid(
                errors,
                field("activity_filter_index"),
                "refers to an activity filter that does not exist",
            );
        }
    }
}

fn validate_transmitter(config: &EnsembleConfig, errors: &mut Vec<ConfigValidationError>) {
    let transmitter = &config.transmitter;
    if !transmitter.enabled {
        return;
    }
    if transmitter.transmission_delay == 0 {
        invalid(errors, "transmitter.transmission_delay", "must be at least 1");
    }
    if config.ensemble.n_dimensions > MAX_SDP_DIMENSIONS {
        invalid(
            errors,
            "ensemble.n_dimensions",
            "exceeds the 64 values one SDP message carries",
        );
    }
    if transmitter.host.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "transmitter.host".to_string(),
        });
    }
    if !(transmitter.input_tau_s >= 0.0 && transmitter.input_tau_s.is_finite()) {
        invalid(
            errors,
            "transmitter.input_tau_s",
            "must be a non-negative number of seconds",
        );
    }
}
