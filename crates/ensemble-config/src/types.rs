// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `ensemble_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub system: SystemConfig,
    pub ensemble: EnsembleSection,
    pub learning: LearningConfig,
    pub transmitter: TransmitterConfig,
    pub logging: LoggingConfig,
}

/// Timing and placement of the core
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Timer period; every tick must finish within it
    pub machine_timestep_us: u32,
    /// Ticks per run; absent means run until stopped
    pub run_ticks: Option<u32>,
    /// P2P address of the chip the transmitter reports from
    pub p2p_addr: u16,
    pub core_id: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            machine_timestep_us: 1000,
            run_ticks: None,
            p2p_addr: 0,
            core_id: 1,
        }
    }
}

impl SystemConfig {
    /// Seconds per tick
    pub fn dt_s(&self) -> f64 {
        f64::from(self.machine_timestep_us) * 1e-6
    }
}

/// Shape of the ensemble and how packets reach it
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnsembleSection {
    /// Neurons per population, in column order
    pub population_lengths: Vec<u32>,
    pub n_dimensions: u32,
    /// Width of the input vector fed to the neuron model
    pub input_dimensions: u32,
    /// Row-major initial decoder; empty means zeros
    pub decoder: Vec<f64>,
    /// Key prefix for input vector packets
    pub input_key: u32,
    /// Key prefix for error (modulatory) packets; channel `c` uses
    /// `error_key | c << 8` and carries its dimension in the low byte
    pub error_key: u32,
    /// Key prefix for the decoded output
    pub output_key: u32,
    /// Mask applied to incoming keys before comparison with a prefix
    pub key_mask: u32,
    pub input_tau_s: f64,
    pub error_tau_s: f64,
    /// Width of each error channel (one modulatory filter each)
    pub error_widths: Vec<u32>,
    pub activity_filter_count: u32,
}

impl Default for EnsembleSection {
    fn default() -> Self {
        Self {
            population_lengths: vec![100],
            n_dimensions: 1,
            input_dimensions: 1,
            decoder: Vec::new(),
            input_key: 0x0001_0000,
            error_key: 0x0002_0000,
            output_key: 0x0003_0000,
            key_mask: 0xFFFF_0000,
            input_tau_s: 0.005,
            error_tau_s: 0.005,
            error_widths: vec![1],
            activity_filter_count: 0,
        }
    }
}

impl EnsembleSection {
    pub fn n_neurons(&self) -> u64 {
        self.population_lengths.iter().map(|&n| u64::from(n)).sum()
    }
}

/// PES learning rules, in region order
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LearningConfig {
    pub rules: Vec<LearningRuleConfig>,
}

/// One `[[learning.rules]]` entry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LearningRuleConfig {
    pub learning_rate: f64,
    /// Modulatory filter holding the error; -1 only for filtered-activity rules
    pub error_channel: i32,
    /// First decoder row the error applies to
    pub decoder_row: u32,
    /// -1 learns from instantaneous spikes
    pub activity_filter_index: i32,
}

impl Default for LearningRuleConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-4,
            error_channel: 0,
            decoder_row: 0,
            activity_filter_index: -1,
        }
    }
}

/// SDP transmitter settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransmitterConfig {
    pub enabled: bool,
    /// Ticks between messages to the host
    pub transmission_delay: u32,
    pub input_tau_s: f64,
    /// Host listener for the IP tag
    pub host: String,
    pub port: u16,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transmission_delay: 10,
            input_tau_s: 0.005,
            host: "127.0.0.1".to_string(),
            port: 50007,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Directory for rolling log files; empty disables file logging
    pub log_dir: PathBuf,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::new(),
            ansi: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_take_defaults() {
        let config: EnsembleConfig = toml::from_str(
            r#"
            [system]
            machine_timestep_us = 500

            [[learning.rules]]
            learning_rate = 0.5
            decoder_row = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.system.machine_timestep_us, 500);
        assert_eq!(config.system.run_ticks, None);
        assert_eq!(config.ensemble, EnsembleSection::default());
        assert_eq!(config.learning.rules.len(), 1);
        assert_eq!(config.learning.rules[0].error_channel, 0);
        assert_eq!(config.learning.rules[0].activity_filter_index, -1);
    }

    #[test]
    fn test_json_round_trip_keeps_rules() {
        let mut config = EnsembleConfig::default();
        config.learning.rules.push(LearningRuleConfig {
            learning_rate: 0.25,
            error_channel: -1,
            decoder_row: 0,
            activity_filter_index: 2,
        });
        let json = serde_json::to_string(&config).unwrap();
        let back: EnsembleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_dt_from_timestep() {
        let system = SystemConfig::default();
        assert!((system.dt_s() - 0.001).abs() < 1e-12);
    }
}
