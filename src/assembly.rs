// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Turning a validated [`EnsembleConfig`] into boot parameters
//!
//! Key layout shared by every route built here (the upper bits selected by
//! `key_mask` are the prefix):
//!
//! ```text
//! input   prefix | dimension
//! error   prefix | channel << 8 | dimension
//! output  prefix | dimension
//! ```

use crate::{
    ConfigError, EnsembleConfig, EnsembleParameters, FilterRoute, FilterSpec, LearningRuleConfig,
    PesRegionBuilder, PesRegionRecord, RunLength, SdpSource, SdpTxParameters, S1615,
};
use thiserror::Error;
use tracing::debug;

const CHANNEL_SHIFT: u32 = 8;
const CHANNEL_DIMENSION_MASK: u32 = 0x0000_00FF;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything needed to boot one ensemble and its transmitter
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleBuild {
    pub ensemble: EnsembleParameters,
    /// `None` when the transmitter is disabled
    pub transmitter: Option<SdpTxParameters>,
    pub source: SdpSource,
    pub run_length: RunLength,
    /// Prefix the ensemble output is sent under
    pub output_key: u32,
}

/// Validate `config` and derive all boot parameters from it
pub fn build(config: &EnsembleConfig) -> Result<EnsembleBuild, AssemblyError> {
    crate::validate_config(config)?;

    let build = EnsembleBuild {
        ensemble: ensemble_parameters(config),
        transmitter: transmitter_parameters(config),
        source: SdpSource {
            p2p_addr: config.system.p2p_addr,
            core_id: config.system.core_id,
        },
        run_length: config
            .system
            .run_ticks
            .map_or(RunLength::Unbounded, RunLength::Ticks),
        output_key: config.ensemble.output_key,
    };
    debug!(
        "[ASSEMBLY] {} neurons, {} dimensions, {} learning rules, transmitter {}",
        build.ensemble.n_neurons(),
        build.ensemble.n_dimensions,
        config.learning.rules.len(),
        if build.transmitter.is_some() { "on" } else { "off" }
    );
    Ok(build)
}

/// The PES region for the configured rules, in order
///
/// Indices are written as configured; out-of-range values are left for
/// boot-time validation to report.
pub fn pes_region(rules: &[LearningRuleConfig]) -> Vec<u8> {
    rules
        .iter()
        .fold(PesRegionBuilder::new(), |builder, rule| {
            builder.record(PesRegionRecord {
                learning_rate: S1615::from_f64(rule.learning_rate).to_bits(),
                error_channel: rule.error_channel,
                decoder_row: rule.decoder_row,
                activity_filter_index: rule.activity_filter_index,
            })
        })
        .to_bytes()
}

fn filter_spec(width: u32, tau_s: f64, dt_s: f64) -> FilterSpec {
    if tau_s > 0.0 {
        FilterSpec::low_pass(width, tau_s, dt_s)
    } else {
        FilterSpec::pass_through(width)
    }
}

/// Ensemble boot parameters; assumes `config` is valid
pub fn ensemble_parameters(config: &EnsembleConfig) -> EnsembleParameters {
    let ensemble = &config.ensemble;
    let dt_s = config.system.dt_s();
    let mask = ensemble.key_mask;

    let input_filters = vec![filter_spec(ensemble.input_dimensions, ensemble.input_tau_s, dt_s)];
    let input_routes = vec![FilterRoute {
        key: ensemble.input_key & mask,
        mask,
        filter_index: 0,
        dimension_mask: !mask,
    }];

    let (modulatory_filters, modulatory_routes) = ensemble
        .error_widths
        .iter()
        .enumerate()
        .map(|(channel, &width)| {
            let channel = channel as u32;
            (
                filter_spec(width, ensemble.error_tau_s, dt_s),
                FilterRoute {
                    key: (ensemble.error_key & mask) | (channel << CHANNEL_SHIFT),
                    mask: mask | (!mask & !CHANNEL_DIMENSION_MASK),
                    filter_index: channel,
                    dimension_mask: CHANNEL_DIMENSION_MASK,
                },
            )
        })
        .unzip();

    EnsembleParameters::new(
        config.system.machine_timestep_us,
        &ensemble.population_lengths,
        ensemble.n_dimensions,
    )
    .with_decoder(ensemble.decoder.iter().map(|&w| S1615::from_f64(w)).collect())
    .with_pes_region(pes_region(&config.learning.rules))
    .with_input_filters(input_filters, input_routes)
    .with_modulatory_filters(modulatory_filters, modulatory_routes)
    .with_activity_filters(ensemble.activity_filter_count)
}

/// Transmitter boot parameters, listening on the ensemble output prefix
pub fn transmitter_parameters(config: &EnsembleConfig) -> Option<SdpTxParameters> {
    let transmitter = &config.transmitter;
    if !transmitter.enabled {
        return None;
    }
    let ensemble = &config.ensemble;
    let mask = ensemble.key_mask;

    Some(
        SdpTxParameters::new(
            ensemble.n_dimensions,
            config.system.machine_timestep_us,
            transmitter.transmission_delay,
        )
        .with_input_filters(
            vec![filter_spec(
                ensemble.n_dimensions,
                transmitter.input_tau_s,
                config.system.dt_s(),
            )],
            vec![FilterRoute {
                key: ensemble.output_key & mask,
                mask,
                filter_index: 0,
                dimension_mask: !mask,
            }],
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LearningRule, PesRegistry};

    fn config_with_rules(rules: Vec<LearningRuleConfig>) -> EnsembleConfig {
        let mut config = EnsembleConfig::default();
        config.ensemble.population_lengths = vec![40, 5];
        config.ensemble.n_dimensions = 2;
        config.ensemble.error_widths = vec![2, 1];
        config.learning.rules = rules;
        config
    }

    #[test]
    fn test_pes_region_parses_back_to_the_configured_rules() {
        let region = pes_region(&[
            LearningRuleConfig {
                learning_rate: 0.5,
                error_channel: 1,
                decoder_row: 1,
                activity_filter_index: -1,
            },
            LearningRuleConfig {
                learning_rate: 0.25,
                error_channel: -1,
                decoder_row: 0,
                activity_filter_index: 0,
            },
        ]);
        let registry = PesRegistry::initialise(&region).unwrap();
        assert_eq!(
            registry.rules(),
            &[
                LearningRule::instantaneous(S1615::from_f32(0.5), 1, 1),
                LearningRule::filtered(S1615::from_f32(0.25), None, 0, 0),
            ]
        );
    }

    #[test]
    fn test_error_channels_get_distinct_routes() {
        let params = ensemble_parameters(&config_with_rules(Vec::new()));
        assert_eq!(params.modulatory_filters.len(), 2);
        let routes = &params.modulatory_routes;
        assert_eq!(routes[0].key, 0x0002_0000);
        assert_eq!(routes[1].key, 0x0002_0100);
        assert_eq!(routes[1].mask, 0xFFFF_FF00);
        assert_eq!(routes[1].filter_index, 1);
        assert_eq!(routes[1].dimension_mask, 0xFF);
        assert_eq!(params.input_routes[0].dimension_mask, 0x0000_FFFF);
    }

    #[test]
    fn test_zero_tau_is_pass_through() {
        let mut config = config_with_rules(Vec::new());
        config.ensemble.error_tau_s = 0.0;
        let params = ensemble_parameters(&config);
        assert_eq!(params.modulatory_filters[0], FilterSpec::pass_through(2));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = config_with_rules(Vec::new());
        config.system.machine_timestep_us = 0;
        assert!(matches!(
            build(&config),
            Err(AssemblyError::Config(ConfigError::ValidationError(_)))
        ));
    }

    #[test]
    fn test_build_maps_run_length_and_transmitter() {
        let mut config = config_with_rules(Vec::new());
        config.system.run_ticks = Some(25);
        let built = build(&config).unwrap();
        assert_eq!(built.run_length, RunLength::Ticks(25));
        let tx = built.transmitter.unwrap();
        assert_eq!(tx.to_system_words(), [2, 1000, 10]);
        assert_eq!(tx.input_routes[0].key, 0x0003_0000);

        config.system.run_ticks = None;
        config.transmitter.enabled = false;
        let built = build(&config).unwrap();
        assert_eq!(built.run_length, RunLength::Unbounded);
        assert!(built.transmitter.is_none());
    }
}
