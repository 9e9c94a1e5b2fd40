// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! PES (Prescribed Error Sensitivity) rule registry
//!
//! For every instantaneous rule and every neuron `c` that fired:
//!
//! ```text
//! decoder[row][c] -= learning_rate * error[row - decoder_row]
//!     for row in decoder_row .. decoder_row + error_dim
//! ```
//!
//! Firing neurons are found with the find-next-set-bit traversal, so the
//! cost of a tick is proportional to the number of spikes, not neurons.

use crate::error::{InvariantViolation, PesError, Result};
use crate::filtered_activity::{FilteredActivityUpdate, InertFilteredActivity};
use crate::region::{parse_header, read_record};
use crate::rule::{ActivityMode, LearningRule};
use ensemble_npu_neural::{DecoderMatrix, FiringColumns, SpikeVector, S1615};
use ensemble_npu_runtime::FilterOutputs;
use tracing::{debug, info};

/// The configured learning rules of one ensemble
///
/// Built once at boot and immutable afterwards. The tick handler borrows it
/// and calls [`PesRegistry::apply`] once per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesRegistry<A = InertFilteredActivity> {
    rules: Vec<LearningRule>,
    filtered_activity: A,
}

impl PesRegistry<InertFilteredActivity> {
    /// Parse the PES region
    ///
    /// The rule table is allocated exactly once, sized to the count in the
    /// header. Nothing is returned unless every record converts.
    pub fn initialise(block: &[u8]) -> Result<Self> {
        let (count, records) = parse_header(block)?;
        let mut rules = try_rules_with_capacity(count)?;
        for index in 0..count {
            rules.push(read_record(records, index).to_rule(index)?);
        }

        let registry = Self {
            rules,
            filtered_activity: InertFilteredActivity,
        };
        registry.log_rules();
        Ok(registry)
    }

    /// Parse a PES region supplied as 32-bit words
    pub fn initialise_words(words: &[u32]) -> Result<Self> {
        Self::initialise(bytemuck::cast_slice(words))
    }

    /// Registry over rules built in memory
    pub fn from_rules(rules: &[LearningRule]) -> Result<Self> {
        let mut owned = try_rules_with_capacity(rules.len())?;
        owned.extend_from_slice(rules);
        Ok(Self {
            rules: owned,
            filtered_activity: InertFilteredActivity,
        })
    }

    /// Registry with no rules; `apply` is a no-op
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            filtered_activity: InertFilteredActivity,
        }
    }
}

impl<A: FilteredActivityUpdate> PesRegistry<A> {
    /// Swap the strategy used for filtered-activity rules
    pub fn with_filtered_activity<B: FilteredActivityUpdate>(self, strategy: B) -> PesRegistry<B> {
        PesRegistry {
            rules: self.rules,
            filtered_activity: strategy,
        }
    }

    pub fn rules(&self) -> &[LearningRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check every rule against the decoder and filters it will run with
    ///
    /// Called once at boot. After this succeeds `apply` never needs to
    /// clamp a row range or skip a missing channel.
    pub fn validate<F>(
        &self,
        decoder_rows: usize,
        filters: &F,
        activity_filter_count: usize,
    ) -> Result<()>
    where
        F: FilterOutputs + ?Sized,
    {
        for (index, rule) in self.rules.iter().enumerate() {
            let violation = |reason| PesError::ConfigurationInvariantViolation {
                rule: index,
                reason,
            };

            match rule.error_channel {
                Some(channel) => {
                    let error_dim = filters.width(channel as usize).ok_or_else(|| {
                        violation(InvariantViolation::MissingErrorChannel {
                            channel,
                            available: filters.n_filters(),
                        })
                    })?;
                    let end = u64::from(rule.decoder_row) + error_dim as u64;
                    if end > decoder_rows as u64 {
                        return Err(violation(InvariantViolation::DecoderRowsOutOfRange {
                            first: rule.decoder_row,
                            end,
                            rows: decoder_rows,
                        }));
                    }
                }
                None if rule.is_instantaneous() => {
                    return Err(violation(InvariantViolation::MissingErrorSignal));
                }
                None => {}
            }

            if let ActivityMode::FilteredActivity(filter) = rule.activity_mode {
                if filter as usize >= activity_filter_count {
                    return Err(violation(InvariantViolation::MissingActivityFilter {
                        index: filter,
                        available: activity_filter_count,
                    }));
                }
            }
        }
        Ok(())
    }

    /// One tick of decoder learning from the previous tick's spikes
    ///
    /// Returns the number of firing columns visited across all rules.
    pub fn apply<F>(&self, spikes: &SpikeVector, decoder: &mut DecoderMatrix, filters: &F) -> usize
    where
        F: FilterOutputs + ?Sized,
    {
        let n_neurons = decoder.columns();
        self.apply_raw(
            spikes.words(),
            spikes.population_lengths(),
            decoder.as_mut_slice(),
            n_neurons,
            filters,
        )
    }

    /// `apply` over raw buffers
    ///
    /// `decoder` is row-major with `n_neurons` columns. Allocates nothing
    /// and never fails; a rule whose error channel is missing is skipped.
    pub fn apply_raw<F>(
        &self,
        words: &[u32],
        population_lengths: &[u32],
        decoder: &mut [S1615],
        n_neurons: usize,
        filters: &F,
    ) -> usize
    where
        F: FilterOutputs + ?Sized,
    {
        if n_neurons == 0 {
            return 0;
        }
        let decoder_rows = decoder.len() / n_neurons;

        let mut visited = 0;
        for rule in &self.rules {
            let error = rule
                .error_channel
                .and_then(|channel| filters.output(channel as usize));

            match rule.activity_mode {
                ActivityMode::Instantaneous => {
                    if let Some(error) = error {
                        visited += apply_instantaneous(
                            rule,
                            error,
                            words,
                            population_lengths,
                            decoder,
                            n_neurons,
                            decoder_rows,
                        );
                    }
                }
                ActivityMode::FilteredActivity(filter) => {
                    self.filtered_activity
                        .apply(rule, filter, error, decoder, n_neurons);
                }
            }
        }
        visited
    }

    fn log_rules(&self) {
        info!("[PES] Loaded {} learning rules", self.rules.len());
        for (index, rule) in self.rules.iter().enumerate() {
            debug!(
                "[PES] Rule {}: learning_rate={}, error_channel={}, decoder_row={}, activity_filter_index={}",
                index,
                rule.learning_rate,
                rule.error_channel_index(),
                rule.decoder_row,
                rule.activity_mode.to_index()
            );
        }
    }
}

/// Instantaneous PES kernel for a single rule
#[inline]
fn apply_instantaneous(
    rule: &LearningRule,
    error: &[S1615],
    words: &[u32],
    population_lengths: &[u32],
    decoder: &mut [S1615],
    n_neurons: usize,
    decoder_rows: usize,
) -> usize {
    let first = rule.decoder_row as usize;
    let owned = error.len().min(decoder_rows.saturating_sub(first));
    if owned == 0 {
        return 0;
    }
    let rows = &mut decoder[first * n_neurons..(first + owned) * n_neurons];

    let mut visited = 0;
    for column in FiringColumns::new(words, population_lengths) {
        // Columns arrive in ascending order
        if column >= n_neurons {
            break;
        }
        visited += 1;
        for (row, &e) in rows.chunks_exact_mut(n_neurons).zip(error) {
            row[column] -= rule.learning_rate * e;
        }
    }
    visited
}

fn try_rules_with_capacity(count: usize) -> Result<Vec<LearningRule>> {
    let mut rules = Vec::new();
    rules
        .try_reserve_exact(count)
        .map_err(|_| PesError::ResourceExhausted { requested: count })?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::PesRegionBuilder;
    use ensemble_npu_neural::neuron_bit;

    fn rate(v: f32) -> S1615 {
        S1615::from_f32(v)
    }

    #[test]
    fn test_zero_rules_is_a_no_op() {
        let registry = PesRegistry::initialise_words(&[0]).unwrap();
        assert!(registry.is_empty());

        let mut spikes = SpikeVector::with_neurons(8).unwrap();
        spikes.words_mut()[0] = u32::MAX;
        let mut decoder = DecoderMatrix::from_row_major(1, 8, &[rate(0.5); 8]).unwrap();
        let before = decoder.clone();
        let filters = vec![vec![rate(1.0)]];

        assert_eq!(registry.apply(&spikes, &mut decoder, &filters), 0);
        assert_eq!(decoder, before);
    }

    #[test]
    fn test_single_rule_updates_firing_columns() {
        let (r, e) = (rate(0.25), rate(0.5));
        let registry = PesRegistry::from_rules(&[LearningRule::instantaneous(r, 0, 0)]).unwrap();

        let spikes = SpikeVector::from_words(&[3], &[neuron_bit(0) | neuron_bit(2)]).unwrap();
        let mut decoder = DecoderMatrix::zeros(1, 3).unwrap();
        let filters = vec![vec![e]];

        assert_eq!(registry.apply(&spikes, &mut decoder, &filters), 2);
        let expected = S1615::ZERO - r * e;
        assert_eq!(decoder.get(0, 0), Some(expected));
        assert_eq!(decoder.get(0, 1), Some(S1615::ZERO));
        assert_eq!(decoder.get(0, 2), Some(expected));
    }

    #[test]
    fn test_column_index_crosses_population_boundary() {
        let registry =
            PesRegistry::from_rules(&[LearningRule::instantaneous(rate(1.0), 0, 0)]).unwrap();
        let mut spikes = SpikeVector::new(&[40, 5]).unwrap();
        assert!(spikes.set_spike(41));
        let mut decoder = DecoderMatrix::zeros(1, 45).unwrap();

        registry.apply(&spikes, &mut decoder, &vec![vec![rate(1.0)]]);
        for column in 0..45 {
            let expected = if column == 41 { rate(-1.0) } else { S1615::ZERO };
            assert_eq!(decoder.get(0, column), Some(expected), "column {column}");
        }
    }

    #[test]
    fn test_filtered_activity_rule_is_inert() {
        let registry =
            PesRegistry::from_rules(&[LearningRule::filtered(rate(1.0), Some(0), 0, 0)]).unwrap();
        let spikes = SpikeVector::from_words(&[4], &[u32::MAX]).unwrap();
        let mut decoder = DecoderMatrix::from_row_major(1, 4, &[rate(0.125); 4]).unwrap();
        let before = decoder.clone();

        assert_eq!(registry.apply(&spikes, &mut decoder, &vec![vec![rate(1.0)]]), 0);
        assert_eq!(decoder, before);
    }

    #[test]
    fn test_rule_owns_error_dim_rows_from_decoder_row() {
        let registry =
            PesRegistry::from_rules(&[LearningRule::instantaneous(rate(1.0), 1, 1)]).unwrap();
        let spikes = SpikeVector::from_words(&[2], &[neuron_bit(1)]).unwrap();
        let mut decoder = DecoderMatrix::zeros(4, 2).unwrap();
        let filters = vec![vec![rate(9.0)], vec![rate(0.5), rate(0.25)]];

        registry.apply(&spikes, &mut decoder, &filters);
        assert_eq!(decoder.row(0).unwrap(), &[S1615::ZERO, S1615::ZERO]);
        assert_eq!(decoder.row(1).unwrap(), &[S1615::ZERO, rate(-0.5)]);
        assert_eq!(decoder.row(2).unwrap(), &[S1615::ZERO, rate(-0.25)]);
        assert_eq!(decoder.row(3).unwrap(), &[S1615::ZERO, S1615::ZERO]);
    }

    #[test]
    fn test_overlapping_rules_accumulate() {
        let rules = [
            LearningRule::instantaneous(rate(1.0), 0, 0),
            LearningRule::instantaneous(rate(0.5), 0, 0),
        ];
        let registry = PesRegistry::from_rules(&rules).unwrap();
        let spikes = SpikeVector::from_words(&[1], &[neuron_bit(0)]).unwrap();
        let mut decoder = DecoderMatrix::zeros(1, 1).unwrap();

        assert_eq!(registry.apply(&spikes, &mut decoder, &vec![vec![rate(1.0)]]), 2);
        assert_eq!(decoder.get(0, 0), Some(rate(-1.5)));
    }

    #[test]
    fn test_initialise_parses_builder_output() {
        let block = PesRegionBuilder::new()
            .rule(LearningRule::instantaneous(rate(0.001), 2, 3))
            .rule(LearningRule::filtered(rate(-0.5), None, 0, 7))
            .to_bytes();
        let registry = PesRegistry::initialise(&block).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.rules()[0], LearningRule::instantaneous(rate(0.001), 2, 3));
        assert_eq!(
            registry.rules()[1].activity_mode,
            ActivityMode::FilteredActivity(7)
        );
        assert_eq!(registry.rules()[1].error_channel, None);
    }

    #[test]
    fn test_initialise_reports_the_failing_rule() {
        let words = PesRegionBuilder::new()
            .rule(LearningRule::instantaneous(rate(1.0), 0, 0))
            .record(crate::region::PesRegionRecord {
                learning_rate: 0,
                error_channel: 0,
                decoder_row: 0,
                activity_filter_index: -9,
            })
            .to_words();
        assert!(matches!(
            PesRegistry::initialise_words(&words),
            Err(PesError::ConfigurationInvariantViolation { rule: 1, .. })
        ));
    }

    #[test]
    fn test_validate_row_range() {
        let registry =
            PesRegistry::from_rules(&[LearningRule::instantaneous(rate(1.0), 0, 2)]).unwrap();
        let filters = vec![vec![S1615::ZERO; 2]];

        assert!(registry.validate(4, &filters, 0).is_ok());
        assert_eq!(
            registry.validate(3, &filters, 0),
            Err(PesError::ConfigurationInvariantViolation {
                rule: 0,
                reason: InvariantViolation::DecoderRowsOutOfRange {
                    first: 2,
                    end: 4,
                    rows: 3
                }
            })
        );
    }

    #[test]
    fn test_validate_missing_channels() {
        let registry =
            PesRegistry::from_rules(&[LearningRule::instantaneous(rate(1.0), 3, 0)]).unwrap();
        let filters = vec![vec![S1615::ZERO]];
        assert!(matches!(
            registry.validate(8, &filters, 0),
            Err(PesError::ConfigurationInvariantViolation {
                reason: InvariantViolation::MissingErrorChannel {
                    channel: 3,
                    available: 1
                },
                ..
            })
        ));

        let filtered =
            PesRegistry::from_rules(&[LearningRule::filtered(rate(1.0), None, 0, 2)]).unwrap();
        assert!(filtered.validate(8, &filters, 3).is_ok());
        assert!(matches!(
            filtered.validate(8, &filters, 2),
            Err(PesError::ConfigurationInvariantViolation {
                reason: InvariantViolation::MissingActivityFilter { index: 2, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_unvalidated_missing_channel_is_skipped() {
        let registry =
            PesRegistry::from_rules(&[LearningRule::instantaneous(rate(1.0), 5, 0)]).unwrap();
        let spikes = SpikeVector::from_words(&[1], &[neuron_bit(0)]).unwrap();
        let mut decoder = DecoderMatrix::zeros(1, 1).unwrap();
        let filters: Vec<Vec<S1615>> = Vec::new();
        assert_eq!(registry.apply(&spikes, &mut decoder, &filters), 0);
        assert_eq!(decoder.get(0, 0), Some(S1615::ZERO));
    }

    #[test]
    fn test_custom_filtered_activity_strategy_is_called() {
        struct Fill;
        impl FilteredActivityUpdate for Fill {
            fn apply(
                &self,
                rule: &LearningRule,
                _activity_filter: u32,
                _error: Option<&[S1615]>,
                decoder: &mut [S1615],
                n_neurons: usize,
            ) {
                let start = rule.decoder_row as usize * n_neurons;
                decoder[start..start + n_neurons].fill(S1615::ONE);
            }
        }

        let registry = PesRegistry::from_rules(&[LearningRule::filtered(rate(1.0), None, 1, 0)])
            .unwrap()
            .with_filtered_activity(Fill);
        let spikes = SpikeVector::with_neurons(2).unwrap();
        let mut decoder = DecoderMatrix::zeros(2, 2).unwrap();
        let filters: Vec<Vec<S1615>> = Vec::new();
        registry.apply(&spikes, &mut decoder, &filters);
        assert_eq!(decoder.row(1).unwrap(), &[S1615::ONE, S1615::ONE]);
        assert_eq!(decoder.row(0).unwrap(), &[S1615::ZERO, S1615::ZERO]);
    }
}
