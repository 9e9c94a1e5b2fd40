// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Everything an ensemble needs at boot
//!
//! The loader that turns configuration regions into these values lives
//! outside the runtime; this is the already-decoded form.

use ensemble_npu_neural::S1615;
use ensemble_npu_runtime::{FilterRoute, FilterSpec};

/// Boot-time description of one ensemble slice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnsembleParameters {
    /// Timer period in microseconds; also the per-tick deadline
    pub machine_timestep_us: u32,
    /// Neurons in each population, in column order
    pub population_lengths: Vec<u32>,
    /// Output dimensions (decoder rows)
    pub n_dimensions: u32,
    /// Row-major initial decoder; empty means all zeros
    pub decoder: Vec<S1615>,
    /// Raw PES region
    pub pes_region: Vec<u8>,
    pub input_filters: Vec<FilterSpec>,
    pub input_routes: Vec<FilterRoute>,
    /// Filters carrying error signals for learning
    pub modulatory_filters: Vec<FilterSpec>,
    pub modulatory_routes: Vec<FilterRoute>,
    /// Number of activity filters filtered-activity rules may refer to
    pub activity_filter_count: u32,
}

impl EnsembleParameters {
    /// Parameters with no filters, a zero decoder and an empty PES region
    pub fn new(machine_timestep_us: u32, population_lengths: &[u32], n_dimensions: u32) -> Self {
        Self {
            machine_timestep_us,
            population_lengths: population_lengths.to_vec(),
            n_dimensions,
            pes_region: 0u32.to_ne_bytes().to_vec(),
            ..Self::default()
        }
    }

    pub fn with_decoder(mut self, decoder: Vec<S1615>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_pes_region(mut self, region: Vec<u8>) -> Self {
        self.pes_region = region;
        self
    }

    pub fn with_input_filters(mut self, specs: Vec<FilterSpec>, routes: Vec<FilterRoute>) -> Self {
        self.input_filters = specs;
        self.input_routes = routes;
        self
    }

    pub fn with_modulatory_filters(
        mut self,
        specs: Vec<FilterSpec>,
        routes: Vec<FilterRoute>,
    ) -> Self {
        self.modulatory_filters = specs;
        self.modulatory_routes = routes;
        self
    }

    pub fn with_activity_filters(mut self, count: u32) -> Self {
        self.activity_filter_count = count;
        self
    }

    /// Total neurons across every population
    pub fn n_neurons(&self) -> u64 {
        self.population_lengths.iter().map(|&n| u64::from(n)).sum()
    }
}
