// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Packet-fed first-order low-pass filters
//!
//! Each filter has two vectors: an input accumulator written by the packet
//! handler between ticks, and a settled output read by learning and by the
//! neuron model. `advance` is the only operation that moves data from one
//! to the other:
//!
//! ```text
//! output[d] = decay * output[d] + gain * input[d]
//! ```
//!
//! A non-latching filter sums every packet received for a dimension and
//! clears its input after each advance. A latching filter keeps only the
//! most recent packet per dimension and holds it until the next one arrives.

use crate::traits::{FilterOutputs, InputFilters, Result, RuntimeError};
use ensemble_npu_neural::S1615;

/// Construction parameters for one filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    /// Number of dimensions
    pub width: u32,
    /// Output retention per tick (`a`)
    pub decay: S1615,
    /// Input gain per tick (`b`)
    pub gain: S1615,
    /// Hold the last received value instead of summing and clearing
    pub latching: bool,
}

impl FilterSpec {
    /// Low-pass filter with time constant `tau_s`, sampled every `dt_s`
    ///
    /// `decay = exp(-dt / tau)`, `gain = 1 - decay`. A non-positive time
    /// constant yields a pass-through filter.
    pub fn low_pass(width: u32, tau_s: f64, dt_s: f64) -> Self {
        if tau_s <= 0.0 {
            return Self::pass_through(width);
        }
        let decay = (-dt_s / tau_s).exp();
        Self {
            width,
            decay: S1615::from_f64(decay),
            gain: S1615::from_f64(1.0 - decay),
            latching: false,
        }
    }

    /// Output equals the input accumulated during the previous tick
    pub fn pass_through(width: u32) -> Self {
        Self {
            width,
            decay: S1615::ZERO,
            gain: S1615::ONE,
            latching: false,
        }
    }

    /// Same filter, latching
    pub fn latching(mut self) -> Self {
        self.latching = true;
        self
    }
}

/// Packet route into a filter collection
///
/// A packet key `k` matches when `k & mask == key`; the target dimension is
/// `k & dimension_mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRoute {
    /// Key after masking
    pub key: u32,
    /// Mask applied to incoming keys
    pub mask: u32,
    /// Filter receiving matching packets
    pub filter_index: u32,
    /// Mask extracting the dimension from the key
    pub dimension_mask: u32,
}

impl FilterRoute {
    #[inline]
    fn matches(&self, key: u32) -> bool {
        key & self.mask == self.key
    }
}

/// One first-order low-pass filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowPassFilter {
    input: Vec<S1615>,
    output: Vec<S1615>,
    decay: S1615,
    gain: S1615,
    latching: bool,
}

impl LowPassFilter {
    fn new(spec: &FilterSpec) -> Result<Self> {
        let width = spec.width as usize;
        Ok(Self {
            input: zeroed(width, "filter input")?,
            output: zeroed(width, "filter output")?,
            decay: spec.decay,
            gain: spec.gain,
            latching: spec.latching,
        })
    }

    /// Number of dimensions
    #[inline]
    pub fn width(&self) -> usize {
        self.output.len()
    }

    /// Input accumulated since the last advance
    #[inline]
    pub fn input(&self) -> &[S1615] {
        &self.input
    }

    /// Settled output
    #[inline]
    pub fn output(&self) -> &[S1615] {
        &self.output
    }

    /// Whether the filter holds its input across ticks
    #[inline]
    pub fn is_latching(&self) -> bool {
        self.latching
    }

    /// Feed one value into dimension `dimension`; out-of-range is ignored
    pub fn accumulate(&mut self, dimension: usize, value: S1615) -> bool {
        match self.input.get_mut(dimension) {
            Some(slot) => {
                if self.latching {
                    *slot = value;
                } else {
                    *slot += value;
                }
                true
            }
            None => false,
        }
    }

    /// Advance one tick
    pub fn step(&mut self) {
        for (out, input) in self.output.iter_mut().zip(self.input.iter_mut()) {
            *out = self.decay * *out + self.gain * *input;
            if !self.latching {
                *input = S1615::ZERO;
            }
        }
    }
}

/// A set of filters sharing one routing table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCollection {
    filters: Vec<LowPassFilter>,
    routes: Vec<FilterRoute>,
}

impl FilterCollection {
    /// Build the collection and check every route targets an existing filter
    pub fn new(specs: &[FilterSpec], routes: &[FilterRoute]) -> Result<Self> {
        let mut filters = Vec::new();
        filters
            .try_reserve_exact(specs.len())
            .map_err(|_| RuntimeError::ResourceExhausted {
                what: "filter collection",
                requested: specs.len(),
            })?;
        for spec in specs {
            filters.push(LowPassFilter::new(spec)?);
        }

        for (route, r) in routes.iter().enumerate() {
            if r.filter_index as usize >= filters.len() {
                return Err(RuntimeError::UnknownFilter {
                    route,
                    filter_index: r.filter_index,
                    available: filters.len(),
                });
            }
        }

        Ok(Self {
            filters,
            routes: routes.to_vec(),
        })
    }

    /// Collection with no filters and no routes
    pub fn empty() -> Self {
        Self::default()
    }

    /// Filter `index`, if it exists
    pub fn filter(&self, index: usize) -> Option<&LowPassFilter> {
        self.filters.get(index)
    }

    /// Routing table
    pub fn routes(&self) -> &[FilterRoute] {
        &self.routes
    }
}

impl FilterOutputs for FilterCollection {
    fn n_filters(&self) -> usize {
        self.filters.len()
    }

    fn output(&self, index: usize) -> Option<&[S1615]> {
        self.filters.get(index).map(LowPassFilter::output)
    }
}

impl InputFilters for FilterCollection {
    fn advance(&mut self) {
        for filter in &mut self.filters {
            filter.step();
        }
    }

    fn receive_packet(&mut self, key: u32, payload: S1615) -> bool {
        let mut matched = false;
        for route in &self.routes {
            if !route.matches(key) {
                continue;
            }
            let dimension = (key & route.dimension_mask) as usize;
            if let Some(filter) = self.filters.get_mut(route.filter_index as usize) {
                matched |= filter.accumulate(dimension, payload);
            }
        }
        matched
    }
}

fn zeroed(len: usize, what: &'static str) -> Result<Vec<S1615>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| RuntimeError::ResourceExhausted {
            what,
            requested: len,
        })?;
    v.resize(len, S1615::ZERO);
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(key: u32, filter_index: u32) -> FilterRoute {
        FilterRoute {
            key,
            mask: 0xFFFF_FF00,
            filter_index,
            dimension_mask: 0x0000_00FF,
        }
    }

    #[test]
    fn test_input_is_invisible_until_advance() {
        let mut filters =
            FilterCollection::new(&[FilterSpec::pass_through(2)], &[route(0x100, 0)]).unwrap();
        assert!(filters.receive_packet(0x101, S1615::ONE));
        assert_eq!(filters.output(0).unwrap(), &[S1615::ZERO, S1615::ZERO]);

        filters.advance();
        assert_eq!(filters.output(0).unwrap(), &[S1615::ZERO, S1615::ONE]);

        // Non-latching input was cleared by the advance
        filters.advance();
        assert_eq!(filters.output(0).unwrap(), &[S1615::ZERO, S1615::ZERO]);
    }

    #[test]
    fn test_non_latching_filter_sums_packets() {
        let mut filters =
            FilterCollection::new(&[FilterSpec::pass_through(1)], &[route(0x100, 0)]).unwrap();
        filters.receive_packet(0x100, S1615::from_f32(0.25));
        filters.receive_packet(0x100, S1615::from_f32(0.5));
        filters.advance();
        assert_eq!(filters.output(0).unwrap()[0].to_f32(), 0.75);
    }

    #[test]
    fn test_latching_filter_holds_last_value() {
        let spec = FilterSpec::pass_through(1).latching();
        let mut filters = FilterCollection::new(&[spec], &[route(0x100, 0)]).unwrap();
        filters.receive_packet(0x100, S1615::from_f32(0.25));
        filters.receive_packet(0x100, S1615::from_f32(0.5));
        filters.advance();
        filters.advance();
        assert_eq!(filters.output(0).unwrap()[0].to_f32(), 0.5);
        assert!(filters.filter(0).unwrap().is_latching());
    }

    #[test]
    fn test_low_pass_decays_towards_input() {
        let spec = FilterSpec {
            width: 1,
            decay: S1615::from_f32(0.5),
            gain: S1615::from_f32(0.5),
            latching: true,
        };
        let mut filters = FilterCollection::new(&[spec], &[route(0x100, 0)]).unwrap();
        filters.receive_packet(0x100, S1615::ONE);
        filters.advance();
        assert_eq!(filters.output(0).unwrap()[0].to_f32(), 0.5);
        filters.advance();
        assert_eq!(filters.output(0).unwrap()[0].to_f32(), 0.75);
    }

    #[test]
    fn test_low_pass_coefficients() {
        let spec = FilterSpec::low_pass(3, 0.005, 0.001);
        let decay = (-0.2f64).exp();
        assert!((spec.decay.to_f64() - decay).abs() < 1e-4);
        assert!((spec.gain.to_f64() - (1.0 - decay)).abs() < 1e-4);
        assert_eq!(FilterSpec::low_pass(3, 0.0, 0.001), FilterSpec::pass_through(3));
    }

    #[test]
    fn test_unmatched_and_out_of_range_packets_are_dropped() {
        let mut filters =
            FilterCollection::new(&[FilterSpec::pass_through(2)], &[route(0x100, 0)]).unwrap();
        assert!(!filters.receive_packet(0x200, S1615::ONE));
        assert!(!filters.receive_packet(0x105, S1615::ONE));
        filters.advance();
        assert!(filters.output(0).unwrap().iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_one_packet_can_feed_several_filters() {
        let specs = [FilterSpec::pass_through(1), FilterSpec::pass_through(1)];
        let mut filters =
            FilterCollection::new(&specs, &[route(0x100, 0), route(0x100, 1)]).unwrap();
        assert!(filters.receive_packet(0x100, S1615::ONE));
        filters.advance();
        assert_eq!(filters.output(0), filters.output(1));
        assert_eq!(filters.output(1).unwrap()[0], S1615::ONE);
    }

    #[test]
    fn test_route_to_missing_filter_is_rejected() {
        let err = FilterCollection::new(&[FilterSpec::pass_through(1)], &[route(0x100, 3)])
            .unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UnknownFilter {
                route: 0,
                filter_index: 3,
                available: 1
            }
        );
    }
}
