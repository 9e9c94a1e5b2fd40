// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Bit-packed spike vectors
//!
//! An ensemble slice may be internally sharded into populations. Each
//! population occupies a whole number of 32-bit words and starts on a word
//! boundary, so a population whose length is not a multiple of 32 leaves
//! padding bits at the end of its last word.

pub mod bitscan;

pub use bitscan::{find_next_set_bit, neuron_bit, words_for, FiringColumns, WORD_BITS};

use crate::types::{EnsembleError, Result};

/// One bit per neuron, grouped into word-aligned populations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpikeVector {
    words: Vec<u32>,
    population_lengths: Vec<u32>,
    /// First word of each population
    word_offsets: Vec<usize>,
    /// First absolute column of each population
    column_offsets: Vec<usize>,
    n_neurons: usize,
}

impl SpikeVector {
    /// Allocate an all-silent spike vector for the given population layout
    pub fn new(population_lengths: &[u32]) -> Result<Self> {
        let n_populations = population_lengths.len();
        let mut word_offsets = try_vec_with_capacity(n_populations, "spike word offsets")?;
        let mut column_offsets = try_vec_with_capacity(n_populations, "spike column offsets")?;
        let mut lengths = try_vec_with_capacity(n_populations, "population lengths")?;

        let mut n_words = 0usize;
        let mut n_neurons = 0usize;
        for &length in population_lengths {
            word_offsets.push(n_words);
            column_offsets.push(n_neurons);
            lengths.push(length);
            n_words += words_for(length);
            n_neurons += length as usize;
        }

        let mut words = try_vec_with_capacity(n_words, "spike vector")?;
        words.resize(n_words, 0);

        Ok(Self {
            words,
            population_lengths: lengths,
            word_offsets,
            column_offsets,
            n_neurons,
        })
    }

    /// Single-population spike vector
    pub fn with_neurons(n_neurons: u32) -> Result<Self> {
        Self::new(&[n_neurons])
    }

    /// Wrap words produced elsewhere (e.g. copied from a recording buffer)
    pub fn from_words(population_lengths: &[u32], words: &[u32]) -> Result<Self> {
        let mut vector = Self::new(population_lengths)?;
        if words.len() != vector.words.len() {
            return Err(EnsembleError::ArraySizeMismatch {
                what: "spike words",
                expected: vector.words.len(),
                actual: words.len(),
            });
        }
        vector.words.copy_from_slice(words);
        Ok(vector)
    }

    #[inline]
    pub fn n_neurons(&self) -> usize {
        self.n_neurons
    }

    #[inline]
    pub fn n_populations(&self) -> usize {
        self.population_lengths.len()
    }

    #[inline]
    pub fn population_lengths(&self) -> &[u32] {
        &self.population_lengths
    }

    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Mutable access for neuron models that write whole words at a time
    #[inline]
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Silence every neuron
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Word index and bit mask for an absolute neuron column
    fn locate(&self, neuron: usize) -> Option<(usize, u32)> {
        if neuron >= self.n_neurons {
            return None;
        }
        // Last population whose first column is <= neuron; skip empty populations
        let mut population = self.column_offsets.partition_point(|&start| start <= neuron) - 1;
        while self.population_lengths[population] == 0 {
            population -= 1;
        }
        let local = neuron - self.column_offsets[population];
        let word = self.word_offsets[population] + local / WORD_BITS as usize;
        Some((word, neuron_bit((local % WORD_BITS as usize) as u32)))
    }

    /// Mark `neuron` as firing this tick; returns false if out of range
    pub fn set_spike(&mut self, neuron: usize) -> bool {
        match self.locate(neuron) {
            Some((word, mask)) => {
                self.words[word] |= mask;
                true
            }
            None => false,
        }
    }

    pub fn is_firing(&self, neuron: usize) -> bool {
        self.locate(neuron)
            .map(|(word, mask)| self.words[word] & mask != 0)
            .unwrap_or(false)
    }

    /// Absolute columns of every firing neuron, in ascending order
    pub fn firing_columns(&self) -> FiringColumns<'_> {
        FiringColumns::new(&self.words, &self.population_lengths)
    }

    /// Number of firing neurons (padding bits excluded)
    pub fn count_spikes(&self) -> usize {
        self.population_lengths
            .iter()
            .zip(&self.word_offsets)
            .map(|(&length, &offset)| {
                let n_words = words_for(length);
                let full = (length / WORD_BITS) as usize;
                let tail = length % WORD_BITS;
                let mut count: usize = self.words[offset..offset + full]
                    .iter()
                    .map(|w| w.count_ones() as usize)
                    .sum();
                if n_words > full {
                    let mask = !(u32::MAX >> tail);
                    count += (self.words[offset + full] & mask).count_ones() as usize;
                }
                count
            })
            .sum()
    }
}

fn try_vec_with_capacity<T>(capacity: usize, what: &'static str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| EnsembleError::ResourceExhausted {
            what,
            requested: capacity,
        })?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_pads_each_population() {
        let v = SpikeVector::new(&[40, 5]).unwrap();
        assert_eq!(v.words().len(), 3);
        assert_eq!(v.n_neurons(), 45);
        assert_eq!(v.n_populations(), 2);
    }

    #[test]
    fn test_set_spike_crosses_population() {
        let mut v = SpikeVector::new(&[40, 5]).unwrap();
        assert!(v.set_spike(41));
        assert_eq!(v.words(), &[0, 0, neuron_bit(1)]);
        assert!(v.is_firing(41));
        assert!(!v.is_firing(40));
        assert!(!v.set_spike(45));
    }

    #[test]
    fn test_set_spike_skips_empty_populations() {
        let mut v = SpikeVector::new(&[2, 0, 3]).unwrap();
        assert!(v.set_spike(2));
        assert_eq!(v.words(), &[0, neuron_bit(0)]);
        assert_eq!(v.firing_columns().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_count_spikes_ignores_padding() {
        let v = SpikeVector::from_words(&[3, 33], &[0xFFFF_FFFF, 0xFFFF_FFFF, 0xFFFF_FFFF]).unwrap();
        assert_eq!(v.count_spikes(), 3 + 33);
        assert_eq!(v.firing_columns().count(), 36);
    }

    #[test]
    fn test_from_words_size_mismatch() {
        let err = SpikeVector::from_words(&[40], &[0]).unwrap_err();
        assert!(matches!(err, EnsembleError::ArraySizeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_clear() {
        let mut v = SpikeVector::with_neurons(10).unwrap();
        v.set_spike(3);
        v.set_spike(9);
        assert_eq!(v.count_spikes(), 2);
        v.clear();
        assert_eq!(v.count_spikes(), 0);
    }
}
