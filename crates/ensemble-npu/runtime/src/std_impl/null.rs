// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! No-op collaborators and an in-memory spike recorder

use crate::traits::{FilterOutputs, NeuronModel, OutputSink, RecordingBuffers};
use ensemble_npu_neural::{SpikeVector, S1615};

/// Neuron model that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNeuronModel;

impl NeuronModel for NullNeuronModel {
    fn step(&mut self, _inputs: &dyn FilterOutputs, spikes: &mut SpikeVector) {
        spikes.clear();
    }
}

/// Recording that keeps nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecording;

impl RecordingBuffers for NullRecording {
    fn reset(&mut self) {}

    fn record_spikes(&mut self, _tick: u32, _spikes: &SpikeVector) {}
}

/// Output sink that discards every vector
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutputSink;

impl OutputSink for NullOutputSink {
    fn emit(&mut self, _tick: u32, _output: &[S1615]) {}
}

/// Keeps a copy of the spike words of every recorded tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpikeRecorder {
    ticks: Vec<u32>,
    words: Vec<u32>,
    words_per_tick: usize,
}

impl SpikeRecorder {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ticks recorded in the current run
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether nothing has been recorded in the current run
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Tick numbers in recording order
    pub fn ticks(&self) -> &[u32] {
        &self.ticks
    }

    /// Spike words recorded for the `index`-th recorded tick
    pub fn frame(&self, index: usize) -> Option<&[u32]> {
        if index >= self.ticks.len() {
            return None;
        }
        let start = index * self.words_per_tick;
        self.words.get(start..start + self.words_per_tick)
    }
}

impl RecordingBuffers for SpikeRecorder {
    fn reset(&mut self) {
        self.ticks.clear();
        self.words.clear();
    }

    fn record_spikes(&mut self, tick: u32, spikes: &SpikeVector) {
        self.words_per_tick = spikes.words().len();
        self.ticks.push(tick);
        self.words.extend_from_slice(spikes.words());
    }
}
