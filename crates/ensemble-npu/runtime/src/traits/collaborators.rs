// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron model, recording and output collaborators

use crate::traits::filters::FilterOutputs;
use ensemble_npu_neural::{DecoderMatrix, SpikeVector, S1615};

/// Neuron dynamics for one ensemble slice
///
/// The model owns membrane state. The runtime owns the spike vector and
/// clears nothing between ticks; the model is expected to overwrite every
/// word it is responsible for.
pub trait NeuronModel {
    /// Advance every neuron by one tick and write this tick's spikes
    fn step(&mut self, inputs: &dyn FilterOutputs, spikes: &mut SpikeVector);

    /// Project the firing set through the decoder into `output`
    ///
    /// The default is the plain linear decode.
    fn decode(&self, decoder: &DecoderMatrix, spikes: &SpikeVector, output: &mut [S1615]) {
        decoder.decode_into(spikes.firing_columns(), output);
    }
}

/// Per-run recording state
pub trait RecordingBuffers {
    /// Discard everything recorded in the previous run
    fn reset(&mut self);

    /// Record the spikes produced on `tick`
    fn record_spikes(&mut self, tick: u32, spikes: &SpikeVector);
}

/// Downstream consumer of the decoded output vector
pub trait OutputSink {
    /// Emit the output decoded on `tick`
    fn emit(&mut self, tick: u32, output: &[S1615]);
}
