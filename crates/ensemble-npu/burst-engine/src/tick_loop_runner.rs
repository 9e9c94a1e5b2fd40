// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensemble Tick Loop Runner
//!
//! Drives one ensemble slice through its lifecycle:
//!
//! ```text
//! Booting -> AwaitingStart -> Running -> AwaitingStart -> ...
//! ```
//!
//! ## Tick order
//! Every timer tick runs to completion, strictly in this order:
//! 1. advance the input and modulatory filter collections
//! 2. apply the PES rules to the spikes of the *previous* tick
//! 3. step the neuron model, decode the output, record and emit
//! 4. finish the run if its length has been reached
//!
//! Packet handlers only accumulate into filter inputs, so nothing they do
//! is visible until step 1 of the next tick.

use crate::error::{BootError, ControlError, Result};
use crate::parameters::EnsembleParameters;
use crate::run_control::{RunLength, RunOutcome, RunnerState, StopHandle};
use crate::stats::{RunStats, RunSummary, StatsHandle};
use ensemble_npu_neural::{DecoderMatrix, SpikeVector, S1615};
use ensemble_npu_plasticity::{FilteredActivityUpdate, InertFilteredActivity, PesRegistry};
use ensemble_npu_runtime::{
    Event, FilterCollection, InputFilters, NeuronModel, OutputSink, RecordingBuffers, Scheduler,
    TaskId,
};
use tracing::{debug, error, info, trace, warn};

/// Owns every piece of per-ensemble state used on the tick path
pub struct EnsembleRunner<N, R, O, A = InertFilteredActivity> {
    state: RunnerState,
    machine_timestep_us: u32,
    decoder: DecoderMatrix,
    registry: PesRegistry<A>,
    input_filters: FilterCollection,
    modulatory_filters: FilterCollection,
    spikes: SpikeVector,
    output: Vec<S1615>,
    neuron: N,
    recording: R,
    sink: O,
    timer_task: TaskId,
    packet_task: TaskId,
    stop: StopHandle,
    stats: RunStats,
    stats_handle: StatsHandle,
}

impl<N, R, O> EnsembleRunner<N, R, O, InertFilteredActivity>
where
    N: NeuronModel,
    R: RecordingBuffers,
    O: OutputSink,
{
    /// Allocate everything, validate the learning rules and register the
    /// timer and packet tasks
    ///
    /// Any failure is fatal and is reported once on the diagnostic channel.
    pub fn boot<S: Scheduler>(
        params: &EnsembleParameters,
        neuron: N,
        recording: R,
        sink: O,
        scheduler: &mut S,
    ) -> Result<Self> {
        debug!("[ENSEMBLE] State: {}", RunnerState::Booting);
        let result = Self::try_boot(params, neuron, recording, sink, scheduler);
        if let Err(e) = &result {
            error!("[ENSEMBLE] Failed to start: {}", e);
        }
        result
    }

    fn try_boot<S: Scheduler>(
        params: &EnsembleParameters,
        neuron: N,
        recording: R,
        sink: O,
        scheduler: &mut S,
    ) -> Result<Self> {
        if params.machine_timestep_us == 0 {
            return Err(BootError::InvalidParameters(
                "machine timestep must be at least 1 microsecond".to_string(),
            ));
        }

        let spikes = SpikeVector::new(&params.population_lengths)?;
        let n_neurons = spikes.n_neurons();
        let n_dimensions = params.n_dimensions as usize;
        let decoder = if params.decoder.is_empty() {
            DecoderMatrix::zeros(n_dimensions, n_neurons)?
        } else {
            DecoderMatrix::from_row_major(n_dimensions, n_neurons, &params.decoder)?
        };

        let input_filters = FilterCollection::new(&params.input_filters, &params.input_routes)?;
        let modulatory_filters =
            FilterCollection::new(&params.modulatory_filters, &params.modulatory_routes)?;

        let registry = PesRegistry::initialise(&params.pes_region)?;
        registry.validate(
            decoder.rows(),
            &modulatory_filters,
            params.activity_filter_count as usize,
        )?;

        let mut output = Vec::new();
        output
            .try_reserve_exact(n_dimensions)
            .map_err(|_| ensemble_npu_neural::EnsembleError::ResourceExhausted {
                what: "output vector",
                requested: n_dimensions,
            })?;
        output.resize(n_dimensions, S1615::ZERO);

        let timer_task = scheduler.register_periodic(params.machine_timestep_us)?;
        let packet_task = scheduler.register_on_packet()?;

        info!(
            "[ENSEMBLE] Booted: {} neurons in {} populations, {} dimensions, {} PES rules, tick period {}us",
            n_neurons,
            spikes.n_populations(),
            n_dimensions,
            registry.len(),
            params.machine_timestep_us
        );

        Ok(Self {
            state: RunnerState::AwaitingStart,
            machine_timestep_us: params.machine_timestep_us,
            decoder,
            registry,
            input_filters,
            modulatory_filters,
            spikes,
            output,
            neuron,
            recording,
            sink,
            timer_task,
            packet_task,
            stop: StopHandle::new(),
            stats: RunStats::default(),
            stats_handle: StatsHandle::default(),
        })
    }
}

impl<N, R, O, A> EnsembleRunner<N, R, O, A>
where
    N: NeuronModel,
    R: RecordingBuffers,
    O: OutputSink,
    A: FilteredActivityUpdate,
{
    /// Replace the strategy used by filtered-activity learning rules
    pub fn with_filtered_activity<B: FilteredActivityUpdate>(
        self,
        strategy: B,
    ) -> EnsembleRunner<N, R, O, B> {
        EnsembleRunner {
            state: self.state,
            machine_timestep_us: self.machine_timestep_us,
            decoder: self.decoder,
            registry: self.registry.with_filtered_activity(strategy),
            input_filters: self.input_filters,
            modulatory_filters: self.modulatory_filters,
            spikes: self.spikes,
            output: self.output,
            neuron: self.neuron,
            recording: self.recording,
            sink: self.sink,
            timer_task: self.timer_task,
            packet_task: self.packet_task,
            stop: self.stop,
            stats: self.stats,
            stats_handle: self.stats_handle,
        }
    }

    /// Execute one run of `length` ticks
    ///
    /// Returns when the run length is reached, a stop is requested, or the
    /// scheduler runs dry. The runner is back in `AwaitingStart` afterwards.
    pub fn run<S: Scheduler>(
        &mut self,
        scheduler: &mut S,
        length: RunLength,
    ) -> std::result::Result<RunSummary, ControlError> {
        if self.state != RunnerState::AwaitingStart {
            return Err(ControlError::NotAwaitingStart(self.state));
        }
        self.begin_run(scheduler, length);

        let mut ticks = 0u64;
        let mut overruns = 0u64;
        let outcome = loop {
            if length.is_reached(ticks) {
                break RunOutcome::Completed;
            }
            let Some(dispatch) = scheduler.next_dispatch() else {
                break RunOutcome::SourceExhausted;
            };

            match dispatch.event {
                Event::Packet { key, payload } if dispatch.task == self.packet_task => {
                    self.handle_packet(key, payload);
                }
                Event::TimerTick { tick } if dispatch.task == self.timer_task => {
                    if self.stop.is_requested() {
                        break RunOutcome::Stopped;
                    }

                    let started_us = scheduler.now_us();
                    let learned = self.handle_timer_tick(tick);
                    let elapsed_us = scheduler.now_us().saturating_sub(started_us);

                    let overran = elapsed_us > u64::from(self.machine_timestep_us);
                    if overran {
                        overruns += 1;
                        warn!(
                            "[ENSEMBLE] ⚠️ Tick {} overran its deadline: {}us > {}us",
                            tick, elapsed_us, self.machine_timestep_us
                        );
                    }
                    self.stats.record_tick(elapsed_us, learned, overran);
                    self.stats_handle.publish(&self.stats);
                    ticks += 1;
                }
                _ => {
                    trace!(
                        "[ENSEMBLE] Ignoring dispatch for unregistered task {:?}",
                        dispatch.task
                    );
                }
            }
        };

        self.state = RunnerState::AwaitingStart;
        self.stats_handle.publish(&self.stats);
        info!(
            "[ENSEMBLE] Run ended ({:?}) after {} ticks, {} overruns",
            outcome, ticks, overruns
        );

        Ok(RunSummary {
            outcome,
            ticks,
            overruns,
        })
    }

    fn begin_run<S: Scheduler>(&mut self, scheduler: &mut S, length: RunLength) {
        self.recording.reset();
        self.spikes.clear();
        self.stop.clear();
        let flushed = scheduler.flush_packets();
        scheduler.begin_run();

        self.state = RunnerState::Running;
        self.stats.runs += 1;
        info!(
            "[ENSEMBLE] Starting run {} ({}), {} stale packets flushed",
            self.stats.runs, length, flushed
        );
    }

    /// Timer handler: filters, learning, neurons, in that order
    ///
    /// Returns the number of firing columns consumed by learning.
    pub fn handle_timer_tick(&mut self, tick: u32) -> usize {
        self.input_filters.advance();
        self.modulatory_filters.advance();

        // Spikes still hold the previous tick's firing set here
        let learned = self
            .registry
            .apply(&self.spikes, &mut self.decoder, &self.modulatory_filters);

        self.neuron.step(&self.input_filters, &mut self.spikes);
        self.neuron
            .decode(&self.decoder, &self.spikes, &mut self.output);
        self.recording.record_spikes(tick, &self.spikes);
        self.sink.emit(tick, &self.output);

        trace!("[ENSEMBLE] Tick {}: {} spikes learned", tick, learned);
        learned
    }

    /// Packet handler: accumulate into every filter collection whose routes match
    pub fn handle_packet(&mut self, key: u32, payload: S1615) -> bool {
        let input = self.input_filters.receive_packet(key, payload);
        let modulatory = self.modulatory_filters.receive_packet(key, payload);
        let matched = input || modulatory;
        if matched {
            self.stats.packets += 1;
        } else {
            self.stats.dropped_packets += 1;
        }
        matched
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn machine_timestep_us(&self) -> u32 {
        self.machine_timestep_us
    }

    pub fn decoder(&self) -> &DecoderMatrix {
        &self.decoder
    }

    pub fn registry(&self) -> &PesRegistry<A> {
        &self.registry
    }

    pub fn input_filters(&self) -> &FilterCollection {
        &self.input_filters
    }

    pub fn modulatory_filters(&self) -> &FilterCollection {
        &self.modulatory_filters
    }

    /// Spikes produced by the most recent tick
    pub fn spikes(&self) -> &SpikeVector {
        &self.spikes
    }

    /// Output decoded on the most recent tick
    pub fn output(&self) -> &[S1615] {
        &self.output
    }

    pub fn neuron(&self) -> &N {
        &self.neuron
    }

    pub fn neuron_mut(&mut self) -> &mut N {
        &mut self.neuron
    }

    pub fn recording(&self) -> &R {
        &self.recording
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut O {
        &mut self.sink
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Handle for reading statistics from another thread
    pub fn stats_handle(&self) -> StatsHandle {
        self.stats_handle.clone()
    }

    /// Handle for requesting a cooperative stop from another thread
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}
