// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Integration Tests: Complete Tick Workflow
//!
//! End-to-end tests for the ensemble runtime:
//! - PES region → boot → validation
//! - Error packets → modulatory filters → decoder learning
//! - Multi-population spike layouts
//! - Start/stop/run-length control on both schedulers

use ensemble_npu_burst_engine::{
    BootError, EnsembleParameters, EnsembleRunner, RunLength, RunOutcome, RunnerState,
};
use ensemble_npu_neural::{SpikeVector, S1615};
use ensemble_npu_plasticity::{InvariantViolation, LearningRule, PesError, PesRegionBuilder};
use ensemble_npu_runtime::{
    DeterministicScheduler, FilterOutputs, FilterRoute, FilterSpec, NeuronModel, NullOutputSink,
    NullRecording, OutputSink, RealtimeScheduler, SpikeRecorder,
};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════
// Helper Functions
// ═══════════════════════════════════════════════════════════

const INPUT_KEY: u32 = 0x0001_0000;
const ERROR_KEY: u32 = 0x0002_0000;

fn route(key: u32) -> FilterRoute {
    FilterRoute {
        key,
        mask: 0xFFFF_0000,
        filter_index: 0,
        dimension_mask: 0x0000_FFFF,
    }
}

/// Each neuron fires when the input dimension with its index is positive
struct Threshold;

impl NeuronModel for Threshold {
    fn step(&mut self, inputs: &dyn FilterOutputs, spikes: &mut SpikeVector) {
        spikes.clear();
        if let Some(drive) = inputs.output(0) {
            for (neuron, value) in drive.iter().enumerate() {
                if *value > S1615::ZERO {
                    spikes.set_spike(neuron);
                }
            }
        }
    }
}

/// Keeps every emitted output vector
#[derive(Default)]
struct CollectingSink(Vec<Vec<S1615>>);

impl OutputSink for CollectingSink {
    fn emit(&mut self, _tick: u32, output: &[S1615]) {
        self.0.push(output.to_vec());
    }
}

/// Two populations (40 + 5 neurons), one output dimension, one PES rule
fn two_population_params(learning_rate: f32) -> EnsembleParameters {
    EnsembleParameters::new(1000, &[40, 5], 1)
        .with_input_filters(vec![FilterSpec::pass_through(45).latching()], vec![route(INPUT_KEY)])
        .with_modulatory_filters(vec![FilterSpec::pass_through(1).latching()], vec![route(ERROR_KEY)])
        .with_pes_region(
            PesRegionBuilder::new()
                .rule(LearningRule::instantaneous(S1615::from_f32(learning_rate), 0, 0))
                .to_bytes(),
        )
}

// ═══════════════════════════════════════════════════════════
// Learning through the tick loop
// ═══════════════════════════════════════════════════════════

#[test]
fn test_only_the_firing_column_learns_across_populations() {
    let mut scheduler = DeterministicScheduler::new();
    let mut runner = EnsembleRunner::boot(
        &two_population_params(0.25),
        Threshold,
        SpikeRecorder::new(),
        CollectingSink::default(),
        &mut scheduler,
    )
    .unwrap();

    // Drive global column 41 (population 1, neuron 1) and hold an error of 1.0
    scheduler.inject_packet_before_tick(0, INPUT_KEY | 41, S1615::ONE);
    scheduler.inject_packet_before_tick(0, ERROR_KEY, S1615::ONE);

    let summary = runner.run(&mut scheduler, RunLength::Ticks(5)).unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);

    // Column 41 fired on ticks 0..5 and learning saw ticks 0..4
    let decoder = runner.decoder();
    for column in 0..45 {
        let expected = if column == 41 {
            S1615::from_f32(-1.0)
        } else {
            S1615::ZERO
        };
        assert_eq!(decoder.get(0, column), Some(expected), "column {column}");
    }

    // Spike word layout: [pop0 w0, pop0 w1, pop1 w0], neuron 1 of pop1 is bit 30
    let recorded = runner.recording().frame(0).unwrap();
    assert_eq!(recorded, &[0, 0, 0x4000_0000]);

    // Output tracks the decoder as it learns
    let outputs: Vec<f32> = runner.sink().0.iter().map(|o| o[0].to_f32()).collect();
    assert_eq!(outputs, vec![0.0, -0.25, -0.5, -0.75, -1.0]);
}

#[test]
fn test_zero_error_leaves_decoder_untouched() {
    let initial: Vec<S1615> = (0..45).map(|i| S1615::from_bits(i * 1000)).collect();
    let params = two_population_params(1.0).with_decoder(initial.clone());
    let mut scheduler = DeterministicScheduler::new();
    let mut runner = EnsembleRunner::boot(
        &params,
        Threshold,
        NullRecording,
        NullOutputSink,
        &mut scheduler,
    )
    .unwrap();

    for column in 0..45 {
        scheduler.inject_packet_before_tick(0, INPUT_KEY | column, S1615::ONE);
    }
    runner.run(&mut scheduler, RunLength::Ticks(4)).unwrap();

    assert_eq!(runner.decoder().as_slice(), initial.as_slice());
    assert_eq!(runner.stats().spikes_learned, 3 * 45);
}

#[test]
fn test_filtered_activity_rule_boots_and_stays_inert() {
    let params = two_population_params(1.0)
        .with_activity_filters(1)
        .with_pes_region(
            PesRegionBuilder::new()
                .rule(LearningRule::filtered(S1615::ONE, None, 0, 0))
                .to_bytes(),
        );
    let mut scheduler = DeterministicScheduler::new();
    let mut runner = EnsembleRunner::boot(
        &params,
        Threshold,
        NullRecording,
        NullOutputSink,
        &mut scheduler,
    )
    .unwrap();

    scheduler.inject_packet_before_tick(0, INPUT_KEY | 3, S1615::ONE);
    scheduler.inject_packet_before_tick(0, ERROR_KEY, S1615::ONE);
    runner.run(&mut scheduler, RunLength::Ticks(3)).unwrap();
    assert!(runner.decoder().as_slice().iter().all(|v| v.is_zero()));
}

// ═══════════════════════════════════════════════════════════
// Boot failures
// ═══════════════════════════════════════════════════════════

#[test]
fn test_missing_error_channel_is_fatal() {
    let params = two_population_params(1.0).with_pes_region(
        PesRegionBuilder::new()
            .rule(LearningRule::instantaneous(S1615::ONE, 2, 0))
            .to_bytes(),
    );
    let mut scheduler = DeterministicScheduler::new();
    let result = EnsembleRunner::boot(
        &params,
        Threshold,
        NullRecording,
        NullOutputSink,
        &mut scheduler,
    );
    match result {
        Err(BootError::Pes(PesError::ConfigurationInvariantViolation { rule, reason })) => {
            assert_eq!(rule, 0);
            assert_eq!(
                reason,
                InvariantViolation::MissingErrorChannel {
                    channel: 2,
                    available: 1
                }
            );
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("boot should fail"),
    }
}

#[test]
fn test_truncated_pes_region_is_fatal() {
    let params = two_population_params(1.0).with_pes_region(vec![1, 0, 0, 0, 7]);
    let mut scheduler = DeterministicScheduler::new();
    let result = EnsembleRunner::boot(
        &params,
        Threshold,
        NullRecording,
        NullOutputSink,
        &mut scheduler,
    );
    assert!(matches!(
        result,
        Err(BootError::Pes(PesError::TruncatedRegion { .. }))
    ));
}

#[test]
fn test_decoder_shape_mismatch_is_fatal() {
    let params = two_population_params(1.0).with_decoder(vec![S1615::ZERO; 44]);
    let mut scheduler = DeterministicScheduler::new();
    let result = EnsembleRunner::boot(
        &params,
        Threshold,
        NullRecording,
        NullOutputSink,
        &mut scheduler,
    );
    assert!(matches!(result, Err(BootError::Ensemble(_))));
}

// ═══════════════════════════════════════════════════════════
// Run control
// ═══════════════════════════════════════════════════════════

#[test]
fn test_runs_alternate_with_awaiting_start() {
    let mut scheduler = DeterministicScheduler::new();
    let mut runner = EnsembleRunner::boot(
        &two_population_params(0.5),
        Threshold,
        NullRecording,
        NullOutputSink,
        &mut scheduler,
    )
    .unwrap();

    for run in 1..=3u64 {
        let summary = runner.run(&mut scheduler, RunLength::Ticks(10)).unwrap();
        assert_eq!(summary.ticks, 10);
        assert_eq!(runner.state(), RunnerState::AwaitingStart);
        assert_eq!(runner.stats().runs, run);
    }
    assert_eq!(scheduler.ticks_dispatched(), 30);
}

#[test]
fn test_filter_state_carries_over_between_runs() {
    let mut scheduler = DeterministicScheduler::new();
    let mut runner = EnsembleRunner::boot(
        &two_population_params(0.5),
        Threshold,
        SpikeRecorder::new(),
        NullOutputSink,
        &mut scheduler,
    )
    .unwrap();

    // Latched input for neuron 3 arrives only during the first run
    scheduler.inject_packet_before_tick(0, INPUT_KEY | 3, S1615::ONE);
    runner.run(&mut scheduler, RunLength::Ticks(2)).unwrap();
    runner.run(&mut scheduler, RunLength::Ticks(2)).unwrap();

    // Recording restarts with the run, the filter does not
    assert_eq!(runner.recording().len(), 2);
    assert_eq!(runner.recording().frame(0).unwrap(), &[0x1000_0000, 0, 0]);
    assert_eq!(runner.input_filters().output(0).unwrap()[3], S1615::ONE);
}

#[test]
fn test_realtime_run_with_cross_thread_stop() {
    let mut scheduler = RealtimeScheduler::new().with_poll_interval(Duration::from_micros(50));
    let mut runner = EnsembleRunner::boot(
        &EnsembleParameters::new(500, &[8], 1),
        Threshold,
        NullRecording,
        NullOutputSink,
        &mut scheduler,
    )
    .unwrap();

    let bounded = runner.run(&mut scheduler, RunLength::Ticks(4)).unwrap();
    assert_eq!(bounded.outcome, RunOutcome::Completed);
    assert_eq!(bounded.ticks, 4);

    let stop = runner.stop_handle();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        stop.request_stop();
    });
    let unbounded = runner.run(&mut scheduler, RunLength::Unbounded).unwrap();
    stopper.join().unwrap();

    assert_eq!(unbounded.outcome, RunOutcome::Stopped);
    assert!(unbounded.ticks >= 1);
}
