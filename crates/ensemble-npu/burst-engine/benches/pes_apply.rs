// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! PES apply microbenchmarks
//!
//! Purpose:
//! - Show that a learning tick scales with the number of spikes, not neurons.
//! - Track the full tick (filters + learning + decode) at realistic sizes.
//!
//! Notes:
//! - Fixed inputs, no I/O.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ensemble_npu_burst_engine::{EnsembleParameters, EnsembleRunner};
use ensemble_npu_neural::{DecoderMatrix, SpikeVector, S1615};
use ensemble_npu_plasticity::{LearningRule, PesRegionBuilder, PesRegistry};
use ensemble_npu_runtime::{
    DeterministicScheduler, FilterOutputs, FilterRoute, FilterSpec, NeuronModel, NullOutputSink,
    NullRecording,
};

const DIMENSIONS: usize = 4;

/// Deterministic spike pattern: every `stride`-th neuron fires
fn spikes_with_stride(populations: &[u32], stride: usize) -> SpikeVector {
    let mut spikes = SpikeVector::new(populations).unwrap();
    for column in (0..spikes.n_neurons()).step_by(stride) {
        spikes.set_spike(column);
    }
    spikes
}

fn registry() -> PesRegistry {
    PesRegistry::from_rules(&[LearningRule::instantaneous(
        S1615::from_f32(1e-3),
        0,
        0,
    )])
    .unwrap()
}

fn bench_apply_by_firing_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("pes_apply_firing_rate");
    group.measurement_time(Duration::from_secs(3));

    let populations = [1024u32, 1024, 512];
    let n_neurons: u32 = populations.iter().sum();
    let errors = vec![vec![S1615::from_f32(0.01); DIMENSIONS]];
    let registry = registry();

    for stride in [1usize, 10, 100, 1000] {
        let spikes = spikes_with_stride(&populations, stride);
        let mut decoder = DecoderMatrix::zeros(DIMENSIONS, n_neurons as usize).unwrap();
        group.throughput(Throughput::Elements(spikes.count_spikes() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(stride), &spikes, |b, spikes| {
            b.iter(|| {
                black_box(registry.apply(black_box(spikes), &mut decoder, &errors));
            })
        });
    }
    group.finish();
}

/// Fires every 20th neuron each tick
struct Sparse;

impl NeuronModel for Sparse {
    fn step(&mut self, _inputs: &dyn FilterOutputs, spikes: &mut SpikeVector) {
        spikes.clear();
        for column in (0..spikes.n_neurons()).step_by(20) {
            spikes.set_spike(column);
        }
    }
}

fn bench_full_tick(c: &mut Criterion) {
    let params = EnsembleParameters::new(1000, &[1000], DIMENSIONS as u32)
        .with_modulatory_filters(
            vec![FilterSpec::low_pass(DIMENSIONS as u32, 0.005, 0.001)],
            vec![FilterRoute {
                key: 0xE000,
                mask: 0xFFFF_FF00,
                filter_index: 0,
                dimension_mask: 0xFF,
            }],
        )
        .with_pes_region(
            PesRegionBuilder::new()
                .rule(LearningRule::instantaneous(S1615::from_f32(1e-3), 0, 0))
                .to_bytes(),
        );
    let mut scheduler = DeterministicScheduler::new();
    let mut runner =
        EnsembleRunner::boot(&params, Sparse, NullRecording, NullOutputSink, &mut scheduler)
            .unwrap();
    for d in 0..DIMENSIONS as u32 {
        runner.handle_packet(0xE000 | d, S1615::from_f32(0.1));
    }

    let mut tick = 0u32;
    c.bench_function("ensemble_tick_1000_neurons", |b| {
        b.iter(|| {
            tick = tick.wrapping_add(1);
            black_box(runner.handle_timer_tick(tick));
        })
    });
}

criterion_group!(benches, bench_apply_by_firing_rate, bench_full_tick);
criterion_main!(benches);
