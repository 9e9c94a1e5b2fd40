// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nengo-ensemble
//!
//! A spiking ensemble runtime with on-line decoder learning. Each timer
//! tick filters incoming vectors, applies the PES (Prescribed Error
//! Sensitivity) rule to the decoder using the previous tick's spikes, steps
//! the neuron model and emits the decoded output. A separate transmitter
//! filters output vectors and forwards them to the host over SDP.
//!
//! ## Crates
//! - [`neural`]: S16.15 values, decoder matrix, bit-packed spike vectors
//! - [`runtime`]: collaborator traits, input filters, schedulers
//! - [`plasticity`]: the PES learning rule registry
//! - [`burst_engine`]: the per-tick runtime loop
//! - [`io`]: SDP transmitter and transports
//! - [`config`]: TOML configuration with environment and CLI overrides
//! - [`observability`]: logging initialisation
//!
//! ## Usage
//!
//! ```rust
//! use nengo_ensemble::prelude::*;
//!
//! let mut config = EnsembleConfig::default();
//! config.ensemble.population_lengths = vec![32];
//! config.system.run_ticks = Some(10);
//!
//! let built = nengo_ensemble::build(&config)?;
//! let mut scheduler = DeterministicScheduler::new();
//! let mut runner = EnsembleRunner::boot(
//!     &built.ensemble,
//!     NullNeuronModel,
//!     NullRecording,
//!     NullOutputSink,
//!     &mut scheduler,
//! )?;
//! let summary = runner.run(&mut scheduler, built.run_length)?;
//! assert_eq!(summary.ticks, 10);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use ensemble_config as config;
pub use ensemble_io as io;
pub use ensemble_npu_burst_engine as burst_engine;
pub use ensemble_npu_neural as neural;
pub use ensemble_npu_plasticity as plasticity;
pub use ensemble_npu_runtime as runtime;
pub use ensemble_observability as observability;

pub mod assembly;

pub use assembly::{
    build, ensemble_parameters, pes_region, transmitter_parameters, AssemblyError, EnsembleBuild,
};

pub use ensemble_config::{
    load_config, validate_config, ConfigError, EnsembleConfig, LearningRuleConfig,
};
pub use ensemble_io::{
    MemoryTransport, MulticastOutput, P2pTransport, SdpMessage, SdpSource, SdpTransmitter,
    SdpTxParameters, TxRunSummary, UNBOUNDED_TICKS,
};
pub use ensemble_npu_burst_engine::{
    BootError, ControlError, EnsembleParameters, EnsembleRunner, RunLength, RunOutcome,
    RunStats, RunSummary, RunnerState, StopHandle,
};
pub use ensemble_npu_neural::{DecoderMatrix, EnsembleError, SpikeVector, S1615};
pub use ensemble_npu_plasticity::{
    InvariantViolation, LearningRule, PesError, PesRegionBuilder, PesRegionRecord, PesRegistry,
};
pub use ensemble_npu_runtime::{FilterRoute, FilterSpec};

/// Common imports for building and running an ensemble
pub mod prelude {
    pub use crate::{
        build, DecoderMatrix, EnsembleBuild, EnsembleConfig, EnsembleParameters, EnsembleRunner,
        LearningRule, MulticastOutput, PesRegistry, RunLength, RunOutcome, SdpSource,
        SdpTransmitter, SdpTxParameters, SpikeVector, S1615,
    };
    pub use ensemble_npu_runtime::{
        DeterministicScheduler, FilterOutputs, NeuronModel, NullNeuronModel, NullOutputSink,
        NullRecording, OutputSink, RealtimeScheduler, RecordingBuffers, Scheduler,
    };
}
