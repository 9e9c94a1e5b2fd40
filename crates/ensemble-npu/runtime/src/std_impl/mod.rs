// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Ensemble Runtime - Implementations
//!
//! In-workspace implementations of the collaborator traits.
//!
//! ## Contents
//! - Input filters: `FilterCollection` and its routing table
//! - Schedulers: `DeterministicScheduler` with a `FakeClock`, and
//!   `RealtimeScheduler` with a cross-thread `PacketSender` (`std` feature)
//! - Null collaborators plus `SpikeRecorder`
//! - `StopHandle`: cooperative stop for run loops

pub mod deterministic;
pub mod filters;
pub mod null;
#[cfg(feature = "std")]
pub mod realtime;
pub mod stop;

pub use deterministic::{DeterministicScheduler, FakeClock};
pub use filters::{FilterCollection, FilterRoute, FilterSpec, LowPassFilter};
pub use null::{NullNeuronModel, NullOutputSink, NullRecording, SpikeRecorder};
#[cfg(feature = "std")]
pub use realtime::{PacketSender, RealtimeScheduler};
pub use stop::StopHandle;
