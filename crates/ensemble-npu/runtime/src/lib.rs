// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # Ensemble Runtime Abstraction
//!
//! The collaborators the tick runtime talks to, and the in-workspace
//! implementations of them.
//!
//! This crate provides:
//! - **Traits** (always available): `FilterOutputs`, `InputFilters`,
//!   `Scheduler`, `NeuronModel`, `RecordingBuffers`, `OutputSink`
//! - **Filters**: `FilterCollection`, first-order low-pass filters fed by
//!   routed multicast packets
//! - **Schedulers**: `DeterministicScheduler` (fake clock, for tests) and,
//!   behind the `std` feature, `RealtimeScheduler` (wall clock)
//! - **Null collaborators**: no-op neuron model, recorder and output sink
//! - **Run control**: `StopHandle`, a cooperative stop shared across threads
//!
//! ## Usage
//!
//! ```rust
//! use ensemble_npu_runtime::{DeterministicScheduler, Event, Scheduler};
//!
//! let mut scheduler = DeterministicScheduler::new();
//! let timer = scheduler.register_periodic(1000).unwrap();
//! let dispatch = scheduler.next_dispatch().unwrap();
//! assert_eq!(dispatch.task, timer);
//! assert!(matches!(dispatch.event, Event::TimerTick { tick: 0 }));
//! ```

#![warn(missing_docs)]

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod traits;

pub use traits::{
    Dispatch, Event, FilterOutputs, InputFilters, NeuronModel, OutputSink, RecordingBuffers,
    Result, RuntimeError, Scheduler, TaskId,
};

pub mod std_impl;

pub use std_impl::{
    DeterministicScheduler, FakeClock, FilterCollection, FilterRoute, FilterSpec, LowPassFilter,
    NullNeuronModel, NullOutputSink, NullRecording, SpikeRecorder, StopHandle,
};

#[cfg(feature = "std")]
pub use std_impl::{PacketSender, RealtimeScheduler};
