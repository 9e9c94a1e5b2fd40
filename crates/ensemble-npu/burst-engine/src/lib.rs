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

//! # Ensemble Tick Engine
//!
//! The real-time driver of one ensemble slice.
//!
//! ## Timing
//! - One timer tick per machine timestep; the timestep is also the deadline
//! - Ticks run to completion; overruns are logged and counted, never fatal
//! - Learning, filtering and decoding allocate nothing after boot
//!
//! ## Architecture
//! - `EnsembleRunner` owns the decoder, the PES registry, the filter
//!   collections and the spike vector
//! - Collaborators (neuron model, recording, output sink, scheduler) are
//!   traits from `ensemble-npu-runtime`
//! - Host control is "run for N ticks (or unbounded)" plus a cooperative stop

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod parameters;
pub mod run_control;
pub mod stats;
pub mod tick_loop_runner;

pub use error::{BootError, ControlError};
pub use parameters::EnsembleParameters;
pub use run_control::{RunLength, RunOutcome, RunnerState, StopHandle};
pub use stats::{RunStats, RunSummary, StatsHandle};
pub use tick_loop_runner::EnsembleRunner;
