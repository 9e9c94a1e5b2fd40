// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Collaborator traits for the ensemble tick runtime
//!
//! The runtime loop only ever talks to its surroundings through these:
//! - **Filters**: settled filter outputs (read by learning) and the packet
//!   side that accumulates input between ticks
//! - **Scheduler**: periodic timer and packet events, plus a clock
//! - **Collaborators**: neuron model, recording, output sink
//!
//! Every method called on the tick path is infallible and non-blocking.

pub mod collaborators;
pub mod error;
pub mod filters;
pub mod scheduler;

pub use collaborators::{NeuronModel, OutputSink, RecordingBuffers};
pub use error::{Result, RuntimeError};
pub use filters::{FilterOutputs, InputFilters};
pub use scheduler::{Dispatch, Event, Scheduler, TaskId};
