// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for booting and controlling an ensemble

use crate::run_control::RunnerState;
use ensemble_npu_neural::EnsembleError;
use ensemble_npu_plasticity::PesError;
use ensemble_npu_runtime::RuntimeError;
use thiserror::Error;

/// Fatal boot failure
///
/// There is no degraded mode: any of these leaves the core halted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    #[error("Ensemble data: {0}")]
    Ensemble(#[from] EnsembleError),

    #[error("PES learning: {0}")]
    Pes(#[from] PesError),

    #[error("Runtime: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Host control request rejected in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("Cannot start a run while {0}")]
    NotAwaitingStart(RunnerState),
}

pub type Result<T> = std::result::Result<T, BootError>;
