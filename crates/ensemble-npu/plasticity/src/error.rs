// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for learning rule construction
//!
//! Every variant is raised at boot only. `apply` has no error path.

use thiserror::Error;

/// Why a configured rule cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("error channel {0} is negative and is not the -1 sentinel")]
    InvalidErrorChannel(i32),

    #[error("instantaneous rule has no error channel")]
    MissingErrorSignal,

    #[error("error channel {channel} does not exist ({available} modulatory filters)")]
    MissingErrorChannel { channel: u32, available: usize },

    #[error("decoder rows {first}..{end} exceed the {rows} decoder rows")]
    DecoderRowsOutOfRange { first: u32, end: u64, rows: usize },

    #[error("activity filter index {0} is negative and is not the -1 sentinel")]
    InvalidActivityFilterIndex(i32),

    #[error("activity filter {index} does not exist ({available} activity filters)")]
    MissingActivityFilter { index: u32, available: usize },
}

/// PES registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PesError {
    #[error("PES region truncated: expected at least {expected} bytes, found {actual}")]
    TruncatedRegion { expected: usize, actual: usize },

    #[error("Resource exhausted: could not allocate {requested} learning rules")]
    ResourceExhausted { requested: usize },

    #[error("Learning rule {rule} violates a configuration invariant: {reason}")]
    ConfigurationInvariantViolation {
        rule: usize,
        reason: InvariantViolation,
    },
}

pub type Result<T> = std::result::Result<T, PesError>;
