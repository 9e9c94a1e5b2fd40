// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for ensemble data-model construction
//!
//! Only construction can fail. Once a decoder matrix or spike vector exists,
//! every per-tick operation on it is infallible.

/// Errors raised while building ensemble data structures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnsembleError {
    /// An allocation required at boot could not be satisfied
    #[error("resource exhausted: could not allocate {what} ({requested} elements)")]
    ResourceExhausted { what: &'static str, requested: usize },

    #[error("array size mismatch for {what}: expected {expected}, got {actual}")]
    ArraySizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("population lengths sum to {actual} neurons but the ensemble has {expected}")]
    PopulationMismatch { expected: usize, actual: usize },

    #[error("dimension overflow: {rows} x {columns} does not fit in memory")]
    DimensionOverflow { rows: usize, columns: usize },
}

pub type Result<T> = core::result::Result<T, EnsembleError>;
