// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for runtime construction

use thiserror::Error;

/// Runtime errors
///
/// Only raised while collaborators are being built at boot; nothing on the
/// tick path returns one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Allocation could not be satisfied
    #[error("Resource exhausted: could not allocate {requested} elements for {what}")]
    ResourceExhausted {
        /// What was being allocated
        what: &'static str,
        /// Requested element count
        requested: usize,
    },

    /// A filter route points at a filter that does not exist
    #[error("Filter route {route} targets filter {filter_index}, but only {available} filters exist")]
    UnknownFilter {
        /// Route index
        route: usize,
        /// Target filter index
        filter_index: u32,
        /// Number of filters in the collection
        available: usize,
    },

    /// A scheduler slot was requested twice
    #[error("Task already registered: {0}")]
    TaskAlreadyRegistered(&'static str),

    /// Invalid parameters provided
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for runtime operations
pub type Result<T> = core::result::Result<T, RuntimeError>;
