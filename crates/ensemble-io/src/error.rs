// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for host I/O

use ensemble_npu_runtime::RuntimeError;
use thiserror::Error;

/// Failure to decode an SDP message received by the host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdpDecodeError {
    #[error("SDP message truncated: need at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("SDP payload of {0} bytes is not a whole number of S16.15 words")]
    MisalignedPayload(usize),
}

/// Failure to hand a message to the transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport is closed")]
    Closed,
}

/// Failure to boot an SDP transmitter
#[derive(Debug, Error)]
pub enum SdpTxError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("input filter {filter} is {actual} wide, transmitter sends {expected} dimensions")]
    FilterWidth {
        filter: usize,
        expected: u32,
        actual: usize,
    },

    #[error("system region truncated: need {expected} words, got {actual}")]
    TruncatedSystemRegion { expected: usize, actual: usize },

    #[error("invalid transmitter parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, SdpTxError>;
