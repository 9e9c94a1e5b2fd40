// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Ensemble Types Module
//!
//! Core value and error types shared by every ensemble crate.

pub mod error;
pub mod fixed;

pub use error::{EnsembleError, Result};
pub use fixed::S1615;
