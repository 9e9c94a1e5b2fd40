// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensemble Neural Data Model (Platform-Agnostic)
//!
//! The data shared between the learning engine and the tick runtime:
//! - **Types**: `S1615` fixed-point values and construction errors
//! - **Decoder**: the row-major decoder matrix (one row per output dimension)
//! - **Spikes**: bit-packed, population-sharded spike vectors and the
//!   find-next-set-bit traversal over them
//!
//! Everything here is allocated once at boot. Per-tick operations never
//! allocate and never fail.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod decoder;
pub mod spikes;
pub mod types;

pub use decoder::DecoderMatrix;
pub use spikes::{find_next_set_bit, neuron_bit, words_for, FiringColumns, SpikeVector, WORD_BITS};
pub use types::{EnsembleError, Result, S1615};
