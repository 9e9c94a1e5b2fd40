// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensemble Decoder Learning
//!
//! Online learning of decoder weights with the PES rule.
//!
//! ## Features
//! - **Region parsing**: fallible, exactly-sized rule table from the PES region
//! - **Validation**: row ranges and filter indices checked once at boot
//! - **Instantaneous PES**: O(spikes) decoder update per tick, allocation free
//! - **Filtered activity**: parsed and validated, update delegated to a
//!   strategy (inert by default)
//!
//! ## Example
//!
//! ```
//! use ensemble_npu_neural::{DecoderMatrix, SpikeVector, S1615};
//! use ensemble_npu_plasticity::{LearningRule, PesRegionBuilder, PesRegistry};
//!
//! let block = PesRegionBuilder::new()
//!     .rule(LearningRule::instantaneous(S1615::from_f32(0.5), 0, 0))
//!     .to_bytes();
//! let registry = PesRegistry::initialise(&block).unwrap();
//!
//! let mut spikes = SpikeVector::with_neurons(4).unwrap();
//! spikes.set_spike(1);
//! let mut decoder = DecoderMatrix::zeros(1, 4).unwrap();
//! let errors = vec![vec![S1615::ONE]];
//! registry.validate(decoder.rows(), &errors, 0).unwrap();
//!
//! registry.apply(&spikes, &mut decoder, &errors);
//! assert_eq!(decoder.get(0, 1), Some(S1615::from_f32(-0.5)));
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod filtered_activity;
pub mod pes;
pub mod region;
pub mod rule;

pub use error::{InvariantViolation, PesError, Result};
pub use filtered_activity::{FilteredActivityUpdate, InertFilteredActivity};
pub use pes::PesRegistry;
pub use region::{PesRegionBuilder, PesRegionRecord, HEADER_BYTES, RECORD_BYTES};
pub use rule::{ActivityMode, LearningRule};
