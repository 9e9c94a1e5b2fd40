// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ensemble-observability
//!
//! Logging setup shared by every ensemble binary and test harness, with
//! per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: rolling log files in a per-run folder (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Workspace crate names accepted by `--debug-<crate>`
pub const KNOWN_CRATES: &[&str] = &[
    "ensemble-npu-neural",
    "ensemble-npu-runtime",
    "ensemble-npu-plasticity",
    "ensemble-npu-burst-engine",
    "ensemble-io",
    "ensemble-config",
    "nengo-ensemble",
];
