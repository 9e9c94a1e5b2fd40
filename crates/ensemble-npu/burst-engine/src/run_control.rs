// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run lifecycle: states, run lengths and cooperative stop

use std::fmt;

pub use ensemble_npu_runtime::StopHandle;

/// Lifecycle of the tick runtime
///
/// `Booting` happens once, inside `EnsembleRunner::boot`; afterwards the
/// runner alternates between `AwaitingStart` and `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerState {
    Booting,
    AwaitingStart,
    Running,
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunnerState::Booting => "booting",
            RunnerState::AwaitingStart => "awaiting start",
            RunnerState::Running => "running",
        };
        f.write_str(name)
    }
}

/// How long a run lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunLength {
    /// Exactly this many timer ticks
    Ticks(u32),
    /// Until stopped
    Unbounded,
}

impl RunLength {
    /// Host encoding, where `u32::MAX` means unbounded
    pub fn from_host_ticks(ticks: u32) -> Self {
        if ticks == u32::MAX {
            RunLength::Unbounded
        } else {
            RunLength::Ticks(ticks)
        }
    }

    /// Whether `completed` ticks finish the run
    #[inline]
    pub fn is_reached(&self, completed: u64) -> bool {
        match self {
            RunLength::Ticks(n) => completed >= u64::from(*n),
            RunLength::Unbounded => false,
        }
    }
}

impl fmt::Display for RunLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunLength::Ticks(n) => write!(f, "{} ticks", n),
            RunLength::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// The requested number of ticks completed
    Completed,
    /// A stop was requested
    Stopped,
    /// The scheduler stopped producing events
    SourceExhausted,
}
