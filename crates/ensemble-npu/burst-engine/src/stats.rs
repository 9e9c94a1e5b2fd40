// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tick and run statistics

use parking_lot::RwLock;
use std::sync::Arc;

/// Counters accumulated across every run since boot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Runs started
    pub runs: u64,
    /// Timer ticks handled
    pub ticks: u64,
    /// Firing columns consumed by instantaneous learning rules
    pub spikes_learned: u64,
    /// Ticks that took longer than the timer period
    pub overruns: u64,
    /// Longest tick observed, in microseconds
    pub max_tick_us: u64,
    /// Packets routed into filters
    pub packets: u64,
    /// Packets that matched no route
    pub dropped_packets: u64,
}

impl RunStats {
    pub(crate) fn record_tick(&mut self, elapsed_us: u64, spikes_learned: usize, overran: bool) {
        self.ticks += 1;
        self.spikes_learned += spikes_learned as u64;
        self.max_tick_us = self.max_tick_us.max(elapsed_us);
        if overran {
            self.overruns += 1;
        }
    }
}

/// Snapshot of `RunStats` readable from other threads
///
/// The tick handler publishes into it at the end of every tick.
#[derive(Debug, Clone, Default)]
pub struct StatsHandle {
    inner: Arc<RwLock<RunStats>>,
}

impl StatsHandle {
    pub fn snapshot(&self) -> RunStats {
        *self.inner.read()
    }

    pub(crate) fn publish(&self, stats: &RunStats) {
        *self.inner.write() = *stats;
    }
}

/// What one call to `EnsembleRunner::run` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: crate::run_control::RunOutcome,
    /// Ticks executed in this run
    pub ticks: u64,
    /// Ticks in this run that overran the timer period
    pub overruns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tick() {
        let mut stats = RunStats::default();
        stats.record_tick(400, 7, false);
        stats.record_tick(1200, 3, true);
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.spikes_learned, 10);
        assert_eq!(stats.overruns, 1);
        assert_eq!(stats.max_tick_us, 1200);
    }

    #[test]
    fn test_handle_publishes_snapshot() {
        let handle = StatsHandle::default();
        let reader = handle.clone();
        let mut stats = RunStats::default();
        stats.record_tick(5, 1, false);
        handle.publish(&stats);
        assert_eq!(reader.snapshot().ticks, 1);
    }
}
