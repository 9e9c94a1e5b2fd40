// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Event scheduler abstraction
//!
//! The platform delivers two kinds of events to an application core: a
//! periodic timer tick and received multicast packets. Handlers are
//! registered once at boot. The runtime then pulls dispatches one at a time
//! and runs each handler to completion before asking for the next, which is
//! what keeps the tick handler and the packet handler from ever overlapping.

use crate::traits::error::Result;
use ensemble_npu_neural::S1615;

/// Handle returned when a task is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u32);

/// A single event delivered by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Periodic timer fired; `tick` counts timer events since the run started
    TimerTick {
        /// Zero-based tick number within the current run
        tick: u32,
    },
    /// Multicast packet with payload received
    Packet {
        /// Routing key
        key: u32,
        /// Payload reinterpreted as an S16.15 value
        payload: S1615,
    },
}

/// An event paired with the task registered to handle it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Task the event is destined for
    pub task: TaskId,
    /// The event itself
    pub event: Event,
}

/// Source of timer and packet events
pub trait Scheduler {
    /// Register the periodic task fired every `period_us` microseconds
    fn register_periodic(&mut self, period_us: u32) -> Result<TaskId>;

    /// Register the task that receives multicast packets
    fn register_on_packet(&mut self) -> Result<TaskId>;

    /// Block until the next event is due and return it
    ///
    /// Returns `None` once the event source is exhausted or shut down.
    fn next_dispatch(&mut self) -> Option<Dispatch>;

    /// Scheduler clock in microseconds
    fn now_us(&self) -> u64;

    /// Discard packets queued before a run starts; returns how many were dropped
    fn flush_packets(&mut self) -> usize;

    /// Restart tick numbering and the timer phase for a new run
    fn begin_run(&mut self);
}
