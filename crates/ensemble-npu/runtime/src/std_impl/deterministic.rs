// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Deterministic scheduler driven by a fake clock
//!
//! Timer ticks are generated on demand and the clock jumps straight to each
//! deadline, so a run of any length finishes as fast as the handlers do.
//! Packets injected by a test are always delivered before the next timer
//! tick. Handlers can simulate slow work by advancing the shared
//! [`FakeClock`].

use crate::traits::{Dispatch, Event, Result, RuntimeError, Scheduler, TaskId};
use ensemble_npu_neural::S1615;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared microsecond clock
///
/// Cloning yields another handle onto the same clock.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now_us: Arc<AtomicU64>,
}

impl FakeClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in microseconds
    pub fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::Acquire)
    }

    /// Move the clock forward
    pub fn advance_us(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::AcqRel);
    }

    /// Move the clock forward to `us` if it is behind it
    fn advance_to(&self, us: u64) {
        self.now_us.fetch_max(us, Ordering::AcqRel);
    }
}

/// Scheduler with a fake clock and scripted packet delivery
#[derive(Debug, Default)]
pub struct DeterministicScheduler {
    clock: FakeClock,
    next_task: u32,
    timer: Option<(TaskId, u32)>,
    packet_task: Option<TaskId>,
    next_tick: u32,
    next_deadline_us: u64,
    pending: VecDeque<(u32, S1615)>,
    /// Packets delivered just before a given run tick
    scripted: BTreeMap<u32, Vec<(u32, S1615)>>,
    tick_limit: Option<u64>,
    ticks_dispatched: u64,
}

impl DeterministicScheduler {
    /// Scheduler with no tasks and the clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto the scheduler clock
    pub fn clock(&self) -> FakeClock {
        self.clock.clone()
    }

    /// Queue a packet for delivery before the next timer tick
    pub fn inject_packet(&mut self, key: u32, payload: S1615) {
        self.pending.push_back((key, payload));
    }

    /// Queue a packet for delivery just before run tick `tick` fires
    pub fn inject_packet_before_tick(&mut self, tick: u32, key: u32, payload: S1615) {
        self.scripted.entry(tick).or_default().push((key, payload));
    }

    /// Stop producing timer ticks after `ticks` in total (across runs)
    pub fn limit_ticks(&mut self, ticks: u64) {
        self.tick_limit = Some(ticks);
    }

    /// Timer ticks dispatched since construction
    pub fn ticks_dispatched(&self) -> u64 {
        self.ticks_dispatched
    }

    /// Packets waiting for delivery
    pub fn pending_packets(&self) -> usize {
        self.pending.len()
    }

    fn allocate_task(&mut self) -> TaskId {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        id
    }

    fn pop_packet(&mut self) -> Option<Dispatch> {
        let task = self.packet_task?;
        let (key, payload) = self.pending.pop_front()?;
        Some(Dispatch {
            task,
            event: Event::Packet { key, payload },
        })
    }
}

impl Scheduler for DeterministicScheduler {
    fn register_periodic(&mut self, period_us: u32) -> Result<TaskId> {
        if self.timer.is_some() {
            return Err(RuntimeError::TaskAlreadyRegistered("periodic timer"));
        }
        if period_us == 0 {
            return Err(RuntimeError::InvalidParameters(
                "timer period must be at least 1 microsecond".to_string(),
            ));
        }
        let id = self.allocate_task();
        self.timer = Some((id, period_us));
        self.next_deadline_us = self.clock.now_us() + u64::from(period_us);
        Ok(id)
    }

    fn register_on_packet(&mut self) -> Result<TaskId> {
        if self.packet_task.is_some() {
            return Err(RuntimeError::TaskAlreadyRegistered("packet received"));
        }
        let id = self.allocate_task();
        self.packet_task = Some(id);
        Ok(id)
    }

    fn next_dispatch(&mut self) -> Option<Dispatch> {
        if self.packet_task.is_none() {
            // No handler: packets are lost, as on hardware
            self.pending.clear();
        }
        if let Some(dispatch) = self.pop_packet() {
            return Some(dispatch);
        }

        let (task, period_us) = self.timer?;
        if self
            .tick_limit
            .is_some_and(|limit| self.ticks_dispatched >= limit)
        {
            return None;
        }

        if let Some(batch) = self.scripted.remove(&self.next_tick) {
            self.pending.extend(batch);
            if let Some(dispatch) = self.pop_packet() {
                return Some(dispatch);
            }
        }

        self.clock.advance_to(self.next_deadline_us);
        let tick = self.next_tick;
        self.next_tick = self.next_tick.wrapping_add(1);
        self.next_deadline_us += u64::from(period_us);
        self.ticks_dispatched += 1;

        Some(Dispatch {
            task,
            event: Event::TimerTick { tick },
        })
    }

    fn now_us(&self) -> u64 {
        self.clock.now_us()
    }

    fn flush_packets(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    fn begin_run(&mut self) {
        self.next_tick = 0;
        if let Some((_, period_us)) = self.timer {
            self.next_deadline_us = self.clock.now_us() + u64::from(period_us);
        }
    }
}
