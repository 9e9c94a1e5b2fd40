// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Wall-clock scheduler with a thread-safe packet queue.

Receive threads push packets through a [`PacketSender`]; the tick thread
pulls them one at a time between timer ticks, which stands in for the
packet-received interrupt. Waiting for the next deadline sleeps in short
chunks so packets and shutdown requests are picked up promptly.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use crate::traits::{Dispatch, Event, Result, RuntimeError, Scheduler, TaskId};
use ensemble_npu_neural::S1615;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Longest single sleep while waiting for a deadline
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(200);

/// Cloneable handle for feeding packets from other threads
///
/// ARCHITECTURE:
/// - Receive threads: push packets (short mutex hold on the queue only)
/// - Tick thread: pops one packet per dispatch between ticks
#[derive(Debug, Clone)]
pub struct PacketSender {
    queue: Arc<Mutex<VecDeque<(u32, S1615)>>>,
    shutdown: Arc<AtomicBool>,
}

impl PacketSender {
    /// Queue a packet for the tick thread
    pub fn send(&self, key: u32, payload: S1615) {
        self.queue.lock().push_back((key, payload));
    }

    /// Packets not yet dispatched
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Make the scheduler report exhaustion at its next dispatch
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

/// Scheduler backed by `std::time::Instant`
#[derive(Debug)]
pub struct RealtimeScheduler {
    epoch: Instant,
    next_task: u32,
    timer: Option<(TaskId, Duration)>,
    packet_task: Option<TaskId>,
    next_tick: u32,
    next_deadline: Instant,
    queue: Arc<Mutex<VecDeque<(u32, S1615)>>>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl RealtimeScheduler {
    /// Scheduler with an empty packet queue
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            epoch: now,
            next_task: 0,
            timer: None,
            packet_task: None,
            next_tick: 0,
            next_deadline: now,
            queue: Arc::new(Mutex::new(VecDeque::with_capacity(256))),
            shutdown: Arc::new(AtomicBool::new(false)),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the longest sleep between queue checks
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_micros(1));
        self
    }

    /// Handle for other threads to push packets and request shutdown
    pub fn packet_sender(&self) -> PacketSender {
        PacketSender {
            queue: Arc::clone(&self.queue),
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    fn allocate_task(&mut self) -> TaskId {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        id
    }
}

impl Default for RealtimeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RealtimeScheduler {
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
        let period = Duration::from_micros(u64::from(period_us));
        self.timer = Some((id, period));
        self.next_deadline = Instant::now() + period;
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
        if self.timer.is_none() && self.packet_task.is_none() {
            return None;
        }

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return None;
            }

            if let Some(task) = self.packet_task {
                if let Some((key, payload)) = self.queue.lock().pop_front() {
                    return Some(Dispatch {
                        task,
                        event: Event::Packet { key, payload },
                    });
                }
            }

            let now = Instant::now();
            match self.timer {
                Some((task, period)) if now >= self.next_deadline => {
                    let tick = self.next_tick;
                    self.next_tick = self.next_tick.wrapping_add(1);
                    self.next_deadline += period;
                    return Some(Dispatch {
                        task,
                        event: Event::TimerTick { tick },
                    });
                }
                Some(_) => {
                    let remaining = self.next_deadline - now;
                    std::thread::sleep(remaining.min(self.poll_interval));
                }
                None => std::thread::sleep(self.poll_interval),
            }
        }
    }

    fn now_us(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    fn flush_packets(&mut self) -> usize {
        let mut queue = self.queue.lock();
        let dropped = queue.len();
        queue.clear();
        if dropped > 0 {
            debug!("[SCHEDULER] Flushed {} stale packets", dropped);
        }
        dropped
    }

    fn begin_run(&mut self) {
        self.next_tick = 0;
        if let Some((_, period)) = self.timer {
            self.next_deadline = Instant::now() + period;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_packets_from_other_threads_are_dispatched() {
        let mut scheduler = RealtimeScheduler::new();
        let rx = scheduler.register_on_packet().unwrap();
        let sender = scheduler.packet_sender();

        let handle = thread::spawn(move || {
            sender.send(0xAB, S1615::ONE);
        });
        handle.join().unwrap();

        let dispatch = scheduler.next_dispatch().unwrap();
        assert_eq!(dispatch.task, rx);
        assert_eq!(
            dispatch.event,
            Event::Packet {
                key: 0xAB,
                payload: S1615::ONE
            }
        );
    }

    #[test]
    fn test_timer_ticks_are_spaced_by_the_period() {
        let mut scheduler = RealtimeScheduler::new();
        scheduler.register_periodic(2000).unwrap();
        scheduler.begin_run();
        let start = Instant::now();
        for expected in 0..3u32 {
            let dispatch = scheduler.next_dispatch().unwrap();
            assert_eq!(dispatch.event, Event::TimerTick { tick: expected });
        }
        assert!(start.elapsed() >= Duration::from_micros(6000));
    }

    #[test]
    fn test_shutdown_ends_dispatch() {
        let mut scheduler = RealtimeScheduler::new();
        scheduler.register_periodic(1_000_000).unwrap();
        scheduler.packet_sender().shutdown();
        assert!(scheduler.next_dispatch().is_none());
    }

    #[test]
    fn test_flush_drops_queued_packets() {
        let mut scheduler = RealtimeScheduler::new();
        scheduler.register_on_packet().unwrap();
        let sender = scheduler.packet_sender();
        sender.send(1, S1615::ZERO);
        sender.send(2, S1615::ZERO);
        assert_eq!(sender.len(), 2);
        assert_eq!(scheduler.flush_packets(), 2);
        assert!(sender.is_empty());
    }
}
