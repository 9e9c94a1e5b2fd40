// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! SDP transmitter
//!
//! Filters the vectors arriving as multicast packets and forwards the
//! result to the host once every `transmission_delay` ticks.
//!
//! ## Per-tick work
//! 1. Stop if the run length has been reached or a stop was requested
//! 2. Advance the input filters
//! 3. Decrement the delay counter; on zero, reload it and send the summed
//!    filter output as one [`SdpMessage`]

use crate::error::{Result, SdpTxError};
use crate::sdp::{SdpMessage, MAX_DIMENSIONS};
use crate::transport::P2pTransport;
use ensemble_npu_neural::S1615;
use ensemble_npu_runtime::{
    Event, FilterCollection, FilterOutputs, FilterRoute, FilterSpec, InputFilters, Scheduler,
    StopHandle, TaskId,
};
use tracing::{debug, error, info, trace, warn};

/// Host tick count meaning "run until the event source ends"
pub const UNBOUNDED_TICKS: u32 = u32::MAX;

/// Number of words in the system region
pub const SYSTEM_REGION_WORDS: usize = 3;

/// Boot-time description of a transmitter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdpTxParameters {
    pub n_dimensions: u32,
    pub machine_timestep_us: u32,
    /// Ticks between transmissions
    pub transmission_delay: u32,
    pub input_filters: Vec<FilterSpec>,
    pub input_routes: Vec<FilterRoute>,
}

impl SdpTxParameters {
    pub fn new(n_dimensions: u32, machine_timestep_us: u32, transmission_delay: u32) -> Self {
        Self {
            n_dimensions,
            machine_timestep_us,
            transmission_delay,
            ..Self::default()
        }
    }

    /// Decode `[n_dimensions, machine_timestep_us, transmission_delay]`
    pub fn from_system_words(words: &[u32]) -> Result<Self> {
        match words {
            [n_dimensions, machine_timestep_us, transmission_delay, ..] => Ok(Self::new(
                *n_dimensions,
                *machine_timestep_us,
                *transmission_delay,
            )),
            _ => Err(SdpTxError::TruncatedSystemRegion {
                expected: SYSTEM_REGION_WORDS,
                actual: words.len(),
            }),
        }
    }

    pub fn to_system_words(&self) -> [u32; SYSTEM_REGION_WORDS] {
        [
            self.n_dimensions,
            self.machine_timestep_us,
            self.transmission_delay,
        ]
    }

    pub fn with_input_filters(mut self, specs: Vec<FilterSpec>, routes: Vec<FilterRoute>) -> Self {
        self.input_filters = specs;
        self.input_routes = routes;
        self
    }
}

/// Where on the machine this transmitter runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SdpSource {
    /// Board-local P2P address of the chip
    pub p2p_addr: u16,
    /// Core number on that chip
    pub core_id: u8,
}

/// Why a transmitter run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxRunOutcome {
    Completed,
    /// A stop was requested through the [`StopHandle`]
    Stopped,
    SourceExhausted,
}

/// Counters for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxRunSummary {
    pub outcome: TxRunOutcome,
    pub ticks: u64,
    pub messages_sent: u64,
    pub send_failures: u64,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxTick {
    /// Filters advanced, nothing sent
    Filtered,
    /// Filters advanced and a message went out
    Sent,
    /// Message due but the transport refused it
    SendFailed,
}

/// Filters input vectors and forwards them to the host
pub struct SdpTransmitter<T: P2pTransport> {
    n_dimensions: usize,
    machine_timestep_us: u32,
    transmission_delay: u32,
    delay_remaining: u32,
    filters: FilterCollection,
    message: SdpMessage,
    transport: T,
    timer_task: TaskId,
    packet_task: TaskId,
    stop: StopHandle,
    sent: u64,
    failures: u64,
}

impl<T: P2pTransport> SdpTransmitter<T> {
    /// Build the transmitter and register its handlers with `scheduler`
    pub fn boot<S: Scheduler>(
        params: &SdpTxParameters,
        source: SdpSource,
        transport: T,
        scheduler: &mut S,
    ) -> Result<Self> {
        Self::try_boot(params, source, transport, scheduler).map_err(|e| {
            error!("[SDP-TX] Failed to initialise: {}", e);
            e
        })
    }

    fn try_boot<S: Scheduler>(
        params: &SdpTxParameters,
        source: SdpSource,
        transport: T,
        scheduler: &mut S,
    ) -> Result<Self> {
        if params.machine_timestep_us == 0 {
            return Err(SdpTxError::InvalidParameters(
                "machine timestep must be non-zero".to_string(),
            ));
        }
        if params.transmission_delay == 0 {
            return Err(SdpTxError::InvalidParameters(
                "transmission delay must be at least one tick".to_string(),
            ));
        }
        let n_dimensions = params.n_dimensions as usize;
        if n_dimensions > MAX_DIMENSIONS {
            return Err(SdpTxError::InvalidParameters(format!(
                "{} dimensions exceed the {} an SDP message carries",
                n_dimensions, MAX_DIMENSIONS
            )));
        }

        let filters = FilterCollection::new(&params.input_filters, &params.input_routes)?;
        for index in 0..filters.n_filters() {
            let width = filters.width(index).unwrap_or(0);
            if width != n_dimensions {
                return Err(SdpTxError::FilterWidth {
                    filter: index,
                    expected: params.n_dimensions,
                    actual: width,
                });
            }
        }

        let timer_task = scheduler.register_periodic(params.machine_timestep_us)?;
        let packet_task = scheduler.register_on_packet()?;

        info!(
            "[SDP-TX] Tick period = {} microseconds",
            params.machine_timestep_us
        );
        info!(
            "[SDP-TX] Transmission delay = {}",
            params.transmission_delay
        );

        Ok(Self {
            n_dimensions,
            machine_timestep_us: params.machine_timestep_us,
            transmission_delay: params.transmission_delay,
            delay_remaining: params.transmission_delay,
            filters,
            message: SdpMessage::to_host(source.p2p_addr, source.core_id, n_dimensions),
            transport,
            timer_task,
            packet_task,
            stop: StopHandle::new(),
            sent: 0,
            failures: 0,
        })
    }

    /// Run for `simulation_ticks` timer ticks ([`UNBOUNDED_TICKS`] = no limit)
    ///
    /// Also returns early on a stop request or when the scheduler runs dry.
    pub fn run<S: Scheduler>(&mut self, scheduler: &mut S, simulation_ticks: u32) -> TxRunSummary {
        self.stop.clear();
        let flushed = scheduler.flush_packets();
        scheduler.begin_run();
        debug!(
            "[SDP-TX] Starting run: {} ticks, {} stale packets flushed",
            simulation_ticks, flushed
        );

        let sent_before = self.sent;
        let failures_before = self.failures;
        let mut ticks = 0u64;
        let outcome = loop {
            if simulation_ticks != UNBOUNDED_TICKS && ticks >= u64::from(simulation_ticks) {
                break TxRunOutcome::Completed;
            }
            let Some(dispatch) = scheduler.next_dispatch() else {
                break TxRunOutcome::SourceExhausted;
            };
            match dispatch.event {
                Event::Packet { key, payload } if dispatch.task == self.packet_task => {
                    self.handle_packet(key, payload);
                }
                Event::TimerTick { tick } if dispatch.task == self.timer_task => {
                    if self.stop.is_requested() {
                        break TxRunOutcome::Stopped;
                    }
                    self.handle_timer_tick(tick);
                    ticks += 1;
                }
                _ => {}
            }
        };

        let summary = TxRunSummary {
            outcome,
            ticks,
            messages_sent: self.sent - sent_before,
            send_failures: self.failures - failures_before,
        };
        info!(
            "[SDP-TX] Run ended ({:?}) after {} ticks, {} messages sent",
            summary.outcome, summary.ticks, summary.messages_sent
        );
        summary
    }

    /// Advance filters and transmit if the delay has elapsed
    pub fn handle_timer_tick(&mut self, tick: u32) -> TxTick {
        self.filters.advance();

        self.delay_remaining -= 1;
        if self.delay_remaining > 0 {
            return TxTick::Filtered;
        }
        self.delay_remaining = self.transmission_delay;

        self.fill_payload();
        match self.transport.send(&self.message) {
            Ok(()) => {
                self.sent += 1;
                trace!("[SDP-TX] Tick {}: sent {:?}", tick, self.message.data);
                TxTick::Sent
            }
            Err(e) => {
                self.failures += 1;
                warn!("[SDP-TX] Tick {}: send failed: {}", tick, e);
                TxTick::SendFailed
            }
        }
    }

    /// Accumulate a multicast packet into the input filters
    pub fn handle_packet(&mut self, key: u32, payload: S1615) -> bool {
        self.filters.receive_packet(key, payload)
    }

    fn fill_payload(&mut self) {
        let data = &mut self.message.data;
        data.fill(S1615::ZERO);
        for index in 0..self.filters.n_filters() {
            if let Some(output) = self.filters.output(index) {
                for (total, value) in data.iter_mut().zip(output) {
                    *total += *value;
                }
            }
        }
    }

    pub fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    pub fn machine_timestep_us(&self) -> u32 {
        self.machine_timestep_us
    }

    /// Ticks left before the next transmission
    pub fn delay_remaining(&self) -> u32 {
        self.delay_remaining
    }

    /// The most recently transmitted message (zero payload before the first)
    pub fn last_message(&self) -> &SdpMessage {
        &self.message
    }

    pub fn filters(&self) -> &FilterCollection {
        &self.filters
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Total messages sent since boot
    pub fn messages_sent(&self) -> u64 {
        self.sent
    }

    /// Handle for requesting a cooperative stop from another thread
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}
