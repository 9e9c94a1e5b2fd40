// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Output vectors as keyed multicast packets
//!
//! An ensemble's decoded output leaves the core as one packet per
//! dimension, `key = base_key | dimension`. [`MulticastOutput`] does that
//! split and hands each packet to a caller-supplied function, typically a
//! [`PacketSender`](ensemble_npu_runtime::PacketSender) or a transmitter's
//! packet handler.

use ensemble_npu_neural::S1615;
use ensemble_npu_runtime::OutputSink;

/// [`OutputSink`] emitting one packet per output dimension
pub struct MulticastOutput<F: FnMut(u32, S1615)> {
    base_key: u32,
    send: F,
    packets: u64,
}

impl<F: FnMut(u32, S1615)> MulticastOutput<F> {
    pub fn new(base_key: u32, send: F) -> Self {
        Self {
            base_key,
            send,
            packets: 0,
        }
    }

    pub fn base_key(&self) -> u32 {
        self.base_key
    }

    /// Packets emitted so far
    pub fn packets(&self) -> u64 {
        self.packets
    }
}

impl<F: FnMut(u32, S1615)> OutputSink for MulticastOutput<F> {
    fn emit(&mut self, _tick: u32, output: &[S1615]) {
        for (dimension, value) in output.iter().enumerate() {
            (self.send)(self.base_key | dimension as u32, *value);
            self.packets += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_packet_per_dimension() {
        let mut seen = Vec::new();
        let mut sink = MulticastOutput::new(0xAB00, |key, value| seen.push((key, value)));
        sink.emit(0, &[S1615::ONE, S1615::ZERO, S1615::from_f32(-2.0)]);
        assert_eq!(sink.packets(), 3);
        drop(sink);
        assert_eq!(
            seen,
            vec![
                (0xAB00, S1615::ONE),
                (0xAB01, S1615::ZERO),
                (0xAB02, S1615::from_f32(-2.0)),
            ]
        );
    }
}
