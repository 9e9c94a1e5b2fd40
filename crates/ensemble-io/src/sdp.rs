// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! SDP message layout
//!
//! An outgoing vector travels as one SDP message carrying a command header
//! followed by the S16.15 payload. All multi-byte fields are little-endian,
//! matching the on-chip ARM cores:
//!
//! ```text
//! offset  size  field
//!      0     1  flags
//!      1     1  tag
//!      2     1  dest_port
//!      3     1  srce_port
//!      4     2  dest_addr
//!      6     2  srce_addr
//!      8     2  cmd_rc
//!     10     2  seq
//!     12     4  arg1
//!     16     4  arg2
//!     20     4  arg3
//!     24   4*n  data (S16.15)
//! ```

use crate::error::SdpDecodeError;
use ensemble_npu_neural::S1615;

/// Size of the SDP routing header
pub const SDP_HEADER_BYTES: usize = 8;
/// Size of the command header that follows it
pub const CMD_HEADER_BYTES: usize = 16;
/// Largest payload an SDP message carries
pub const MAX_DATA_BYTES: usize = 256;
/// Largest number of S16.15 values in one message
pub const MAX_DIMENSIONS: usize = MAX_DATA_BYTES / 4;

/// No reply expected
pub const FLAGS_NO_REPLY: u8 = 0x07;
/// IP tag the host listener is bound to
pub const HOST_IPTAG: u8 = 1;
/// Port value that routes a message off-machine via its tag
pub const HOST_PORT: u8 = 0xff;
/// Chip address of the host side
pub const HOST_ADDR: u16 = 0x0000;
/// Command code for a transmitted vector
pub const CMD_VECTOR: u16 = 1;

/// One SDP message with a command header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpMessage {
    pub flags: u8,
    pub tag: u8,
    pub dest_port: u8,
    pub srce_port: u8,
    pub dest_addr: u16,
    pub srce_addr: u16,
    pub cmd_rc: u16,
    pub seq: u16,
    pub arg1: u32,
    pub arg2: u32,
    pub arg3: u32,
    pub data: Vec<S1615>,
}

impl SdpMessage {
    /// Vector message from `(srce_addr, srce_port)` to the host tag, zero payload
    pub fn to_host(srce_addr: u16, srce_port: u8, n_dimensions: usize) -> Self {
        Self {
            flags: FLAGS_NO_REPLY,
            tag: HOST_IPTAG,
            dest_port: HOST_PORT,
            srce_port,
            dest_addr: HOST_ADDR,
            srce_addr,
            cmd_rc: CMD_VECTOR,
            seq: 0,
            arg1: 0,
            arg2: 0,
            arg3: 0,
            data: vec![S1615::ZERO; n_dimensions],
        }
    }

    /// Length field value: both headers plus payload
    pub fn length(&self) -> usize {
        SDP_HEADER_BYTES + CMD_HEADER_BYTES + 4 * self.data.len()
    }

    /// Append the wire form to `buf`
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.length());
        buf.extend_from_slice(&[self.flags, self.tag, self.dest_port, self.srce_port]);
        buf.extend_from_slice(&self.dest_addr.to_le_bytes());
        buf.extend_from_slice(&self.srce_addr.to_le_bytes());
        buf.extend_from_slice(&self.cmd_rc.to_le_bytes());
        buf.extend_from_slice(&self.seq.to_le_bytes());
        buf.extend_from_slice(&self.arg1.to_le_bytes());
        buf.extend_from_slice(&self.arg2.to_le_bytes());
        buf.extend_from_slice(&self.arg3.to_le_bytes());
        for value in &self.data {
            buf.extend_from_slice(&value.to_bits().to_le_bytes());
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.length());
        self.encode_into(&mut buf);
        buf
    }

    /// Parse the wire form; the payload is everything after the headers
    pub fn decode(bytes: &[u8]) -> Result<Self, SdpDecodeError> {
        let header_bytes = SDP_HEADER_BYTES + CMD_HEADER_BYTES;
        if bytes.len() < header_bytes {
            return Err(SdpDecodeError::Truncated {
                expected: header_bytes,
                actual: bytes.len(),
            });
        }
        let payload = &bytes[header_bytes..];
        if payload.len() % 4 != 0 {
            return Err(SdpDecodeError::MisalignedPayload(payload.len()));
        }

        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        Ok(Self {
            flags: bytes[0],
            tag: bytes[1],
            dest_port: bytes[2],
            srce_port: bytes[3],
            dest_addr: u16_at(4),
            srce_addr: u16_at(6),
            cmd_rc: u16_at(8),
            seq: u16_at(10),
            arg1: u32_at(12),
            arg2: u32_at(16),
            arg3: u32_at(20),
            data: payload
                .chunks_exact(4)
                .map(|w| S1615::from_bits(i32::from_le_bytes([w[0], w[1], w[2], w[3]])))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_message_header_fields() {
        let msg = SdpMessage::to_host(0x0102, 3, 2);
        assert_eq!(msg.length(), 32);

        let bytes = msg.to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..8], &[0x07, 1, 0xff, 3, 0x00, 0x00, 0x02, 0x01]);
        // cmd_rc = 1, seq = 0
        assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
        assert!(bytes[12..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_payload_is_little_endian_s1615() {
        let mut msg = SdpMessage::to_host(0, 1, 2);
        msg.data = vec![S1615::ONE, S1615::from_f32(-0.5)];
        let bytes = msg.to_bytes();
        assert_eq!(&bytes[24..28], &0x8000i32.to_le_bytes());
        assert_eq!(&bytes[28..32], &(-0x4000i32).to_le_bytes());

        let decoded = SdpMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_decode_rejects_short_and_ragged_messages() {
        assert_eq!(
            SdpMessage::decode(&[0u8; 10]),
            Err(SdpDecodeError::Truncated {
                expected: 24,
                actual: 10
            })
        );
        assert_eq!(
            SdpMessage::decode(&[0u8; 27]),
            Err(SdpDecodeError::MisalignedPayload(3))
        );
    }
}
