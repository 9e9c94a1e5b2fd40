// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! PES configuration region layout
//!
//! Host-endian, fixed width:
//!
//! ```text
//! u32 rule_count
//! rule_count x {
//!     i32 learning_rate          (S16.15)
//!     i32 error_channel          (-1: no error signal)
//!     u32 decoder_row
//!     i32 activity_filter_index  (-1: instantaneous)
//! }
//! ```
//!
//! Bytes past the last record are ignored; the region allocated on the
//! machine is frequently rounded up.

use crate::error::{InvariantViolation, PesError, Result};
use crate::rule::{ActivityMode, LearningRule};
use bytemuck::{Pod, Zeroable};
use ensemble_npu_neural::S1615;

/// Size of the leading rule count
pub const HEADER_BYTES: usize = core::mem::size_of::<u32>();

/// Size of one rule record
pub const RECORD_BYTES: usize = core::mem::size_of::<PesRegionRecord>();

/// One rule exactly as it sits in the region
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct PesRegionRecord {
    pub learning_rate: i32,
    pub error_channel: i32,
    pub decoder_row: u32,
    pub activity_filter_index: i32,
}

impl PesRegionRecord {
    /// Convert into a rule, rejecting negative indices other than -1
    pub fn to_rule(&self, rule: usize) -> Result<LearningRule> {
        let violation = |reason| PesError::ConfigurationInvariantViolation { rule, reason };

        let activity_mode = ActivityMode::from_index(self.activity_filter_index).ok_or_else(|| {
            violation(InvariantViolation::InvalidActivityFilterIndex(
                self.activity_filter_index,
            ))
        })?;

        let error_channel = match self.error_channel {
            -1 => None,
            c if c >= 0 => Some(c as u32),
            c => return Err(violation(InvariantViolation::InvalidErrorChannel(c))),
        };

        // Instantaneous rules have nothing to learn from without an error signal
        if activity_mode == ActivityMode::Instantaneous && error_channel.is_none() {
            return Err(violation(InvariantViolation::MissingErrorSignal));
        }

        Ok(LearningRule {
            learning_rate: S1615::from_bits(self.learning_rate),
            error_channel,
            decoder_row: self.decoder_row,
            activity_mode,
        })
    }
}

impl From<&LearningRule> for PesRegionRecord {
    fn from(rule: &LearningRule) -> Self {
        Self {
            learning_rate: rule.learning_rate.to_bits(),
            error_channel: rule.error_channel_index(),
            decoder_row: rule.decoder_row,
            activity_filter_index: rule.activity_mode.to_index(),
        }
    }
}

/// Split a region into its rule count and the raw records
///
/// Fails with `TruncatedRegion` if the block is shorter than the count says.
pub(crate) fn parse_header(block: &[u8]) -> Result<(usize, &[u8])> {
    let header: [u8; HEADER_BYTES] = block
        .get(..HEADER_BYTES)
        .and_then(|b| b.try_into().ok())
        .ok_or(PesError::TruncatedRegion {
            expected: HEADER_BYTES,
            actual: block.len(),
        })?;
    let count = u32::from_ne_bytes(header) as usize;

    let expected = count
        .checked_mul(RECORD_BYTES)
        .and_then(|n| n.checked_add(HEADER_BYTES))
        .ok_or(PesError::ResourceExhausted { requested: count })?;
    if block.len() < expected {
        return Err(PesError::TruncatedRegion {
            expected,
            actual: block.len(),
        });
    }

    Ok((count, &block[HEADER_BYTES..expected]))
}

/// Read record `index` from the record area returned by `parse_header`
#[inline]
pub(crate) fn read_record(records: &[u8], index: usize) -> PesRegionRecord {
    let start = index * RECORD_BYTES;
    bytemuck::pod_read_unaligned(&records[start..start + RECORD_BYTES])
}

/// Host-side writer for the PES region
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PesRegionBuilder {
    records: Vec<PesRegionRecord>,
}

impl PesRegionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule
    pub fn rule(mut self, rule: LearningRule) -> Self {
        self.records.push(PesRegionRecord::from(&rule));
        self
    }

    /// Append a raw record, bypassing rule construction
    ///
    /// Lets callers write encodings a `LearningRule` cannot express, such as
    /// invalid negative indices.
    pub fn record(mut self, record: PesRegionRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Region contents as 32-bit words
    pub fn to_words(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(1 + self.records.len() * RECORD_BYTES / 4);
        words.push(self.records.len() as u32);
        words.extend_from_slice(bytemuck::cast_slice::<PesRegionRecord, u32>(&self.records));
        words
    }

    /// Region contents as bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice::<u32, u8>(&self.to_words()).to_vec()
    }
}
