// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Decoder matrix storage
//!
//! One row per output dimension, one column per neuron, row-major. The matrix
//! is allocated exactly once at boot and never resized afterwards, so every
//! accessor used on the tick path works on the existing buffer.

use crate::types::{EnsembleError, Result, S1615};

/// Row-major `rows x columns` matrix of S16.15 decoder weights
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderMatrix {
    rows: usize,
    columns: usize,
    values: Vec<S1615>,
}

impl DecoderMatrix {
    /// Allocate a zeroed matrix
    ///
    /// Fails with `ResourceExhausted` instead of aborting when the allocator
    /// cannot satisfy the request.
    pub fn zeros(rows: usize, columns: usize) -> Result<Self> {
        let len = rows
            .checked_mul(columns)
            .ok_or(EnsembleError::DimensionOverflow { rows, columns })?;

        let mut values = Vec::new();
        values
            .try_reserve_exact(len)
            .map_err(|_| EnsembleError::ResourceExhausted {
                what: "decoder matrix",
                requested: len,
            })?;
        values.resize(len, S1615::ZERO);

        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    /// Build a matrix from row-major values loaded from the decoder region
    pub fn from_row_major(rows: usize, columns: usize, data: &[S1615]) -> Result<Self> {
        let mut matrix = Self::zeros(rows, columns)?;
        if data.len() != matrix.values.len() {
            return Err(EnsembleError::ArraySizeMismatch {
                what: "decoder matrix",
                expected: matrix.values.len(),
                actual: data.len(),
            });
        }
        matrix.values.copy_from_slice(data);
        Ok(matrix)
    }

    /// Number of output dimensions
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of neurons
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Option<S1615> {
        if row < self.rows && column < self.columns {
            Some(self.values[row * self.columns + column])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: S1615) -> bool {
        if row < self.rows && column < self.columns {
            self.values[row * self.columns + column] = value;
            true
        } else {
            false
        }
    }

    pub fn row(&self, row: usize) -> Option<&[S1615]> {
        if row < self.rows {
            let start = row * self.columns;
            Some(&self.values[start..start + self.columns])
        } else {
            None
        }
    }

    /// Flat row-major view (element `(r, c)` lives at `r * columns + c`)
    #[inline]
    pub fn as_slice(&self) -> &[S1615] {
        &self.values
    }

    /// Mutable flat row-major view, used by the learning rules on the tick path
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [S1615] {
        &mut self.values
    }

    /// Linear projection of a firing set: `out[r] = sum(decoder[r][c])` over firing columns
    ///
    /// `output` must hold at least `rows` elements; extra elements are left untouched.
    pub fn decode_into<I>(&self, firing_columns: I, output: &mut [S1615])
    where
        I: IntoIterator<Item = usize>,
    {
        for value in output.iter_mut().take(self.rows) {
            *value = S1615::ZERO;
        }
        for column in firing_columns {
            if column >= self.columns {
                continue;
            }
            for (row, out) in output.iter_mut().take(self.rows).enumerate() {
                *out += self.values[row * self.columns + column];
            }
        }
    }
}
