// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Filter output handles
//!
//! Learning reads filters through `FilterOutputs` only, which exposes the
//! value settled by the most recent advance. The packet side
//! (`InputFilters`) is kept separate so that nothing holding a read handle
//! can promote input into output.

use ensemble_npu_neural::S1615;

/// Read-only, indexable view onto settled filter outputs
pub trait FilterOutputs {
    /// Number of filters in the collection
    fn n_filters(&self) -> usize;

    /// Settled output vector of filter `index`, if it exists
    ///
    /// The slice length is the filter's dimensionality.
    fn output(&self, index: usize) -> Option<&[S1615]>;

    /// Dimensionality of filter `index`
    fn width(&self, index: usize) -> Option<usize> {
        self.output(index).map(<[S1615]>::len)
    }
}

/// Packet-fed filter collection advanced once per tick
pub trait InputFilters: FilterOutputs {
    /// Promote accumulated input into settled output for every filter
    fn advance(&mut self);

    /// Accumulate one multicast packet; returns false if no route matched
    fn receive_packet(&mut self, key: u32, payload: S1615) -> bool;
}

impl FilterOutputs for [Vec<S1615>] {
    fn n_filters(&self) -> usize {
        self.len()
    }

    fn output(&self, index: usize) -> Option<&[S1615]> {
        self.get(index).map(Vec::as_slice)
    }
}

impl FilterOutputs for Vec<Vec<S1615>> {
    fn n_filters(&self) -> usize {
        self.len()
    }

    fn output(&self, index: usize) -> Option<&[S1615]> {
        self.get(index).map(Vec::as_slice)
    }
}

impl<T: FilterOutputs + ?Sized> FilterOutputs for &T {
    fn n_filters(&self) -> usize {
        (**self).n_filters()
    }

    fn output(&self, index: usize) -> Option<&[S1615]> {
        (**self).output(index)
    }
}
