// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cooperative stop shared between a run loop and its controller

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop request, checked at tick boundaries only
///
/// Cloneable and shareable with other threads. Run loops clear it when a
/// run starts, so a request applies to the current run only.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    /// Handle with no stop pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the current run to end before its next tick
    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Whether a stop is pending
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Withdraw a pending request
    pub fn clear(&self) {
        self.requested.store(false, Ordering::Release);
    }
}
