// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Extension point for rules driven by filtered activity
//!
//! Rules whose activity mode is `FilteredActivity` are parsed, validated and
//! kept, but the update they would perform is delegated to a strategy. The
//! default strategy leaves the decoder untouched.

use crate::rule::LearningRule;
use ensemble_npu_neural::S1615;

/// Per-tick update for one filtered-activity rule
pub trait FilteredActivityUpdate {
    /// Apply `rule` to its decoder rows
    ///
    /// `decoder` is the full row-major decoder with `n_neurons` columns;
    /// `error` is the rule's error vector if its channel exists.
    fn apply(
        &self,
        rule: &LearningRule,
        activity_filter: u32,
        error: Option<&[S1615]>,
        decoder: &mut [S1615],
        n_neurons: usize,
    );
}

/// Strategy that performs no update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InertFilteredActivity;

impl FilteredActivityUpdate for InertFilteredActivity {
    #[inline(always)]
    fn apply(
        &self,
        _rule: &LearningRule,
        _activity_filter: u32,
        _error: Option<&[S1615]>,
        _decoder: &mut [S1615],
        _n_neurons: usize,
    ) {
    }
}
