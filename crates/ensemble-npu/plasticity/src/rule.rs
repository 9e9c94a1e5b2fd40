// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Learning rule representation

use ensemble_npu_neural::S1615;

/// Source of presynaptic activity for a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityMode {
    /// Use this tick's raw spike vector
    Instantaneous,
    /// Use the output of an activity filter (index into the activity filters)
    FilteredActivity(u32),
}

impl ActivityMode {
    /// Decode the region encoding, where `-1` selects `Instantaneous`
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            -1 => Some(Self::Instantaneous),
            i if i >= 0 => Some(Self::FilteredActivity(i as u32)),
            _ => None,
        }
    }

    /// Region encoding of this mode
    pub fn to_index(self) -> i32 {
        match self {
            Self::Instantaneous => -1,
            Self::FilteredActivity(i) => i as i32,
        }
    }
}

/// One PES rule: which error signal drives which decoder rows, and how fast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearningRule {
    /// Scale applied to the error before it is subtracted
    pub learning_rate: S1615,
    /// Modulatory filter carrying the error vector; `None` for the -1 sentinel
    pub error_channel: Option<u32>,
    /// First decoder row updated; the rule owns `error_dim` consecutive rows
    pub decoder_row: u32,
    pub activity_mode: ActivityMode,
}

impl LearningRule {
    /// Instantaneous rule fed by modulatory filter `error_channel`
    pub fn instantaneous(learning_rate: S1615, error_channel: u32, decoder_row: u32) -> Self {
        Self {
            learning_rate,
            error_channel: Some(error_channel),
            decoder_row,
            activity_mode: ActivityMode::Instantaneous,
        }
    }

    /// Filtered-activity rule reading activity filter `activity_filter`
    pub fn filtered(
        learning_rate: S1615,
        error_channel: Option<u32>,
        decoder_row: u32,
        activity_filter: u32,
    ) -> Self {
        Self {
            learning_rate,
            error_channel,
            decoder_row,
            activity_mode: ActivityMode::FilteredActivity(activity_filter),
        }
    }

    #[inline]
    pub fn is_instantaneous(&self) -> bool {
        self.activity_mode == ActivityMode::Instantaneous
    }

    /// Region encoding of the error channel
    pub fn error_channel_index(&self) -> i32 {
        self.error_channel.map_or(-1, |c| c as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_mode_encoding() {
        assert_eq!(ActivityMode::from_index(-1), Some(ActivityMode::Instantaneous));
        assert_eq!(ActivityMode::from_index(4), Some(ActivityMode::FilteredActivity(4)));
        assert_eq!(ActivityMode::from_index(-2), None);
        assert_eq!(ActivityMode::FilteredActivity(4).to_index(), 4);
        assert_eq!(ActivityMode::Instantaneous.to_index(), -1);
    }

    #[test]
    fn test_error_channel_sentinel() {
        let rule = LearningRule::filtered(S1615::ONE, None, 0, 1);
        assert_eq!(rule.error_channel_index(), -1);
        assert!(!rule.is_instantaneous());
        assert_eq!(LearningRule::instantaneous(S1615::ONE, 3, 0).error_channel_index(), 3);
    }
}
