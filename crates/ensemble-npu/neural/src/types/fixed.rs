// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Signed 16.15 fixed-point values
//!
//! Every real quantity exchanged with the ensemble (decoder weights, filter
//! outputs, learning rates) is an `S1615`: 1 sign bit, 16 integer bits and
//! 15 fractional bits packed into an `i32`. Arithmetic wraps on overflow, the
//! same way the core's native accumulator type behaves.

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Signed 16.15 fixed-point value
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct S1615(pub i32);

impl S1615 {
    /// Number of fractional bits
    pub const FRACTIONAL_BITS: u32 = 15;

    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << Self::FRACTIONAL_BITS);
    pub const MAX: Self = Self(i32::MAX);
    pub const MIN: Self = Self(i32::MIN);

    /// Smallest positive representable step (2^-15)
    pub const EPSILON: Self = Self(1);

    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Convert from `f32`, rounding to nearest and saturating at the range limits
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        Self::from_f64(value as f64)
    }

    /// Convert from `f64`, rounding to nearest and saturating at the range limits
    pub fn from_f64(value: f64) -> Self {
        let scaled = (value * (1u32 << Self::FRACTIONAL_BITS) as f64).round();
        if scaled >= i32::MAX as f64 {
            Self::MAX
        } else if scaled <= i32::MIN as f64 {
            Self::MIN
        } else {
            Self(scaled as i32)
        }
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1u32 << Self::FRACTIONAL_BITS) as f32
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1u32 << Self::FRACTIONAL_BITS) as f64
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Fixed-point product; the discarded fraction is truncated toward negative infinity
    #[inline]
    pub const fn wrapping_mul(self, rhs: Self) -> Self {
        let wide = (self.0 as i64) * (rhs.0 as i64);
        Self((wide >> Self::FRACTIONAL_BITS) as i32)
    }
}

impl Add for S1615 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for S1615 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for S1615 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for S1615 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Mul for S1615 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }
}

impl Neg for S1615 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl From<f32> for S1615 {
    fn from(value: f32) -> Self {
        Self::from_f32(value)
    }
}

impl From<S1615> for f32 {
    fn from(value: S1615) -> Self {
        value.to_f32()
    }
}

impl fmt::Debug for S1615 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S1615({:.6} / {:#010x})", self.to_f64(), self.0 as u32)
    }
}

impl fmt::Display for S1615 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.to_f64())
    }
}
