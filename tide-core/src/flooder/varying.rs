//! Time-varying radius values.
//!
//! A region's radius changes linearly with the shared global time: it grows,
//! shrinks, or stays frozen, always at unit rate. Instead of updating every
//! radius on each tick, the radius is stored as a line `y_intercept ± t`
//! and evaluated on demand. Queries therefore cost O(1) regardless of how
//! much time has elapsed.
//!
//! # Encoding
//!
//! The intercept and the growth state share one `i32`:
//!
//! ```text
//!  31                              2  1  0
//! +---------------------------------+-----+
//! |          y_intercept            | st  |   st: 00 frozen, 01 growing, 10 shrinking
//! +---------------------------------+-----+
//! ```
//!
//! Adding a constant to the radius is a single add on the packed word, which
//! is what the detector-node radius queries rely on.

use core::fmt;
use core::ops::{Add, Sub};

use super::types::{Radius, Time};

const STATE_MASK: i32 = 0b11;
const FROZEN: i32 = 0b00;
const GROWING: i32 = 0b01;
const SHRINKING: i32 = 0b10;

/// A radius that is a linear function of global time.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Varying32(i32);

impl Varying32 {
    #[inline(always)]
    const fn pack(y_intercept: Radius, state: i32) -> Self {
        Self(y_intercept.wrapping_mul(4) | state)
    }

    /// A radius that stays at `value` forever.
    #[must_use]
    #[inline(always)]
    pub const fn frozen(value: Radius) -> Self {
        Self::pack(value, FROZEN)
    }

    /// A radius equal to `y_intercept + t`.
    #[must_use]
    #[inline(always)]
    pub const fn growing(y_intercept: Radius) -> Self {
        Self::pack(y_intercept, GROWING)
    }

    /// A radius equal to `y_intercept - t`.
    #[must_use]
    #[inline(always)]
    pub const fn shrinking(y_intercept: Radius) -> Self {
        Self::pack(y_intercept, SHRINKING)
    }

    /// A growing radius that is zero at `time`, as used for a freshly
    /// created region or blossom.
    #[must_use]
    #[inline(always)]
    pub const fn growing_varying_with_zero_distance_at_time(time: Time) -> Self {
        Self::growing(time.wrapping_neg())
    }

    /// Value at time zero.
    #[must_use]
    #[inline(always)]
    pub const fn y_intercept(self) -> Radius {
        self.0 >> 2
    }

    /// Rate of change: `1`, `0` or `-1`.
    #[must_use]
    #[inline(always)]
    pub const fn slope(self) -> i32 {
        match self.0 & STATE_MASK {
            GROWING => 1,
            SHRINKING => -1,
            _ => 0,
        }
    }

    /// Returns `true` if the radius increases with time.
    #[must_use]
    #[inline(always)]
    pub const fn is_growing(self) -> bool {
        self.0 & STATE_MASK == GROWING
    }

    /// Returns `true` if the radius decreases with time.
    #[must_use]
    #[inline(always)]
    pub const fn is_shrinking(self) -> bool {
        self.0 & STATE_MASK == SHRINKING
    }

    /// Returns `true` if the radius does not change with time.
    #[must_use]
    #[inline(always)]
    pub const fn is_frozen(self) -> bool {
        self.0 & STATE_MASK == FROZEN
    }

    /// Evaluates the radius at `time`.
    #[must_use]
    #[inline(always)]
    pub const fn get_distance_at_time(self, time: Time) -> Radius {
        self.y_intercept()
            .wrapping_add(self.slope().wrapping_mul(time))
    }

    /// Same value at `time`, frozen from then on.
    #[must_use]
    #[inline]
    pub const fn then_frozen_at_time(self, time: Time) -> Self {
        Self::frozen(self.get_distance_at_time(time))
    }

    /// Same value at `time`, growing from then on.
    #[must_use]
    #[inline]
    pub const fn then_growing_at_time(self, time: Time) -> Self {
        Self::growing(self.get_distance_at_time(time).wrapping_sub(time))
    }

    /// Same value at `time`, shrinking from then on.
    #[must_use]
    #[inline]
    pub const fn then_shrinking_at_time(self, time: Time) -> Self {
        Self::shrinking(self.get_distance_at_time(time).wrapping_add(time))
    }

    /// Time at which the radius crosses zero, or `None` if it is frozen.
    #[must_use]
    pub const fn time_of_x_intercept(self) -> Option<Time> {
        match self.slope() {
            1 => Some(self.y_intercept().wrapping_neg()),
            -1 => Some(self.y_intercept()),
            _ => None,
        }
    }

    /// Returns `true` if two fronts facing each other across an edge are
    /// closing the gap.
    #[must_use]
    #[inline]
    pub const fn colliding_with(self, other: Self) -> bool {
        self.slope() + other.slope() > 0
    }

    /// First time at which `self + other` covers an edge of length `weight`.
    ///
    /// Returns `None` when the two fronts are not closing in on each other.
    /// The result may lie in the past if the edge is already covered.
    #[must_use]
    pub const fn time_of_x_intercept_for_collision(self, other: Self, weight: Radius) -> Option<Time> {
        let slope = self.slope() + other.slope();
        if slope <= 0 {
            return None;
        }
        let gap = weight
            .wrapping_sub(self.y_intercept())
            .wrapping_sub(other.y_intercept());
        // ceil(gap / slope) for slope in {1, 2}, without overflowing near i32::MAX
        Some(gap.div_euclid(slope) + (gap.rem_euclid(slope) != 0) as Time)
    }
}

impl Add<Radius> for Varying32 {
    type Output = Varying32;

    #[inline(always)]
    fn add(self, rhs: Radius) -> Self::Output {
        Varying32(self.0.wrapping_add(rhs.wrapping_mul(4)))
    }
}

impl Sub<Radius> for Varying32 {
    type Output = Varying32;

    #[inline(always)]
    fn sub(self, rhs: Radius) -> Self::Output {
        Varying32(self.0.wrapping_sub(rhs.wrapping_mul(4)))
    }
}

impl fmt::Display for Varying32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slope() {
            1 => write!(f, "{} + t", self.y_intercept()),
            -1 => write!(f, "{} - t", self.y_intercept()),
            _ => write!(f, "{}", self.y_intercept()),
        }
    }
}

impl fmt::Debug for Varying32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Varying32({self})")
    }
}
