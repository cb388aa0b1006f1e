//! Signed simulation durations.
//!
//! One turn is one simulated second. Field ages are signed: a negative age
//! marks a field that is being fed (fire with fuel), zero or positive ages
//! drift toward decay.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A signed span of simulation time, counted in turns.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimeDuration(i64);

impl TimeDuration {
    /// The empty duration.
    pub const ZERO: Self = Self(0);

    /// One simulation turn.
    pub const TURN: Self = Self(1);

    /// Duration of `n` turns.
    #[must_use]
    pub const fn turns(n: i64) -> Self {
        Self(n)
    }

    /// Duration of `n` seconds.
    #[must_use]
    pub const fn seconds(n: i64) -> Self {
        Self(n)
    }

    /// Duration of `n` minutes.
    #[must_use]
    pub const fn minutes(n: i64) -> Self {
        Self(n * 60)
    }

    /// Duration of `n` hours.
    #[must_use]
    pub const fn hours(n: i64) -> Self {
        Self(n * 3600)
    }

    /// Number of whole turns in this duration.
    #[must_use]
    pub const fn as_turns(self) -> i64 {
        self.0
    }

    /// Whether this duration is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether this duration is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for TimeDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for TimeDuration {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for TimeDuration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for TimeDuration {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for TimeDuration {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Mul<i64> for TimeDuration {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

impl Div<i64> for TimeDuration {
    type Output = Self;

    /// Integer division; dividing by zero yields zero.
    fn div(self, rhs: i64) -> Self {
        if rhs == 0 {
            Self::ZERO
        } else {
            Self(self.0 / rhs)
        }
    }
}

impl fmt::Display for TimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} turns", self.0)
    }
}
