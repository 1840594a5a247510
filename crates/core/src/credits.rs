//! Credits - signed integer amount for the internal credit currency
//!
//! Credits are whole units. Transaction amounts are signed (earn is positive,
//! spend is negative); balances are normally non-negative but may go below
//! zero through an admin adjustment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Neg;
use thiserror::Error;

/// Errors that can occur when working with credit amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreditsError {
    #[error("Credit amount overflow: {0} + {1}")]
    Overflow(i64, i64),
}

/// A signed amount of credits.
///
/// # Example
/// ```
/// use engex_core::Credits;
///
/// let fee = Credits::new(5);
/// let balance = Credits::new(100);
/// assert_eq!(balance.checked_add(-fee).unwrap(), Credits::new(95));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Credits(i64);

impl Credits {
    /// Zero credits constant
    pub const ZERO: Self = Self(0);

    /// Create a new amount
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner value
    #[inline]
    pub const fn value(&self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Absolute value, saturating at `i64::MAX`
    #[inline]
    pub fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Overflow-checked addition
    pub fn checked_add(&self, other: Credits) -> Result<Credits, CreditsError> {
        self.0
            .checked_add(other.0)
            .map(Credits)
            .ok_or(CreditsError::Overflow(self.0, other.0))
    }

    /// Overflow-checked multiplication by a count (post pricing)
    pub fn checked_mul(&self, count: u32) -> Result<Credits, CreditsError> {
        self.0
            .checked_mul(i64::from(count))
            .map(Credits)
            .ok_or(CreditsError::Overflow(self.0, i64::from(count)))
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Neg for Credits {
    type Output = Credits;

    fn neg(self) -> Credits {
        Credits(-self.0)
    }
}

impl From<i64> for Credits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Credits> for i64 {
    fn from(credits: Credits) -> Self {
        credits.0
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Credits>>(iter: I) -> Self {
        Credits(iter.map(|c| c.0).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add() {
        let a = Credits::new(100);
        let b = Credits::new(-30);
        assert_eq!(a.checked_add(b).unwrap(), Credits::new(70));
    }

    #[test]
    fn test_checked_add_overflow() {
        let a = Credits::new(i64::MAX);
        let result = a.checked_add(Credits::new(1));
        assert!(matches!(result, Err(CreditsError::Overflow(_, _))));
    }

    #[test]
    fn test_checked_mul() {
        let fee = Credits::new(2);
        assert_eq!(fee.checked_mul(5).unwrap(), Credits::new(10));
    }

    #[test]
    fn test_neg() {
        assert_eq!(-Credits::new(5), Credits::new(-5));
        assert!((-Credits::new(5)).is_negative());
    }

    #[test]
    fn test_sum() {
        let total: Credits = [Credits::new(10), Credits::new(-3), Credits::new(1)]
            .into_iter()
            .sum();
        assert_eq!(total, Credits::new(8));
    }

    #[test]
    fn test_serde_transparent() {
        let credits = Credits::new(42);
        let json = serde_json::to_string(&credits).unwrap();
        assert_eq!(json, "42");
        let parsed: Credits = serde_json::from_str(&json).unwrap();
        assert_eq!(credits, parsed);
    }
}
