//! # Money
//!
//! Commission amounts are counted in minor currency units (e.g. cents) as a
//! non-negative integer. Floats never represent money: canonicalization
//! rejects them, and summing floats drifts.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A non-negative amount of minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
pub struct Amount(i64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Create an amount.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAmount`] if `minor_units` is negative.
    pub fn new(minor_units: i64) -> Result<Self, ValidationError> {
        if minor_units < 0 {
            return Err(ValidationError::InvalidAmount(minor_units));
        }
        Ok(Self(minor_units))
    }

    /// The amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Add two amounts, returning `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Add two amounts, clamping at `i64::MAX`.
    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}
