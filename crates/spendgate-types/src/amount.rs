//! Amount type with 6-decimal fixed-point precision
//!
//! SpendGate uses fixed-point arithmetic with i128 micro-units for all
//! budget math so that concurrent spend accounting never accumulates
//! floating-point drift.

use crate::{Result, SpendgateError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places carried by an [`Amount`]
pub const AMOUNT_DECIMALS: u8 = 6;

/// Micro-units per whole currency unit
pub const MICROS_PER_UNIT: i128 = 1_000_000;

/// Fixed-point monetary amount in the settlement denomination
///
/// The raw value is held in micro-units (10^-6). Arithmetic used in the
/// budget ledger is checked; helpers that cannot overflow saturate at zero.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount {
    /// Raw value in micro-units
    pub micros: i128,
}

impl Amount {
    /// Create an amount from raw micro-units
    pub const fn from_micros(micros: i128) -> Self {
        Self { micros }
    }

    /// Create a zero amount
    pub const fn zero() -> Self {
        Self { micros: 0 }
    }

    /// Create an amount from a human-readable value (e.g. `2.5`)
    ///
    /// Values are rounded to the nearest micro-unit.
    pub fn from_human(value: f64) -> Self {
        Self {
            micros: (value * MICROS_PER_UNIT as f64).round() as i128,
        }
    }

    /// Get the human-readable value
    pub fn to_human(&self) -> f64 {
        self.micros as f64 / MICROS_PER_UNIT as f64
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.micros == 0
    }

    /// Check if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.micros > 0
    }

    /// Check if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.micros < 0
    }

    /// Checked addition
    pub fn checked_add(&self, other: Amount) -> Result<Amount> {
        self.micros
            .checked_add(other.micros)
            .map(Amount::from_micros)
            .ok_or(SpendgateError::AmountOverflow)
    }

    /// Checked subtraction
    pub fn checked_sub(&self, other: Amount) -> Result<Amount> {
        self.micros
            .checked_sub(other.micros)
            .map(Amount::from_micros)
            .ok_or(SpendgateError::AmountOverflow)
    }

    /// Subtraction that floors at zero
    pub fn saturating_sub(&self, other: Amount) -> Amount {
        Amount::from_micros((self.micros - other.micros).max(0))
    }

    /// The smaller of two amounts
    pub fn min(&self, other: Amount) -> Amount {
        if self.micros <= other.micros {
            *self
        } else {
            other
        }
    }

    /// Take a basis-point fraction of this amount (integer arithmetic)
    pub fn fraction_bps(&self, bps: u16) -> Amount {
        Amount::from_micros(self.micros * bps as i128 / 10_000)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.micros < 0 { "-" } else { "" };
        let abs = self.micros.unsigned_abs();
        let units = abs / MICROS_PER_UNIT as u128;
        let frac = abs % MICROS_PER_UNIT as u128;
        if frac == 0 {
            write!(f, "{sign}{units}")
        } else {
            let frac = format!("{frac:06}");
            write!(f, "{sign}{units}.{}", frac.trim_end_matches('0'))
        }
    }
}
