//! Two-decimal money amounts held in minor units

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A non-negative amount with exactly two decimal digits of precision.
///
/// Stored as minor units (paise) so formatting never drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount
    pub const ZERO: Amount = Amount(0);

    /// Build from minor units (1 rupee = 100 minor units).
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Build from whole major units, or `None` if the value does not fit.
    pub const fn checked_from_major(major: u64) -> Option<Self> {
        match major.checked_mul(100) {
            Some(minor) => Some(Self(minor)),
            None => None,
        }
    }

    /// Build from whole major units.
    ///
    /// Saturates at the largest representable amount; use
    /// [`Amount::checked_from_major`] to detect that case.
    pub const fn from_major(major: u64) -> Self {
        Self(major.saturating_mul(100))
    }

    /// Amount in minor units.
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// True when the amount is strictly positive.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Lossy conversion for JSON payloads, which the backend reads as doubles.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse user input such as `10`, `10.5`, `.75` or `10.005`.
    ///
    /// Digits beyond the second decimal are rounded half-up.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        let invalid = || Error::Validation(format!("Invalid amount '{}'", input.trim()));

        if text.is_empty() {
            return Err(Error::Validation("Amount is empty".to_string()));
        }
        if text.starts_with('-') {
            return Err(Error::Validation("Amount must not be negative".to_string()));
        }

        let text = text.strip_prefix('+').unwrap_or(text);
        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let major: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let digits: Vec<u64> = fraction.bytes().map(|b| u64::from(b - b'0')).collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).is_some_and(|d| *d >= 5);

        major
            .checked_mul(100)
            .and_then(|m| m.checked_add(tenths * 10 + hundredths + u64::from(round_up)))
            .map(Amount)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}
