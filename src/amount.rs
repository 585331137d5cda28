//! APT amounts and their conversion to atomic units.
//!
//! Streams store every quantity as a whole number of atomic units
//! (10^-8 APT). Human input and display go through [`Apt`], which wraps
//! `rust_decimal::Decimal` so conversion never touches floating point.

use crate::error::{Result, StreamError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Atomic units in one APT.
pub const ATOMIC_UNITS_PER_APT: u64 = 100_000_000;

/// A non-negative APT quantity.
///
/// Displays with 6 decimal places, rounding half away from zero.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use flowfi_streams::Apt;
///
/// let amount = Apt::from_str("1.5").unwrap();
/// assert_eq!(amount.to_atomic().unwrap(), 150_000_000);
/// assert_eq!(amount.to_string(), "1.500000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Apt(Decimal);

impl Apt {
    /// Decimal places used for display.
    pub const DISPLAY_SCALE: u32 = 6;

    /// Builds an amount from atomic units.
    pub fn from_atomic(atomic: u64) -> Self {
        Apt(Decimal::from(atomic) / Decimal::from(ATOMIC_UNITS_PER_APT))
    }

    /// Converts to atomic units, discarding any fraction of an atomic unit.
    pub fn to_atomic(&self) -> Result<u64> {
        self.0
            .checked_mul(Decimal::from(ATOMIC_UNITS_PER_APT))
            .map(|scaled| scaled.floor())
            .and_then(|floored| floored.to_u64())
            .ok_or_else(|| StreamError::InvalidAmount(self.0.to_string()))
    }
}

impl FromStr for Apt {
    type Err = StreamError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal =
            Decimal::from_str(trimmed).map_err(|_| StreamError::InvalidAmount(trimmed.to_string()))?;
        if decimal.is_sign_negative() && !decimal.is_zero() {
            return Err(StreamError::InvalidAmount(trimmed.to_string()));
        }
        Ok(Apt(decimal))
    }
}

impl fmt::Display for Apt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(Self::DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "{:.6}", rounded)
    }
}

impl Serialize for Apt {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Apt {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Apt::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses a human APT amount into atomic units.
pub fn parse_apt(s: &str) -> Result<u64> {
    Apt::from_str(s)?.to_atomic()
}

/// Formats atomic units as APT with 6 decimal places.
pub fn format_apt(atomic: u64) -> String {
    Apt::from_atomic(atomic).to_string()
}

/// Atomic units released per second over `duration` seconds.
///
/// Returns zero for a non-positive duration; callers validate timing first.
pub fn rate_per_second(amount: u64, duration: i128) -> Decimal {
    if duration <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(amount) / Decimal::from_i128_with_scale(duration, 0)).round_dp(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apt_to_atomic_units() {
        assert_eq!(parse_apt("1").unwrap(), 100_000_000);
        assert_eq!(parse_apt("0.5").unwrap(), 50_000_000);
        assert_eq!(parse_apt("  2.25  ").unwrap(), 225_000_000);
    }

    #[test]
    fn test_parse_apt_floors_sub_atomic_fractions() {
        assert_eq!(parse_apt("0.000000019").unwrap(), 1);
        assert_eq!(parse_apt("0.000000009").unwrap(), 0);
    }

    #[test]
    fn test_parse_apt_rejects_garbage_and_negative() {
        assert!(matches!(parse_apt("abc"), Err(StreamError::InvalidAmount(_))));
        assert!(matches!(parse_apt("-1.0"), Err(StreamError::InvalidAmount(_))));
        assert!(parse_apt("").is_err());
    }

    #[test]
    fn test_format_apt_six_places() {
        assert_eq!(format_apt(100_000_000), "1.000000");
        assert_eq!(format_apt(0), "0.000000");
        assert_eq!(format_apt(12_345_678), "0.123457");
    }

    #[test]
    fn test_rate_per_second() {
        assert_eq!(rate_per_second(3600, 3600), Decimal::ONE);
        assert_eq!(
            rate_per_second(100_000_000, 7200).to_string(),
            "13888.88888889"
        );
        assert_eq!(rate_per_second(100, 0), Decimal::ZERO);
    }
}
