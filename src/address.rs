//! Account addresses.

use crate::error::StreamError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An account address: `0x` followed by exactly 64 hexadecimal characters.
///
/// Parsing trims surrounding whitespace and normalizes to lowercase, so two
/// addresses compare equal regardless of the case they were entered in.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use flowfi_streams::Address;
///
/// let raw = format!("0x{}", "AB".repeat(32));
/// let address = Address::from_str(&raw).unwrap();
/// assert_eq!(address.as_str(), format!("0x{}", "ab".repeat(32)));
/// assert_eq!(address.short(), "0xabab...abab");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Number of hex digits after the `0x` prefix.
    pub const HEX_LEN: usize = 64;

    /// Returns the full address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display: first 6 and last 4 characters.
    pub fn short(&self) -> String {
        let s = &self.0;
        format!("{}...{}", &s[..6], &s[s.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = StreamError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .ok_or_else(|| StreamError::InvalidAddress(trimmed.to_string()))?;

        if hex.len() != Self::HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StreamError::InvalidAddress(trimmed.to_string()));
        }

        Ok(Address(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(fill: &str) -> String {
        format!("0x{}", fill.repeat(64 / fill.len()))
    }

    #[test]
    fn test_parse_valid_address() {
        let address = Address::from_str(&hex("a1")).unwrap();
        assert_eq!(address.as_str(), hex("a1"));
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let upper = Address::from_str(&format!("  {}  ", hex("F0"))).unwrap();
        let lower = Address::from_str(&hex("f0")).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_rejects_missing_prefix() {
        let raw = "a".repeat(64);
        assert!(matches!(
            Address::from_str(&raw),
            Err(StreamError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(Address::from_str("0x1234").is_err());
        assert!(Address::from_str(&format!("{}0", hex("a"))).is_err());
    }

    #[test]
    fn test_rejects_non_hex() {
        let raw = format!("0x{}", "g".repeat(64));
        assert!(Address::from_str(&raw).is_err());
    }

    #[test]
    fn test_short_form() {
        let raw = format!("0x1234{}abcd", "0".repeat(56));
        let address = Address::from_str(&raw).unwrap();
        assert_eq!(address.short(), "0x1234...abcd");
    }
}
