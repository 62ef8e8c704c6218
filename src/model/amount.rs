//! Amount type for whole-đồng monetary values.
//!
//! VND has no fractional unit in daily use, so amounts are plain integers. Parsing is
//! permissive about the junk that shows up in sheet cells and chat messages: thousands
//! separators, `₫`, `VND`, stray whitespace.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A whole number of Vietnamese đồng.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const fn new(vnd: i64) -> Self {
        Self(vnd)
    }

    /// The value in đồng.
    pub fn vnd(&self) -> i64 {
        self.0
    }

    /// Renders with thousands separators and the currency name, e.g. `50,000 VND`.
    pub fn display_vnd(&self) -> String {
        format!("{self} VND")
    }
}

/// An error that occurs when a string contains no digits to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no numeric amount found in '{0}'")]
pub struct AmountError(String);

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Keep only digits. Drops separators, '₫', 'VND' and anything else.
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(AmountError(s.to_string()));
        }
        let value: i64 = digits.parse().map_err(|_| AmountError(s.to_string()))?;
        Ok(Amount(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            format_num::format_num!(",.0f", self.0 as f64)
        )
    }
}

impl From<i64> for Amount {
    fn from(vnd: i64) -> Self {
        Amount(vnd)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Sheet cells hold the bare integer, no separators.
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(Amount::from_str("50000").unwrap().vnd(), 50000);
    }

    #[test]
    fn test_parse_with_separators() {
        assert_eq!(Amount::from_str("50,000").unwrap().vnd(), 50000);
        assert_eq!(Amount::from_str("1.250.000").unwrap().vnd(), 1250000);
    }

    #[test]
    fn test_parse_with_currency_markers() {
        assert_eq!(Amount::from_str("50000 VND").unwrap().vnd(), 50000);
        assert_eq!(Amount::from_str("₫50,000").unwrap().vnd(), 50000);
    }

    #[test]
    fn test_parse_no_digits_is_error() {
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("xăng").is_err());
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Amount::new(50000).to_string(), "50,000");
        assert_eq!(Amount::new(1250000).display_vnd(), "1,250,000 VND");
        assert_eq!(Amount::new(0).to_string(), "0");
    }

    #[test]
    fn test_serialize_bare_integer() {
        let json = serde_json::to_string(&Amount::new(50000)).unwrap();
        assert_eq!(json, "\"50000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vnd(), 50000);
    }
}
