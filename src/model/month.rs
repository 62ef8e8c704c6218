//! The `MonthKey` type, which names the monthly backing sheet for a set of entries.
//!
//! Every entry for a given calendar month lives in the sheet named `MM/YYYY`, e.g.
//! `09/2025`. This type is the cache key and the sheet identifier throughout the app.

use anyhow::{bail, Context};
use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Identifies one monthly sheet, formatted as `MM/YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(month: u32, year: i32) -> crate::Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("month must be between 1 and 12, got {month}");
        }
        Ok(Self { year, month })
    }

    /// The key for the month containing `when` (in whatever timezone `when` carries).
    pub fn from_datetime(when: DateTime<FixedOffset>) -> Self {
        Self {
            year: when.year(),
            month: when.month(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the key `offset` months away. Negative offsets go backwards, so
    /// `"01/2025".offset(-1)` is `"12/2024"`.
    pub fn offset(&self, offset: i32) -> Self {
        let zero_based = self.year * 12 + self.month as i32 - 1 + offset;
        Self {
            year: zero_based.div_euclid(12),
            month: zero_based.rem_euclid(12) as u32 + 1,
        }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl FromStr for MonthKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, year) = s
            .trim()
            .split_once('/')
            .with_context(|| format!("expected MM/YYYY, got '{s}'"))?;
        let month: u32 = month
            .parse()
            .with_context(|| format!("invalid month in '{s}'"))?;
        let year: i32 = year
            .parse()
            .with_context(|| format!("invalid year in '{s}'"))?;
        Self::new(month, year)
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MonthKey::from_str(&s).map_err(serde::de::Error::custom)
    }
}
