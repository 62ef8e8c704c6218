//! A single expense/income record and its fixed-position sheet row form.
//!
//! A sheet row is `[Date dd/mm, Time HH:MM:SS, VND, Note, Category]`. The year is not
//! stored in the row; it comes from the month sheet the row lives in.

use crate::model::{Amount, Category, MonthKey};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// The header row written to new month sheets.
pub const HEADER: [&str; 5] = ["Date", "Time", "VND", "Note", "Category"];

/// One expense or income record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Entry {
    timestamp: NaiveDateTime,
    amount: Amount,
    note: String,
    category: Category,
}

impl Entry {
    /// Creates an entry, classifying the category from the note.
    pub fn new(timestamp: NaiveDateTime, amount: Amount, note: impl Into<String>) -> Self {
        let note = note.into();
        let category = Category::classify(&note);
        Self {
            timestamp,
            amount,
            note,
            category,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// The key of the month sheet this entry belongs in.
    pub fn month_key(&self) -> MonthKey {
        use chrono::Datelike;
        // The timestamp always carries a valid month, so this cannot fail.
        MonthKey::new(self.timestamp.month(), self.timestamp.year())
            .unwrap_or_else(|_| unreachable!("chrono months are 1..=12"))
    }

    /// The fixed-position sheet row for this entry.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.format("%d/%m").to_string(),
            self.timestamp.format("%H:%M:%S").to_string(),
            self.amount.vnd().to_string(),
            self.note.clone(),
            self.category.to_string(),
        ]
    }

    /// Parses a sheet row from the sheet named by `month`.
    ///
    /// Returns `None` for rows that are not entries: the header, blank padding, or rows
    /// whose date or amount cannot be parsed. A missing or unknown category cell falls
    /// back to keyword classification of the note.
    pub fn from_row(month: MonthKey, row: &[String]) -> Option<Self> {
        let date_cell = row.first().map(|s| s.trim()).unwrap_or_default();
        let time_cell = row.get(1).map(|s| s.trim()).unwrap_or_default();
        let amount_cell = row.get(2).map(|s| s.trim()).unwrap_or_default();
        let note = row.get(3).map(|s| s.trim()).unwrap_or_default().to_string();

        let date = parse_date(month, date_cell)?;
        let time = parse_time(time_cell).unwrap_or_default();
        let amount: Amount = amount_cell.parse().ok()?;

        let category = row
            .get(4)
            .and_then(|cell| cell.trim().parse().ok())
            .unwrap_or_else(|| Category::classify(&note));

        Some(Self {
            timestamp: NaiveDateTime::new(date, time),
            amount,
            note,
            category,
        })
    }

    /// One reply line for this entry, e.g. `⏰ 08:30:00 | 💰 50,000 VND | ⛽ xăng`.
    pub fn format_line(&self) -> String {
        format!(
            "⏰ {} | 💰 {} | {} {}",
            self.timestamp.format("%H:%M:%S"),
            self.amount.display_vnd(),
            self.category.icon(),
            self.note
        )
    }
}

/// Parses a `dd/mm` (or `dd/mm/yyyy`) date cell, taking the year from the month sheet.
fn parse_date(month: MonthKey, cell: &str) -> Option<NaiveDate> {
    let mut parts = cell.split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let mon: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = match parts.next() {
        Some(y) => y.trim().parse().ok()?,
        None => month.year(),
    };
    NaiveDate::from_ymd_opt(year, mon, day)
}

/// Parses an `HH:MM:SS` or `HH:MM` time cell.
fn parse_time(cell: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(cell, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(cell, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month() -> MonthKey {
        "09/2025".parse().unwrap()
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_to_row_positions() {
        let ts = NaiveDate::from_ymd_opt(2025, 9, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let entry = Entry::new(ts, Amount::new(50000), "xăng");
        assert_eq!(
            entry.to_row(),
            strings(&["02/09", "08:30:00", "50000", "xăng", "gas"])
        );
    }

    #[test]
    fn test_from_row_round_trip() {
        let ts = NaiveDate::from_ymd_opt(2025, 9, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let entry = Entry::new(ts, Amount::new(50000), "xăng");
        let back = Entry::from_row(month(), &entry.to_row()).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_from_row_missing_category_classifies_note() {
        let row = strings(&["02/09", "12:00:00", "30000", "ăn trưa"]);
        let entry = Entry::from_row(month(), &row).unwrap();
        assert_eq!(entry.category(), Category::Food);
    }

    #[test]
    fn test_from_row_skips_header_and_blank() {
        let header: Vec<String> = HEADER.iter().map(|s| s.to_string()).collect();
        assert!(Entry::from_row(month(), &header).is_none());
        assert!(Entry::from_row(month(), &strings(&["", "", "", ""])).is_none());
        assert!(Entry::from_row(month(), &[]).is_none());
    }

    #[test]
    fn test_from_row_missing_time_defaults_to_midnight() {
        let row = strings(&["02/09", "", "30000", "ăn"]);
        let entry = Entry::from_row(month(), &row).unwrap();
        assert_eq!(entry.timestamp().format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn test_month_key_from_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2025, 9, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let entry = Entry::new(ts, Amount::new(1000), "ăn");
        assert_eq!(entry.month_key().to_string(), "09/2025");
    }
}
