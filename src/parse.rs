//! Free-text parsing of expense messages.
//!
//! Three input shapes are accepted for logging:
//! - `"<amount> <note>"` — stamped with the current date and time,
//! - `"dd/mm <amount> <note>"` — time defaults to midnight,
//! - `"dd/mm hh:mm <amount> <note>"` — `h`-style times like `10h30` also work.
//!
//! Amounts are typed in thousands of đồng (`50 xăng` is 50 000 VND), and one-letter
//! shortcuts in the note expand to common phrases (`x` is `xăng xe`).

use crate::model::{Amount, Entry};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// Typed amounts are multiplied by this before storage.
const AMOUNT_MULTIPLIER: i64 = 1000;

/// Fallback note for messages that carry only an amount.
const EMPTY_NOTE: &str = "Không có ghi chú";

/// One-letter note shortcuts.
pub const SHORTCUTS: [(&str, &str); 9] = [
    ("a", "ăn"),
    ("s", "ăn sáng"),
    ("t", "ăn trưa"),
    ("o", "ăn tối"),
    ("c", "cafe"),
    ("x", "xăng xe"),
    ("g", "grab"),
    ("b", "xe buýt"),
    ("n", "thuê nhà"),
];

/// Parses a free-text expense message into an entry. `now` supplies the date and time
/// for messages that do not carry their own, and the year for `dd/mm` dates.
pub fn parse_log(text: &str, now: DateTime<FixedOffset>) -> Result<Entry> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let Some(&first) = parts.first() else {
        bail!("empty expense message");
    };

    // "<amount> <note>"
    if let Some(amount) = parse_amount_token(first) {
        let note = expand_shortcuts(&parts[1..]);
        return Ok(Entry::new(now.naive_local(), amount, note));
    }

    let date = parse_date_token(first, now.year())
        .with_context(|| format!("unrecognized expense message '{text}'"))?;

    // "dd/mm hh:mm <amount> <note>"
    if let Some(time) = parts.get(1).and_then(|t| parse_time_token(t)) {
        let amount = parts
            .get(2)
            .and_then(|t| parse_amount_token(t))
            .with_context(|| format!("expected an amount after the time in '{text}'"))?;
        let note = expand_shortcuts(&parts[3..]);
        return Ok(Entry::new(NaiveDateTime::new(date, time), amount, note));
    }

    // "dd/mm <amount> <note>"
    let amount = parts
        .get(1)
        .and_then(|t| parse_amount_token(t))
        .with_context(|| format!("expected an amount after the date in '{text}'"))?;
    let note = expand_shortcuts(&parts[2..]);
    Ok(Entry::new(
        NaiveDateTime::new(date, NaiveTime::default()),
        amount,
        note,
    ))
}

/// Parses a delete request: `"<amount> <note>"`, with the same thousands multiplier
/// and shortcut expansion as logging, so a deletion is typed exactly like the entry
/// it targets.
pub fn parse_delete(text: &str) -> Result<(Amount, String)> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let amount = parts
        .first()
        .and_then(|t| parse_amount_token(t))
        .with_context(|| format!("expected '<amount> <note>', got '{text}'"))?;
    if parts.len() < 2 {
        bail!("expected '<amount> <note>', got '{text}'");
    }
    Ok((amount, expand_shortcuts(&parts[1..])))
}

/// An all-digit token is an amount, in thousands of đồng.
fn parse_amount_token(token: &str) -> Option<Amount> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let thousands: i64 = token.parse().ok()?;
    let vnd = thousands.checked_mul(AMOUNT_MULTIPLIER)?;
    Some(Amount::new(vnd))
}

/// Parses a `d/m` or `dd/mm` token, taking the year from `year`.
fn parse_date_token(token: &str, year: i32) -> Option<NaiveDate> {
    let (day, month) = token.split_once('/')?;
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses `hh:mm`, `hh:mm:ss`, or the `h`-style shorthand: `10h` is 10:00:00,
/// `10h30` is 10:30:00, `10h30s45` is 10:30:45.
fn parse_time_token(token: &str) -> Option<NaiveTime> {
    let token = token.trim().to_lowercase().replace(' ', "");
    if let Some((hour, rest)) = token.split_once('h') {
        let hour: u32 = if hour.is_empty() { 0 } else { hour.parse().ok()? };
        let (minute, second) = match rest.split_once('s') {
            Some((m, s)) => (
                if m.is_empty() { 0 } else { m.parse().ok()? },
                if s.is_empty() { 0 } else { s.parse().ok()? },
            ),
            None => (
                if rest.is_empty() { 0 } else { rest.parse().ok()? },
                0,
            ),
        };
        return NaiveTime::from_hms_opt(hour, minute, second);
    }
    if !token.contains(':') {
        return None;
    }
    NaiveTime::parse_from_str(&token, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&token, "%H:%M"))
        .ok()
}

/// Expands one-letter shortcuts token by token. An empty note gets a placeholder.
fn expand_shortcuts(tokens: &[&str]) -> String {
    if tokens.is_empty() {
        return EMPTY_NOTE.to_string();
    }
    tokens
        .iter()
        .map(|token| {
            let lower = token.to_lowercase();
            SHORTCUTS
                .iter()
                .find(|(key, _)| *key == lower)
                .map(|(_, expansion)| *expansion)
                .unwrap_or(token)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 9, 14, 8, 30, 15)
            .unwrap()
    }

    #[test]
    fn test_amount_and_note() {
        let entry = parse_log("50 xăng", now()).unwrap();
        assert_eq!(entry.amount().vnd(), 50000);
        assert_eq!(entry.note(), "xăng");
        assert_eq!(entry.category(), Category::Gas);
        assert_eq!(
            entry.timestamp().format("%d/%m %H:%M:%S").to_string(),
            "14/09 08:30:15"
        );
    }

    #[test]
    fn test_shortcut_expansion() {
        let entry = parse_log("15 t", now()).unwrap();
        assert_eq!(entry.note(), "ăn trưa");
        assert_eq!(entry.category(), Category::Food);
    }

    #[test]
    fn test_shortcut_expansion_is_per_token() {
        let entry = parse_log("20 c với bạn", now()).unwrap();
        assert_eq!(entry.note(), "cafe với bạn");
    }

    #[test]
    fn test_amount_only_gets_placeholder_note() {
        let entry = parse_log("5", now()).unwrap();
        assert_eq!(entry.amount().vnd(), 5000);
        assert_eq!(entry.note(), EMPTY_NOTE);
    }

    #[test]
    fn test_date_only_defaults_to_midnight() {
        let entry = parse_log("2/9 5 cafe", now()).unwrap();
        assert_eq!(
            entry.timestamp().format("%d/%m/%Y %H:%M:%S").to_string(),
            "02/09/2025 00:00:00"
        );
        assert_eq!(entry.amount().vnd(), 5000);
    }

    #[test]
    fn test_date_and_time() {
        let entry = parse_log("02/09 08:30 15 t", now()).unwrap();
        assert_eq!(
            entry.timestamp().format("%d/%m %H:%M:%S").to_string(),
            "02/09 08:30:00"
        );
        assert_eq!(entry.note(), "ăn trưa");
    }

    #[test]
    fn test_h_style_times() {
        let entry = parse_log("02/09 10h30 15 t", now()).unwrap();
        assert_eq!(entry.timestamp().format("%H:%M:%S").to_string(), "10:30:00");
        let entry = parse_log("02/09 10h 15 t", now()).unwrap();
        assert_eq!(entry.timestamp().format("%H:%M:%S").to_string(), "10:00:00");
        let entry = parse_log("02/09 10h30s45 15 t", now()).unwrap();
        assert_eq!(entry.timestamp().format("%H:%M:%S").to_string(), "10:30:45");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_log("", now()).is_err());
        assert!(parse_log("ăn trưa", now()).is_err());
        assert!(parse_log("99/99 5 cafe", now()).is_err());
        assert!(parse_log("02/09 cafe", now()).is_err());
    }

    #[test]
    fn test_rejects_amount_too_large_to_multiply() {
        // Parses as i64 but overflows once multiplied into đồng.
        assert!(parse_log("9223372036854775807 cafe", now()).is_err());
        assert!(parse_delete("9223372036854775807 cafe").is_err());
    }

    #[test]
    fn test_parse_delete() {
        let (amount, note) = parse_delete("50 x").unwrap();
        assert_eq!(amount.vnd(), 50000);
        assert_eq!(note, "xăng xe");
    }

    #[test]
    fn test_parse_delete_requires_note() {
        assert!(parse_delete("50").is_err());
        assert!(parse_delete("cafe").is_err());
    }
}
