//! The `del` command: remove one entry from the current month by amount and note.

use crate::commands::Out;
use crate::error::{store_error, StoreError};
use crate::model::{Entry, MonthKey};
use crate::parse::parse_delete;
use crate::{Config, Ledger, Result};

/// Deletes the first entry of the current month matching `text`, which is parsed as
/// `<amount> <note>` with the same shorthand as logging. A miss is reported as a
/// message rather than an error, since there is nothing for the user to fix but the
/// key they typed.
pub async fn delete(config: &Config, ledger: &Ledger, text: &str) -> Result<Out<Entry>> {
    let (amount, note) = parse_delete(text)?;
    let month = MonthKey::from_datetime(config.now());

    let entry = match ledger.delete(month, amount, &note).await {
        Ok(entry) => entry,
        Err(e) => match store_error(&e) {
            Some(StoreError::NoMatch { .. }) | Some(StoreError::NotFound(_)) => {
                return Ok(Out::new_message(format!(
                    "❌ Không tìm thấy khoản chi {} '{}' trong tháng {}",
                    amount.display_vnd(),
                    note,
                    month
                )));
            }
            _ => return Err(e),
        },
    };

    let message = format!(
        "🗑️ Đã xoá:\n💰 {}\n📝 {}\n📅 {}",
        entry.amount().display_vnd(),
        entry.note(),
        entry.timestamp().format("%d/%m %H:%M:%S"),
    );
    Ok(Out::new(message, entry))
}
