//! The `sort` command: rewrite a month sheet in chronological order.

use crate::commands::Out;
use crate::error::{store_error, StoreError};
use crate::model::MonthKey;
use crate::{Config, Ledger, Result};

/// Sorts the named month sheet (the current month when `month` is `None`). The sheet
/// is always re-read from the store first, so manual edits made since the last cached
/// snapshot are sorted too.
pub async fn sort(config: &Config, ledger: &Ledger, month: Option<MonthKey>) -> Result<Out<usize>> {
    let target = month.unwrap_or_else(|| MonthKey::from_datetime(config.now()));

    let sorted = match ledger.sort(target).await {
        Ok(sorted) => sorted,
        Err(e) => match store_error(&e) {
            Some(StoreError::NotFound(_)) => {
                return Ok(Out::new_message(format!(
                    "❌ Không tìm thấy sheet {target}"
                )));
            }
            _ => return Err(e),
        },
    };

    Ok(Out::new(
        format!("🔀 Đã sắp xếp {sorted} dòng trong sheet {target}"),
        sorted,
    ))
}
