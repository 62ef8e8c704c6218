//! The `log` command: record one expense from a free-text message.

use crate::commands::Out;
use crate::model::Entry;
use crate::parse::parse_log;
use crate::{Config, Ledger, Result};

/// Parses `text` into an entry and appends it to the entry's month sheet. One remote
/// append per call; no read happens on this path.
pub async fn log(config: &Config, ledger: &Ledger, text: &str) -> Result<Out<Entry>> {
    let entry = parse_log(text, config.now())?;
    ledger.log(&entry).await?;

    let message = format!(
        "✅ Đã ghi nhận:\n💰 {}\n📝 {}\n📅 {}\n📄 Sheet: {}",
        entry.amount().display_vnd(),
        entry.note(),
        entry.timestamp().format("%d/%m %H:%M:%S"),
        entry.month_key(),
    );
    Ok(Out::new(message, entry))
}
