//! The ledger: every read and write of the monthly expense sheets goes through here.
//!
//! Reads are served from a per-month TTL cache when the snapshot is fresh, and each
//! mutation invalidates the month it touched only after the remote write succeeds. A
//! month's cache slot is held locked across read-modify-write sequences, so two
//! concurrent operations on the same sheet cannot interleave a stale read between a
//! write and its invalidation.

use crate::api::SheetStore;
use crate::cache::SheetCache;
use crate::error::StoreError;
use crate::model::{Amount, Entry, MonthKey};
use crate::Result;
use std::time::Duration;
use tracing::{debug, info};

pub struct Ledger {
    store: tokio::sync::Mutex<Box<dyn SheetStore>>,
    cache: SheetCache,
}

impl Ledger {
    pub fn new(store: Box<dyn SheetStore>, cache_ttl: Duration) -> Self {
        Self {
            store: tokio::sync::Mutex::new(store),
            cache: SheetCache::new(cache_ttl),
        }
    }

    /// The raw rows of the month sheet, header included. Served from the cache when
    /// fresh, otherwise fetched and recorded. A failed fetch leaves the slot as it was.
    pub async fn snapshot(&self, month: MonthKey) -> Result<Vec<Vec<String>>> {
        let slot = self.cache.slot(month);
        let mut slot = slot.lock().await;
        if let Some(rows) = slot.fresh(self.cache.ttl()) {
            debug!("Serving {month} from cache");
            return Ok(rows.clone());
        }
        let rows = self.store.lock().await.read_rows(&month.to_string()).await?;
        slot.record(rows.clone());
        Ok(rows)
    }

    /// The parsed entries of the month sheet, in sheet order. Header and unparsable
    /// rows are skipped. A month with no sheet yet is an empty month, not an error.
    pub async fn entries(&self, month: MonthKey) -> Result<Vec<Entry>> {
        let rows = match self.snapshot(month).await {
            Ok(rows) => rows,
            Err(e) if matches!(crate::error::store_error(&e), Some(StoreError::NotFound(_))) => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        Ok(rows
            .iter()
            .filter_map(|row| Entry::from_row(month, row))
            .collect())
    }

    /// Records one entry: a single append to the entry's month sheet, then cache
    /// invalidation for that month. No read happens on this path.
    pub async fn log(&self, entry: &Entry) -> Result<()> {
        let month = entry.month_key();
        let slot = self.cache.slot(month);
        let mut slot = slot.lock().await;
        self.store
            .lock()
            .await
            .append_row(&month.to_string(), &entry.to_row())
            .await?;
        slot.clear();
        info!(
            "Logged {} for '{}' in {month}",
            entry.amount().display_vnd(),
            entry.note()
        );
        Ok(())
    }

    /// Deletes the first entry in sheet order matching `amount` and `note` exactly,
    /// and returns it. When nothing matches, fails with `StoreError::NoMatch` without
    /// issuing any delete against the store.
    pub async fn delete(&self, month: MonthKey, amount: Amount, note: &str) -> Result<Entry> {
        let slot = self.cache.slot(month);
        let mut slot = slot.lock().await;
        let rows = match slot.fresh(self.cache.ttl()) {
            Some(rows) => rows.clone(),
            None => {
                let rows = self.store.lock().await.read_rows(&month.to_string()).await?;
                slot.record(rows.clone());
                rows
            }
        };

        let found = rows.iter().enumerate().find_map(|(position, row)| {
            let entry = Entry::from_row(month, row)?;
            (entry.amount() == amount && entry.note() == note).then_some((position, entry))
        });
        let Some((position, entry)) = found else {
            return Err(StoreError::NoMatch {
                amount: amount.vnd(),
                note: note.to_string(),
            }
            .into());
        };

        self.store
            .lock()
            .await
            .delete_row(&month.to_string(), position)
            .await?;
        slot.clear();
        info!("Deleted row {position} from {month}");
        Ok(entry)
    }

    /// Sorts the month sheet's data rows chronologically and writes them back.
    /// Returns the number of data rows. Always reads the store directly, never the
    /// cache, so the rewrite works from the sheet's true current contents.
    pub async fn sort(&self, month: MonthKey) -> Result<usize> {
        let slot = self.cache.slot(month);
        let mut slot = slot.lock().await;
        let mut store = self.store.lock().await;

        let mut rows = store.read_rows(&month.to_string()).await?;
        if rows.len() <= 1 {
            return Ok(0);
        }
        // Row 0 is the header and stays put. Rows that fail to parse sort first,
        // keeping their relative order.
        let data = &mut rows[1..];
        data.sort_by_key(|row| Entry::from_row(month, row).map(|e| e.timestamp()));
        let sorted = data.len();

        store.overwrite_rows(&month.to_string(), &rows).await?;
        slot.clear();
        info!("Sorted {sorted} rows in {month}");
        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryStore;
    use crate::error::store_error;
    use crate::model::HEADER;
    use chrono::NaiveDate;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(30);

    fn month() -> MonthKey {
        MonthKey::new(9, 2025).unwrap()
    }

    fn entry(day: u32, hour: u32, vnd: i64, note: &str) -> Entry {
        let ts = NaiveDate::from_ymd_opt(2025, 9, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Entry::new(ts, Amount::new(vnd), note)
    }

    fn ledger_with(store: &MemoryStore, ttl: Duration) -> Ledger {
        Ledger::new(Box::new(store.clone()), ttl)
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let mut rows = vec![HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        rows.push(entry(5, 12, 50000, "ăn trưa").to_row());
        rows.push(entry(3, 8, 50000, "xăng").to_row());
        rows.push(entry(3, 19, 120000, "ăn tối").to_row());
        store.insert_sheet(&month().to_string(), rows);
        store
    }

    #[tokio::test]
    async fn test_log_is_one_append_and_no_reads() {
        let store = MemoryStore::new();
        let ledger = ledger_with(&store, TTL);

        ledger.log(&entry(5, 12, 50000, "ăn trưa")).await.unwrap();

        let counts = store.counts();
        assert_eq!(counts.appends, 1);
        assert_eq!(counts.reads, 0);
        assert_eq!(store.rows("09/2025").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_served_from_cache_within_ttl() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);

        let first = ledger.snapshot(month()).await.unwrap();
        let second = ledger.snapshot(month()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.counts().reads, 1);
    }

    #[tokio::test]
    async fn test_expired_snapshot_is_refetched() {
        let store = seeded_store();
        let ledger = ledger_with(&store, Duration::ZERO);

        ledger.snapshot(month()).await.unwrap();
        ledger.snapshot(month()).await.unwrap();
        assert_eq!(store.counts().reads, 2);
    }

    #[tokio::test]
    async fn test_log_invalidates_the_month() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);

        ledger.snapshot(month()).await.unwrap();
        ledger.log(&entry(6, 9, 30000, "ăn sáng")).await.unwrap();
        let rows = ledger.snapshot(month()).await.unwrap();

        // The fresh read must see the new row.
        assert_eq!(store.counts().reads, 2);
        assert_eq!(rows.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache_intact() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);

        ledger.snapshot(month()).await.unwrap();
        store.set_fail_writes(true);
        let err = ledger.log(&entry(6, 9, 30000, "ăn sáng")).await.unwrap_err();
        assert_eq!(
            store_error(&err),
            Some(&StoreError::Write("09/2025".to_string()))
        );

        // The snapshot is still served from cache.
        ledger.snapshot(month()).await.unwrap();
        assert_eq!(store.counts().reads, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_first_match_only() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);
        // Two rows share the amount; only "ăn trưa" matches the note.
        let deleted = ledger
            .delete(month(), Amount::new(50000), "ăn trưa")
            .await
            .unwrap();
        assert_eq!(deleted.note(), "ăn trưa");

        let rows = store.rows("09/2025").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][3], "xăng");
        assert_eq!(store.counts().deletes, 1);
    }

    #[tokio::test]
    async fn test_delete_duplicate_rows_takes_sheet_order_first() {
        let store = MemoryStore::new();
        let mut rows = vec![HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        rows.push(entry(3, 8, 40000, "cafe").to_row());
        rows.push(entry(1, 8, 40000, "cafe").to_row());
        store.insert_sheet(&month().to_string(), rows);
        let ledger = ledger_with(&store, TTL);

        let deleted = ledger.delete(month(), Amount::new(40000), "cafe").await.unwrap();
        assert_eq!(deleted.timestamp().format("%d/%m").to_string(), "03/09");

        let remaining = store.rows("09/2025").unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[1][0], "01/09");
    }

    #[tokio::test]
    async fn test_delete_no_match_issues_no_delete_call() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);

        let err = ledger
            .delete(month(), Amount::new(99999), "ăn trưa")
            .await
            .unwrap_err();
        assert_eq!(
            store_error(&err),
            Some(&StoreError::NoMatch {
                amount: 99999,
                note: "ăn trưa".to_string()
            })
        );
        assert_eq!(store.counts().deletes, 0);
        assert_eq!(store.rows("09/2025").unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_deletes_remove_the_row_once() {
        let store = MemoryStore::new();
        let mut rows = vec![HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        rows.push(entry(3, 8, 50000, "xăng").to_row());
        store.insert_sheet(&month().to_string(), rows);
        let ledger = Arc::new(ledger_with(&store, TTL));

        // Warm the cache so both tasks would see the row without the slot lock.
        ledger.snapshot(month()).await.unwrap();

        let spawn_delete = |ledger: Arc<Ledger>| {
            tokio::spawn(
                async move { ledger.delete(month(), Amount::new(50000), "xăng").await },
            )
        };
        let first = spawn_delete(ledger.clone());
        let second = spawn_delete(ledger.clone());
        let first = first.await.unwrap();
        let second = second.await.unwrap();

        // Exactly one wins; the other finds the row already gone.
        let (won, lost) = if first.is_ok() {
            (first, second)
        } else {
            (second, first)
        };
        assert_eq!(won.unwrap().note(), "xăng");
        assert_eq!(
            store_error(&lost.unwrap_err()),
            Some(&StoreError::NoMatch {
                amount: 50000,
                note: "xăng".to_string()
            })
        );
        assert_eq!(store.counts().deletes, 1);
        assert_eq!(store.rows("09/2025").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_invalidates_the_month() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);

        ledger.snapshot(month()).await.unwrap();
        ledger
            .delete(month(), Amount::new(50000), "ăn trưa")
            .await
            .unwrap();
        let rows = ledger.snapshot(month()).await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn test_sort_orders_rows_and_keeps_header() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);

        let sorted = ledger.sort(month()).await.unwrap();
        assert_eq!(sorted, 3);

        let rows = store.rows("09/2025").unwrap();
        assert_eq!(rows[0][0], "Date");
        assert_eq!(rows[1][3], "xăng");
        assert_eq!(rows[2][3], "ăn tối");
        assert_eq!(rows[3][3], "ăn trưa");
        assert_eq!(store.counts().overwrites, 1);
    }

    #[tokio::test]
    async fn test_sort_bypasses_cache() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);

        ledger.snapshot(month()).await.unwrap();
        ledger.sort(month()).await.unwrap();
        // One read for the snapshot, one for the sort itself.
        assert_eq!(store.counts().reads, 2);
    }

    #[tokio::test]
    async fn test_sort_puts_unparsable_rows_first() {
        let store = MemoryStore::new();
        let mut rows = vec![HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        rows.push(entry(5, 12, 50000, "ăn trưa").to_row());
        rows.push(vec!["garbage".to_string()]);
        rows.push(entry(1, 8, 30000, "ăn sáng").to_row());
        store.insert_sheet(&month().to_string(), rows);
        let ledger = ledger_with(&store, TTL);

        ledger.sort(month()).await.unwrap();
        let rows = store.rows("09/2025").unwrap();
        assert_eq!(rows[1][0], "garbage");
        assert_eq!(rows[2][3], "ăn sáng");
        assert_eq!(rows[3][3], "ăn trưa");
    }

    #[tokio::test]
    async fn test_sort_missing_sheet_is_not_found() {
        let store = MemoryStore::new();
        let ledger = ledger_with(&store, TTL);
        let err = ledger.sort(month()).await.unwrap_err();
        assert_eq!(
            store_error(&err),
            Some(&StoreError::NotFound("09/2025".to_string()))
        );
    }

    #[tokio::test]
    async fn test_entries_missing_sheet_is_empty() {
        let store = MemoryStore::new();
        let ledger = ledger_with(&store, TTL);
        assert!(ledger.entries(month()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_skip_header() {
        let store = seeded_store();
        let ledger = ledger_with(&store, TTL);
        let entries = ledger.entries(month()).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].note(), "ăn trưa");
    }
}
