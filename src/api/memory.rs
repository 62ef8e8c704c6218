//! Implements the `SheetStore` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can
//! run the whole app, top-to-bottom, without using Google Sheets.

use crate::api::SheetStore;
use crate::error::StoreError;
use crate::model::{MonthKey, HEADER};
use crate::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

/// An implementation of the `SheetStore` trait that does not use Google Sheets. It can
/// hold any data in memory and, by default, is seeded with some existing data.
///
/// Clones share the same underlying state, so a test can keep a handle and inspect the
/// sheets after handing a clone to the rest of the app. Every trait call is counted,
/// and reads or writes can be made to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    sheets: HashMap<String, Vec<Vec<String>>>,
    counts: CallCounts,
    fail_reads: bool,
    fail_writes: bool,
}

/// How many times each `SheetStore` operation has been invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub reads: usize,
    pub appends: usize,
    pub deletes: usize,
    pub overwrites: usize,
}

impl MemoryStore {
    /// Creates an empty store with no sheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with expense rows for the current and previous months.
    pub fn with_seed_data() -> Self {
        let store = Self::new();
        let this_month = MonthKey::from_datetime(Utc::now().fixed_offset());
        store.insert_sheet(&this_month.to_string(), seed_sheet(this_month));
        let last_month = this_month.offset(-1);
        store.insert_sheet(&last_month.to_string(), seed_sheet(last_month));
        store
    }

    /// Replaces the named sheet with `rows`, creating it if needed. Does not count as
    /// a write.
    pub fn insert_sheet(&self, sheet_id: &str, rows: Vec<Vec<String>>) {
        self.state().sheets.insert(sheet_id.to_string(), rows);
    }

    /// The current rows of the named sheet, if it exists. Does not count as a read.
    pub fn rows(&self, sheet_id: &str) -> Option<Vec<Vec<String>>> {
        self.state().sheets.get(sheet_id).cloned()
    }

    /// The number of times each operation has been invoked so far.
    pub fn counts(&self) -> CallCounts {
        self.state().counts
    }

    /// When set, `read_rows` fails with `StoreError::Read`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    /// When set, every mutating operation fails with `StoreError::Write`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl SheetStore for MemoryStore {
    async fn read_rows(&mut self, sheet_id: &str) -> Result<Vec<Vec<String>>> {
        let mut state = self.state();
        state.counts.reads += 1;
        if state.fail_reads {
            return Err(StoreError::Read(sheet_id.to_string()).into());
        }
        state
            .sheets
            .get(sheet_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(sheet_id.to_string()).into())
    }

    async fn append_row(&mut self, sheet_id: &str, row: &[String]) -> Result<()> {
        let mut state = self.state();
        state.counts.appends += 1;
        if state.fail_writes {
            return Err(StoreError::Write(sheet_id.to_string()).into());
        }
        let sheet = state
            .sheets
            .entry(sheet_id.to_string())
            .or_insert_with(|| vec![HEADER.iter().map(|s| s.to_string()).collect()]);
        sheet.push(row.to_vec());
        Ok(())
    }

    async fn delete_row(&mut self, sheet_id: &str, position: usize) -> Result<()> {
        let mut state = self.state();
        state.counts.deletes += 1;
        if state.fail_writes {
            return Err(StoreError::Write(sheet_id.to_string()).into());
        }
        let sheet = state
            .sheets
            .get_mut(sheet_id)
            .ok_or_else(|| StoreError::NotFound(sheet_id.to_string()))?;
        if position >= sheet.len() {
            return Err(StoreError::Write(sheet_id.to_string()).into());
        }
        sheet.remove(position);
        Ok(())
    }

    async fn overwrite_rows(&mut self, sheet_id: &str, rows: &[Vec<String>]) -> Result<()> {
        let mut state = self.state();
        state.counts.overwrites += 1;
        if state.fail_writes {
            return Err(StoreError::Write(sheet_id.to_string()).into());
        }
        state.sheets.insert(sheet_id.to_string(), rows.to_vec());
        Ok(())
    }
}

/// Builds the rows of a seeded month sheet, header included. The seed data carries
/// only day numbers; the full `dd/mm` dates are stamped with the sheet's month.
fn seed_sheet(month: MonthKey) -> Vec<Vec<String>> {
    let mut rows = vec![HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
    for seed in load_csv(SEED_DATA).unwrap() {
        let (day, rest) = seed.split_first().unwrap();
        let mut row = vec![format!("{day}/{:02}", month.month())];
        row.extend(rest.iter().cloned());
        rows.push(row);
    }
    rows
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let bytes = csv_data.as_bytes();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(Cursor::new(bytes));

    let mut rows: Vec<Vec<String>> = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let row: Vec<String> = record.iter().map(|field| field.to_string()).collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Seed expense data: day of month, time, amount, note, category.
const SEED_DATA: &str = r##"02,07:45:00,30000,ăn sáng,food
02,12:10:00,55000,ăn trưa,food
03,08:02:00,50000,xăng xe,gas
05,19:30:00,120000,ăn tối với bạn,food
07,09:15:00,45000,cafe,dating
08,18:00:00,80000,grab về nhà,gas
10,10:00:00,4000000,thuê nhà,rent
12,14:20:00,200000,quà sinh nhật,dating
15,11:00:00,1000000,mua chứng chỉ quỹ,investment
20,16:40:00,65000,ăn vặt,food
"##;
