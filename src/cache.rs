//! A TTL cache over the row snapshots of monthly sheets.
//!
//! Each month gets its own slot, and each slot carries its own async lock. Holding a
//! slot's lock across a read-modify-write gives mutual exclusion per sheet without
//! serializing operations on unrelated months.

use crate::model::MonthKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub(crate) struct SheetCache {
    ttl: Duration,
    slots: Mutex<HashMap<MonthKey, Arc<tokio::sync::Mutex<Slot>>>>,
}

impl SheetCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The slot for `month`, created empty on first use. The returned handle must be
    /// locked before the slot's snapshot is consulted or changed.
    pub(crate) fn slot(&self, month: MonthKey) -> Arc<tokio::sync::Mutex<Slot>> {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(month).or_default())
    }

    pub(crate) fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// The cached state of one monthly sheet.
#[derive(Default)]
pub(crate) struct Slot {
    snapshot: Option<(Vec<Vec<String>>, Instant)>,
}

impl Slot {
    /// The cached rows, if they were recorded within `ttl` ago.
    pub(crate) fn fresh(&self, ttl: Duration) -> Option<&Vec<Vec<String>>> {
        match &self.snapshot {
            Some((rows, at)) if at.elapsed() < ttl => Some(rows),
            _ => None,
        }
    }

    /// Records a snapshot just fetched from the store.
    pub(crate) fn record(&mut self, rows: Vec<Vec<String>>) {
        self.snapshot = Some((rows, Instant::now()));
    }

    /// Drops the snapshot so the next read goes to the store.
    pub(crate) fn clear(&mut self) {
        self.snapshot = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
