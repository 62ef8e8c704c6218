//! Access to the remote tabular store holding the monthly expense sheets.
//!
//! The [`SheetStore`] trait is the capability surface the rest of the app consumes:
//! row-level read/append/delete/overwrite against a sheet named by its month key.
//! [`GoogleStore`] implements it against the Google Sheets API; [`MemoryStore`] is an
//! in-memory implementation that is compiled even in the "production" version of this
//! app so that the whole thing can run top-to-bottom without touching Google.

mod google;
mod memory;
mod oauth;

use crate::{Config, Result};

pub use memory::MemoryStore;
pub use oauth::TokenProvider;

pub(crate) use google::GoogleStore;

/// The environment variable that switches the app into test mode.
pub const IN_TEST_MODE: &str = "CHITIEU_IN_TEST_MODE";

/// Row-level operations on the remote store.
///
/// `position` arguments are zero-based indices into the ordered row sequence most
/// recently returned by `read_rows` for the same sheet, header row included.
#[async_trait::async_trait]
pub trait SheetStore: Send {
    /// Returns every row of the named sheet, in sheet order, header row first.
    /// Fails with `StoreError::NotFound` when no backing sheet exists.
    async fn read_rows(&mut self, sheet_id: &str) -> Result<Vec<Vec<String>>>;

    /// Appends one row after the last row with data, creating the sheet (with a header
    /// row) if it does not exist yet.
    async fn append_row(&mut self, sheet_id: &str, row: &[String]) -> Result<()>;

    /// Deletes the row at `position`.
    async fn delete_row(&mut self, sheet_id: &str, position: usize) -> Result<()>;

    /// Replaces the entire contents of the sheet with `rows`.
    async fn overwrite_rows(&mut self, sheet_id: &str, rows: &[Vec<String>]) -> Result<()>;

    /// The number of rows in the sheet. Implementations may answer this more cheaply
    /// than a full read; the default falls back to `read_rows().len()`.
    async fn row_count(&mut self, sheet_id: &str) -> Result<usize> {
        Ok(self.read_rows(sheet_id).await?.len())
    }
}

/// Whether to use the real Google Sheets backend or the in-memory one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    /// This allows for testing the program without hitting the Google APIs. When
    /// `CHITIEU_IN_TEST_MODE` is set and non-zero in length, the mode will be
    /// `Mode::Test`, otherwise it will be `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(IN_TEST_MODE) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the store appropriate for `mode`.
pub async fn store(config: &Config, mode: Mode) -> Result<Box<dyn SheetStore>> {
    match mode {
        Mode::Google => {
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path()).await?;
            Ok(Box::new(
                GoogleStore::new(config.clone(), token_provider).await?,
            ))
        }
        Mode::Test => Ok(Box::new(MemoryStore::with_seed_data())),
    }
}
