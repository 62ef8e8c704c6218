//! Error handling for chitieu.
//!
//! General plumbing uses `anyhow` like the rest of the codebase. The data-access layer
//! additionally tags its failures with a [`StoreError`] so that callers (the CLI today, a
//! chat router tomorrow) can branch on the kind of failure with `downcast_ref`.

use thiserror::Error;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The failure kinds surfaced by the sheet data-access layer.
///
/// These are attached as context on the `anyhow` chain, so the underlying remote error is
/// preserved while the kind stays recoverable via `err.downcast_ref::<StoreError>()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The month sheet has no backing table in the remote store.
    #[error("no sheet exists for '{0}'")]
    NotFound(String),

    /// A delete request matched no row by amount + note.
    #[error("no entry matches {amount} VND '{note}'")]
    NoMatch { amount: i64, note: String },

    /// A remote fetch failed. The cache is left untouched when this occurs.
    #[error("failed to read rows from sheet '{0}'")]
    Read(String),

    /// A remote mutation failed. No invalidation happens when this occurs.
    #[error("remote write to sheet '{0}' failed")]
    Write(String),
}

/// Returns the `StoreError` anywhere in an error's chain, if present. This finds the
/// kind whether it is the root error or was attached as context.
pub fn store_error(err: &Error) -> Option<&StoreError> {
    err.downcast_ref::<StoreError>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_store_error_survives_context() {
        let inner: Result<()> = Err(anyhow::anyhow!("http 503"));
        let err = inner
            .context(StoreError::Write("09/2025".to_string()))
            .context("appending entry")
            .unwrap_err();
        assert_eq!(
            store_error(&err),
            Some(&StoreError::Write("09/2025".to_string()))
        );
    }

    #[test]
    fn test_no_match_display() {
        let e = StoreError::NoMatch {
            amount: 50000,
            note: "xăng".to_string(),
        };
        assert_eq!(e.to_string(), "no entry matches 50000 VND 'xăng'");
    }
}
