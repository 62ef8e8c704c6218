//! The chitieu library: a conversational expense tracker backed by monthly Google
//! Sheet tabs.
//!
//! The [`Ledger`] is the heart of the crate: it owns a [`SheetStore`] (Google or
//! in-memory) and a per-month TTL cache, and exposes the log/delete/sort/summary
//! operations the command layer is built on.

pub mod api;
pub mod args;
mod cache;
pub mod commands;
mod config;
mod error;
mod ledger;
pub mod model;
pub mod parse;
mod utils;

pub use api::{store, Mode, SheetStore};
pub use config::Config;
pub use error::{store_error, Error, Result, StoreError};
pub use ledger::Ledger;
