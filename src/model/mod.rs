//! Data model: entries, amounts, categories and month sheet keys.

mod amount;
mod category;
mod entry;
mod month;

pub use amount::Amount;
pub use category::Category;
pub use entry::{Entry, HEADER};
pub use month::MonthKey;
