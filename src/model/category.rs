//! The fixed category enumeration and keyword-based classification of notes.
//!
//! Entries carry a category cell, but free-text logging rarely states one, so we
//! classify from the note. Matching is case-insensitive; multi-word keywords match as
//! substrings while single-word keywords must match a whole token (so `an` does not
//! match inside `thanh`).

use serde::{Deserialize, Serialize};

/// Keyword tables for classifying Vietnamese expense notes.
const FOOD_KEYWORDS: &[&str] = &["ăn", "cơm", "hủ tiếu", "bánh cuốn", "uống", "nước"];
const GAS_KEYWORDS: &[&str] = &["xăng", "grab", "giao hàng", "taxi", "bus", "gửi xe"];
const DATING_KEYWORDS: &[&str] = &[
    "hẹn hò", "date", "cafe", "xem phim", "lẩu", "hải sản", "mì cay", "gà rán", "dimsum",
    "cơm gà", "pizza", "matcha", "bingsu", "kem", "phở",
];
const RENT_KEYWORDS: &[&str] = &["thuê nhà", "tiền nhà"];
const INVESTMENT_KEYWORDS: &[&str] = &[
    "chứng khoán", "cổ phiếu", "etf", "bitcoin", "btc", "ethereum", "eth", "crypto",
    "altcoin", "sol",
];
const INCOME_KEYWORDS: &[&str] = &["lương", "salary", "freelance", "thu nhập"];

/// The fixed set of expense categories.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Gas,
    Dating,
    Rent,
    Investment,
    Income,
    #[default]
    Other,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    /// Classifies a free-text note into a category by keyword lookup.
    ///
    /// The first table containing a match wins, checked in the order food, gas, dating,
    /// rent, investment, income. Notes matching nothing are `Other`.
    pub fn classify(note: &str) -> Self {
        let tables: &[(&[&str], Category)] = &[
            (FOOD_KEYWORDS, Category::Food),
            (GAS_KEYWORDS, Category::Gas),
            (DATING_KEYWORDS, Category::Dating),
            (RENT_KEYWORDS, Category::Rent),
            (INVESTMENT_KEYWORDS, Category::Investment),
            (INCOME_KEYWORDS, Category::Income),
        ];
        for (keywords, category) in tables {
            if has_keyword(note, keywords) {
                return *category;
            }
        }
        Category::Other
    }

    /// The emoji used when rendering an entry of this category in a reply.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Food => "🍽️",
            Category::Gas => "⛽",
            Category::Dating => "💕",
            Category::Rent => "🏠",
            Category::Investment => "📈",
            Category::Income => "💵",
            Category::Other => "📝",
        }
    }
}

/// True if `note` contains any of `keywords`.
///
/// Multi-word keywords match as substrings; single-word keywords must equal a
/// whitespace-delimited token.
fn has_keyword(note: &str, keywords: &[&str]) -> bool {
    let note = note.to_lowercase();
    let tokens: Vec<&str> = note.split_whitespace().collect();
    for keyword in keywords {
        let keyword = keyword.to_lowercase();
        if keyword.contains(' ') {
            if note.contains(&keyword) {
                return true;
            }
        } else if tokens.iter().any(|t| *t == keyword) {
            return true;
        }
    }
    false
}
