//! Summary commands: `today`, `week`, `month` and `category`.
//!
//! These are read-only and serve from the ledger's cache when it is fresh. An empty
//! or missing month is an empty summary (total 0, count 0), never an error.

use crate::commands::Out;
use crate::model::{Amount, Category, Entry, MonthKey};
use crate::{Config, Ledger, Result};
use chrono::{Datelike, Days};
use serde::Serialize;

/// The total and count of a set of entries, with the entries themselves for callers
/// that want the detail.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    month: MonthKey,
    total: Amount,
    count: usize,
    entries: Vec<Entry>,
}

impl Summary {
    fn of(month: MonthKey, entries: Vec<Entry>) -> Self {
        let total = Amount::new(entries.iter().map(|e| e.amount().vnd()).sum());
        Self {
            month,
            total,
            count: entries.len(),
            entries,
        }
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The entry lines plus a total line, for the tail of a reply message.
    fn detail(&self) -> String {
        let mut lines: Vec<String> = self.entries.iter().map(Entry::format_line).collect();
        lines.push(format!(
            "💵 Tổng: {} ({} khoản)",
            self.total.display_vnd(),
            self.count
        ));
        lines.join("\n")
    }
}

/// Summarizes the entries dated today.
pub async fn today(config: &Config, ledger: &Ledger) -> Result<Out<Summary>> {
    let now = config.now();
    let month = MonthKey::from_datetime(now);
    let date = now.date_naive();

    let entries = ledger
        .entries(month)
        .await?
        .into_iter()
        .filter(|e| e.timestamp().date() == date)
        .collect();
    let summary = Summary::of(month, entries);

    let message = if summary.count() == 0 {
        format!("📭 Hôm nay ({}) chưa có khoản chi nào", date.format("%d/%m"))
    } else {
        format!(
            "📅 Hôm nay ({}):\n{}",
            date.format("%d/%m"),
            summary.detail()
        )
    };
    Ok(Out::new(message, summary))
}

/// Summarizes the current week, Monday through Sunday. Only the current month's sheet
/// is consulted, so a week straddling a month boundary is clipped to this month.
pub async fn week(config: &Config, ledger: &Ledger) -> Result<Out<Summary>> {
    let now = config.now();
    let month = MonthKey::from_datetime(now);
    let today = now.date_naive();
    let monday = today - Days::new(today.weekday().num_days_from_monday() as u64);
    let sunday = monday + Days::new(6);

    let entries = ledger
        .entries(month)
        .await?
        .into_iter()
        .filter(|e| (monday..=sunday).contains(&e.timestamp().date()))
        .collect();
    let summary = Summary::of(month, entries);

    let range = format!("{} - {}", monday.format("%d/%m"), sunday.format("%d/%m"));
    let message = if summary.count() == 0 {
        format!("📭 Tuần này ({range}) chưa có khoản chi nào")
    } else {
        format!("📅 Tuần này ({range}):\n{}", summary.detail())
    };
    Ok(Out::new(message, summary))
}

/// Summarizes a whole month, `offset` months from the current one, with a breakdown
/// by category.
pub async fn month(config: &Config, ledger: &Ledger, offset: i32) -> Result<Out<Summary>> {
    let target = MonthKey::from_datetime(config.now()).offset(offset);
    let entries = ledger.entries(target).await?;
    let summary = Summary::of(target, entries);

    let message = if summary.count() == 0 {
        format!("📭 Chưa có khoản chi nào trong tháng {target}")
    } else {
        let mut lines = vec![format!(
            "📊 Tổng kết tháng {target}:\n💵 Tổng chi: {}\n🧾 Số khoản: {}\n\nChi tiết:",
            summary.total().display_vnd(),
            summary.count()
        )];
        for category in CATEGORY_ORDER {
            let total: i64 = summary
                .entries()
                .iter()
                .filter(|e| e.category() == category)
                .map(|e| e.amount().vnd())
                .sum();
            if total > 0 {
                lines.push(format!(
                    "{} {}: {}",
                    category.icon(),
                    category,
                    Amount::new(total).display_vnd()
                ));
            }
        }
        lines.join("\n")
    };
    Ok(Out::new(message, summary))
}

/// Summarizes one category of a month, `offset` months from the current one.
pub async fn category(
    config: &Config,
    ledger: &Ledger,
    category: Category,
    offset: i32,
) -> Result<Out<Summary>> {
    let target = MonthKey::from_datetime(config.now()).offset(offset);
    let entries = ledger
        .entries(target)
        .await?
        .into_iter()
        .filter(|e| e.category() == category)
        .collect();
    let summary = Summary::of(target, entries);

    let message = if summary.count() == 0 {
        format!(
            "📭 Chưa có khoản chi {} {} nào trong tháng {target}",
            category.icon(),
            category
        )
    } else {
        format!(
            "{} {} tháng {target}:\n{}",
            category.icon(),
            category,
            summary.detail()
        )
    };
    Ok(Out::new(message, summary))
}

/// Display order of the month breakdown.
const CATEGORY_ORDER: [Category; 7] = [
    Category::Rent,
    Category::Food,
    Category::Gas,
    Category::Dating,
    Category::Investment,
    Category::Income,
    Category::Other,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use chrono::NaiveDate;

    /// A date in a different Monday-Sunday week than `date`, in the same calendar
    /// month. Fourteen days apart can never share a Monday-Sunday window.
    fn another_week_same_month(date: NaiveDate) -> NaiveDate {
        if date.day() > 15 {
            date - Days::new(14)
        } else {
            date + Days::new(14)
        }
    }

    #[tokio::test]
    async fn test_today_sums_only_todays_entries() {
        let env = TestEnv::new().await;
        let today = env.config().now().date_naive();
        env.seed_entry_on(today, 8, 30000, "ăn sáng");
        env.seed_entry_on(today, 12, 50000, "ăn trưa");
        env.seed_entry_on(another_week_same_month(today), 9, 99000, "cafe");

        let out = super::today(env.config(), env.ledger()).await.unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.total().vnd(), 80000);
        assert_eq!(summary.count(), 2);
        assert!(out.message().contains("80,000 VND"));
        assert!(out.message().contains("2 khoản"));
    }

    #[tokio::test]
    async fn test_today_empty_is_zero_not_error() {
        let env = TestEnv::new().await;
        let out = super::today(env.config(), env.ledger()).await.unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.total().vnd(), 0);
        assert_eq!(summary.count(), 0);
        assert!(out.message().contains("chưa có khoản chi"));
    }

    #[tokio::test]
    async fn test_week_excludes_other_weeks() {
        let env = TestEnv::new().await;
        let today = env.config().now().date_naive();
        env.seed_entry_on(today, 12, 50000, "ăn trưa");
        env.seed_entry_on(another_week_same_month(today), 12, 70000, "ăn tối");

        let out = super::week(env.config(), env.ledger()).await.unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.total().vnd(), 50000);
        assert_eq!(summary.count(), 1);
    }

    #[tokio::test]
    async fn test_month_totals_everything() {
        let env = TestEnv::new().await;
        let today = env.config().now().date_naive();
        env.seed_entry_on(today, 8, 30000, "ăn sáng");
        env.seed_entry_on(another_week_same_month(today), 12, 50000, "xăng xe");

        let out = super::month(env.config(), env.ledger(), 0).await.unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.total().vnd(), 80000);
        assert_eq!(summary.count(), 2);
        // Breakdown lines for the categories that have spend.
        assert!(out.message().contains("food"));
        assert!(out.message().contains("gas"));
    }

    #[tokio::test]
    async fn test_month_with_offset_reads_other_sheet() {
        let env = TestEnv::new().await;
        let last_month = env.month().offset(-1);
        env.seed_entry_in(last_month, 5, 40000, "cafe");

        let out = super::month(env.config(), env.ledger(), -1).await.unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.month(), last_month);
        assert_eq!(summary.total().vnd(), 40000);
        assert_eq!(summary.count(), 1);
    }

    #[tokio::test]
    async fn test_category_filters_and_counts() {
        let env = TestEnv::new().await;
        let today = env.config().now().date_naive();
        env.seed_entry_on(today, 8, 30000, "ăn sáng");
        env.seed_entry_on(today, 9, 50000, "xăng xe");

        let out = super::category(env.config(), env.ledger(), Category::Gas, 0)
            .await
            .unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.total().vnd(), 50000);
        assert_eq!(summary.count(), 1);
        assert_eq!(summary.entries()[0].note(), "xăng xe");
    }

    #[tokio::test]
    async fn test_category_with_no_entries_is_zero() {
        let env = TestEnv::new().await;
        let today = env.config().now().date_naive();
        env.seed_entry_on(today, 8, 30000, "ăn sáng");

        let out = super::category(env.config(), env.ledger(), Category::Rent, 0)
            .await
            .unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.total().vnd(), 0);
        assert_eq!(summary.count(), 0);
    }

    #[tokio::test]
    async fn test_summaries_share_the_cache() {
        let env = TestEnv::new().await;
        let today = env.config().now().date_naive();
        env.seed_entry_on(today, 8, 30000, "ăn sáng");

        super::today(env.config(), env.ledger()).await.unwrap();
        super::week(env.config(), env.ledger()).await.unwrap();
        super::month(env.config(), env.ledger(), 0).await.unwrap();
        assert_eq!(env.store().counts().reads, 1);
    }
}
