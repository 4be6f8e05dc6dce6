//! Dashboard insights derived from whatever expenses the caller has loaded.
//!
//! The month comparison reads the monthly summaries, so it covers whole months.
//! Every `loaded_window_*` figure, the top category and the most expensive day
//! only see the loaded window (one day, one month, or everything) and are
//! reported together with that window.

use chrono::NaiveDate;
use common::money::{self, format_amount, AmountOverflow};
use expenses::models::{Expense, MonthlySummary, SpendingTotals};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Which expenses an insight calculation was fed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum InsightWindow {
    Day { date: NaiveDate },
    Month { month: String },
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonthComparison {
    /// Neither month has any spend.
    NoData,
    /// Current month has spend, the previous one has none.
    NoPreviousMonth,
    More {
        #[serde(with = "money::amount")]
        difference: i64,
    },
    Less {
        #[serde(with = "money::amount")]
        difference: i64,
    },
    Same,
}

impl MonthComparison {
    pub fn compare(current: i64, previous: i64) -> Self {
        if current == 0 && previous == 0 {
            return MonthComparison::NoData;
        }
        if previous == 0 {
            return MonthComparison::NoPreviousMonth;
        }

        let diff = current - previous;
        if diff > 0 {
            MonthComparison::More { difference: diff }
        } else if diff < 0 {
            MonthComparison::Less { difference: -diff }
        } else {
            MonthComparison::Same
        }
    }
}

impl fmt::Display for MonthComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthComparison::NoData => write!(f, "No spending data yet"),
            MonthComparison::NoPreviousMonth => write!(f, "No previous month data"),
            MonthComparison::More { difference } => {
                write!(f, "{} more than last month", format_amount(*difference))
            }
            MonthComparison::Less { difference } => {
                write!(f, "{} less than last month", format_amount(*difference))
            }
            MonthComparison::Same => write!(f, "Same as last month"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySpend {
    pub day: NaiveDate,
    #[serde(with = "money::amount")]
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    #[serde(with = "money::amount")]
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub window: InsightWindow,
    pub month: String,
    pub previous_month: String,
    #[serde(with = "money::amount")]
    pub month_total: i64,
    #[serde(with = "money::amount")]
    pub previous_month_total: i64,
    pub comparison: MonthComparison,
    pub comparison_message: String,
    #[serde(with = "money::amount")]
    pub loaded_window_total: i64,
    #[serde(with = "money::amount_map")]
    pub loaded_window_by_category: BTreeMap<String, i64>,
    pub top_category: Option<CategorySpend>,
    /// Distinct calendar days present in the loaded window.
    pub loaded_window_days: usize,
    /// Average spend per day present in the loaded window; not a whole-month figure.
    #[serde(with = "money::optional_amount")]
    pub loaded_window_daily_average: Option<i64>,
    pub most_expensive_day: Option<DaySpend>,
}

pub fn daily_totals(expenses: &[Expense]) -> Result<BTreeMap<NaiveDate, i64>, AmountOverflow> {
    let mut totals = BTreeMap::new();
    for e in expenses {
        let total = totals.entry(e.day()).or_insert(0);
        *total = money::checked_add(*total, e.amount)?;
    }
    Ok(totals)
}

pub fn loaded_window_daily_average(
    totals: &BTreeMap<NaiveDate, i64>,
) -> Result<Option<i64>, AmountOverflow> {
    if totals.is_empty() {
        return Ok(None);
    }
    let sum = money::checked_sum(totals.values().copied())?;
    Ok(Some(money::round_cents(sum as f64 / totals.len() as f64)?))
}

/// Category with the largest spend; on a tie the alphabetically first name wins.
pub fn top_category(by_category: &BTreeMap<String, i64>) -> Option<CategorySpend> {
    let mut best: Option<CategorySpend> = None;
    for (category, total) in by_category {
        if *total <= 0 {
            continue;
        }
        if best.as_ref().is_none_or(|b| *total > b.total) {
            best = Some(CategorySpend {
                category: category.clone(),
                total: *total,
            });
        }
    }
    best
}

/// Highest-spend day; on a tie the earliest date wins.
pub fn most_expensive_day(totals: &BTreeMap<NaiveDate, i64>) -> Option<DaySpend> {
    let mut best: Option<DaySpend> = None;
    // BTreeMap iterates in date order, so keeping only strict improvements keeps the earliest.
    for (day, total) in totals {
        if *total <= 0 {
            continue;
        }
        if best.as_ref().is_none_or(|b| *total > b.total) {
            best = Some(DaySpend { day: *day, total: *total });
        }
    }
    best
}

fn total_for(summaries: &[MonthlySummary], month: &str) -> i64 {
    summaries
        .iter()
        .find(|s| s.month == month)
        .map(|s| s.total_spent)
        .unwrap_or(0)
}

pub fn summarize(
    window: InsightWindow,
    expenses: &[Expense],
    summaries: &[MonthlySummary],
    month: &str,
    previous_month: &str,
) -> Result<Insights, AmountOverflow> {
    let month_total = total_for(summaries, month);
    let previous_month_total = total_for(summaries, previous_month);
    let comparison = MonthComparison::compare(month_total, previous_month_total);

    let totals = daily_totals(expenses)?;
    let window_totals = SpendingTotals::from_expenses(expenses)?;

    Ok(Insights {
        window,
        month: month.to_string(),
        previous_month: previous_month.to_string(),
        month_total,
        previous_month_total,
        comparison_message: comparison.to_string(),
        comparison,
        loaded_window_total: window_totals.total_spent,
        top_category: top_category(&window_totals.by_category),
        loaded_window_by_category: window_totals.by_category,
        loaded_window_days: totals.len(),
        loaded_window_daily_average: loaded_window_daily_average(&totals)?,
        most_expensive_day: most_expensive_day(&totals),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn expense(id: i64, amount: i64, at: &str) -> Expense {
        spent_on(id, amount, "Food", at)
    }

    fn spent_on(id: i64, amount: i64, category: &str, at: &str) -> Expense {
        Expense {
            id,
            amount,
            category: category.into(),
            date: NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_comparison_more() {
        let c = MonthComparison::compare(120000, 100000);
        assert_eq!(c, MonthComparison::More { difference: 20000 });
        assert_eq!(c.to_string(), "200 more than last month");
    }

    #[test]
    fn test_comparison_less_and_same() {
        assert_eq!(MonthComparison::compare(80050, 100000).to_string(), "199.50 less than last month");
        assert_eq!(MonthComparison::compare(500, 500).to_string(), "Same as last month");
    }

    #[test]
    fn test_no_data_is_distinct_from_zero_delta() {
        let none = MonthComparison::compare(0, 0);
        assert_eq!(none, MonthComparison::NoData);
        assert_eq!(none.to_string(), "No spending data yet");
        assert_ne!(none, MonthComparison::Same);

        assert_eq!(MonthComparison::compare(700, 0), MonthComparison::NoPreviousMonth);
        assert_eq!(MonthComparison::compare(700, 0).to_string(), "No previous month data");
    }

    #[test]
    fn test_current_zero_with_previous_spend_is_less() {
        assert_eq!(MonthComparison::compare(0, 1000), MonthComparison::Less { difference: 1000 });
    }

    #[test]
    fn test_daily_average_uses_loaded_days_only() {
        let expenses = vec![
            expense(1, 1000, "2026-10-01 09:00:00"),
            expense(2, 500, "2026-10-01 19:00:00"),
            expense(3, 1000, "2026-10-05 12:00:00"),
        ];
        let totals = daily_totals(&expenses).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(loaded_window_daily_average(&totals), Ok(Some(1250)));
        assert_eq!(loaded_window_daily_average(&BTreeMap::new()), Ok(None));
    }

    #[test]
    fn test_most_expensive_day_ties_go_to_earliest() {
        let expenses = vec![
            expense(1, 900, "2026-10-09 09:00:00"),
            expense(2, 900, "2026-10-02 09:00:00"),
            expense(3, 300, "2026-10-05 09:00:00"),
        ];
        let best = most_expensive_day(&daily_totals(&expenses).unwrap()).unwrap();
        assert_eq!(best.day, day("2026-10-02"));
        assert_eq!(best.total, 900);

        assert_eq!(most_expensive_day(&BTreeMap::new()), None);
    }

    #[test]
    fn test_summarize() {
        let expenses = vec![
            expense(1, 2000, "2026-10-17 09:00:00"),
            expense(2, 1000, "2026-10-17 10:00:00"),
        ];
        let current = MonthlySummary::opened_with("2026-10".into(), 120000, "Rent");
        let previous = MonthlySummary::opened_with("2026-09".into(), 100000, "Rent");

        let insights = summarize(
            InsightWindow::Day { date: day("2026-10-17") },
            &expenses,
            &[previous, current],
            "2026-10",
            "2026-09",
        )
        .unwrap();

        assert_eq!(insights.comparison_message, "200 more than last month");
        assert_eq!(insights.loaded_window_days, 1);
        assert_eq!(insights.loaded_window_daily_average, Some(3000));
        assert_eq!(insights.most_expensive_day.unwrap().total, 3000);
        assert_eq!(insights.loaded_window_total, 3000);

        let json = serde_json::to_value(
            summarize(InsightWindow::All, &[], &[], "2026-10", "2026-09").unwrap(),
        )
        .unwrap();
        assert_eq!(json["window"]["scope"], "all");
        assert_eq!(json["comparison"]["kind"], "no_data");
        assert!(json["loaded_window_daily_average"].is_null());
        assert!(json["most_expensive_day"].is_null());
        assert_eq!(json["loaded_window_total"], 0.0);
        assert!(json["loaded_window_by_category"].as_object().unwrap().is_empty());
        assert!(json["top_category"].is_null());
    }

    #[test]
    fn test_window_total_and_categories() {
        let expenses = vec![
            spent_on(1, 1500, "Food", "2026-10-01 09:00:00"),
            spent_on(2, 4000, "Rent", "2026-10-02 09:00:00"),
            spent_on(3, 2500, "Food", "2026-10-03 09:00:00"),
            spent_on(4, 250, "Bus", "2026-10-03 18:00:00"),
        ];

        let insights = summarize(InsightWindow::All, &expenses, &[], "2026-10", "2026-09").unwrap();
        assert_eq!(insights.loaded_window_total, 8250);
        assert_eq!(insights.loaded_window_by_category["Food"], 4000);
        assert_eq!(insights.loaded_window_by_category["Rent"], 4000);
        assert_eq!(insights.loaded_window_by_category["Bus"], 250);

        // Food and Rent tie at 40; the alphabetically first wins.
        let top = insights.top_category.unwrap();
        assert_eq!(top.category, "Food");
        assert_eq!(top.total, 4000);

        let json = serde_json::to_value(
            summarize(InsightWindow::All, &expenses[1..2], &[], "2026-10", "2026-09").unwrap(),
        )
        .unwrap();
        assert_eq!(json["top_category"]["category"], "Rent");
        assert_eq!(json["top_category"]["total"], 40.0);
        assert_eq!(json["loaded_window_by_category"]["Rent"], 40.0);
    }

    #[test]
    fn test_window_overflow() {
        let expenses = vec![
            spent_on(1, i64::MAX, "Food", "2026-10-01 09:00:00"),
            spent_on(2, 1, "Bus", "2026-10-01 10:00:00"),
        ];
        assert_eq!(daily_totals(&expenses), Err(AmountOverflow));
        assert_eq!(
            summarize(InsightWindow::All, &expenses, &[], "2026-10", "2026-09"),
            Err(AmountOverflow)
        );
    }
}
