use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use common::money::{self, AmountOverflow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Storage format of `expenses.spent_at`; sorts lexicographically in time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Expense {
    pub id: i64,
    #[serde(with = "common::money::amount")]
    pub amount: i64, // Cents
    pub category: String,
    pub date: NaiveDateTime, // Local time
}

impl Expense {
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn month(&self) -> String {
        common::calendar::month_key(self.date.date())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RawCreateExpenseRequest {
    #[validate(
        required(message = "Amount and category are required"),
        range(exclusive_min = 0.0, message = "Amount must be a positive number")
    )]
    pub amount: Option<f64>,
    #[validate(
        required(message = "Amount and category are required"),
        length(min = 1, message = "Amount and category are required")
    )]
    pub category: Option<String>,
    pub date: Option<String>,
}

// Private fields: once built through `new`, the request is valid.
#[derive(Debug)]
pub struct CreateExpenseRequest {
    amount: i64,
    category: String,
    spent_at: NaiveDateTime,
}

impl CreateExpenseRequest {
    pub fn new(
        amount: f64,
        category: &str,
        date: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Self, String> {
        let category = category.trim();
        if category.is_empty() {
            return Err("Amount and category are required".to_string());
        }

        if !amount.is_finite() {
            return Err("Amount must be a positive number".to_string());
        }
        let amount = common::money::to_cents(amount)
            .ok_or_else(|| common::money::AmountOverflow.to_string())?;
        if amount <= 0 {
            return Err("Amount must be a positive number".to_string());
        }

        let spent_at = parse_expense_date(date, now)?;

        Ok(Self {
            amount,
            category: category.to_string(),
            spent_at,
        })
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn spent_at(&self) -> NaiveDateTime {
        self.spent_at
    }

    pub fn month(&self) -> String {
        common::calendar::month_key(self.spent_at.date())
    }
}

/// Resolves the optional client-supplied date. Absent means `now`; a bare day means
/// midnight of that day; RFC 3339 input is converted to local time.
///
/// Only four-digit years are accepted, so stored timestamps keep sorting in time order.
pub fn parse_expense_date(raw: Option<&str>, now: NaiveDateTime) -> Result<NaiveDateTime, String> {
    let parsed = parse_date_input(raw, now)?;
    if !(0..=9999).contains(&parsed.year()) {
        return Err("Date year must be between 0000 and 9999".to_string());
    }
    Ok(parsed)
}

fn parse_date_input(raw: Option<&str>, now: NaiveDateTime) -> Result<NaiveDateTime, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(truncate_to_seconds(now)),
        Some(raw) => raw,
    };

    if let Some(day) = common::calendar::parse_day(raw) {
        return Ok(day.and_time(chrono::NaiveTime::MIN));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        TIMESTAMP_FORMAT,
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(truncate_to_seconds(dt));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(truncate_to_seconds(dt.with_timezone(&Local).naive_local()));
    }

    Err("Invalid date format, expected YYYY-MM-DD".to_string())
}

fn truncate_to_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Running aggregate of one calendar month, maintained incrementally as expenses
/// are added and removed.
///
/// `total_spent` equals the sum of `by_category`, and no category is kept at zero.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct MonthlySummary {
    pub month: String, // YYYY-MM
    #[serde(with = "common::money::amount")]
    pub total_spent: i64,
    #[serde(with = "common::money::amount_map")]
    pub by_category: BTreeMap<String, i64>,
}

impl MonthlySummary {
    /// Summary created lazily by the first expense of a month.
    pub fn opened_with(month: String, amount: i64, category: &str) -> Self {
        let mut by_category = BTreeMap::new();
        by_category.insert(category.to_string(), amount);
        Self {
            month,
            total_spent: amount,
            by_category,
        }
    }

    /// Adds one expense. On overflow the summary is left untouched.
    pub fn record_expense(&mut self, amount: i64, category: &str) -> Result<(), AmountOverflow> {
        let total = money::checked_add(self.total_spent, amount)?;
        let subtotal = money::checked_add(self.by_category.get(category).copied().unwrap_or(0), amount)?;

        self.total_spent = total;
        self.by_category.insert(category.to_string(), subtotal);
        Ok(())
    }

    /// Removes one expense's contribution. Categories reaching zero (or below) are
    /// dropped and the total is floored at zero.
    pub fn reverse_expense(&mut self, amount: i64, category: &str) {
        self.total_spent -= amount;

        if let Some(subtotal) = self.by_category.get_mut(category) {
            *subtotal -= amount;
            if *subtotal <= 0 {
                self.by_category.remove(category);
            }
        }

        if self.total_spent < 0 {
            self.total_spent = 0;
        }
    }

    pub fn category_total(&self) -> i64 {
        self.by_category.values().sum()
    }
}

/// Totals recomputed straight from expense records, independent of the summaries.
#[derive(Debug, Serialize, PartialEq, Default)]
pub struct SpendingTotals {
    #[serde(with = "common::money::amount")]
    pub total_spent: i64,
    #[serde(with = "common::money::amount_map")]
    pub by_category: BTreeMap<String, i64>,
}

impl SpendingTotals {
    pub fn from_expenses(expenses: &[Expense]) -> Result<Self, AmountOverflow> {
        let mut totals = Self::default();
        for e in expenses {
            totals.total_spent = money::checked_add(totals.total_spent, e.amount)?;
            let subtotal = totals.by_category.entry(e.category.clone()).or_insert(0);
            *subtotal = money::checked_add(*subtotal, e.amount)?;
        }
        Ok(totals)
    }
}
