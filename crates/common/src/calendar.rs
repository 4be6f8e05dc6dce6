//! Calendar helpers shared by every domain crate.
//!
//! Months are keyed by `YYYY-MM` strings everywhere (database rows, JSON, lookups).

use chrono::{Datelike, Months, NaiveDate};

pub const MONTH_FORMAT: &str = "%Y-%m";
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// `YYYY-MM` key of the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    date.format(MONTH_FORMAT).to_string()
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parses a `YYYY-MM` key into the first day of that month.
pub fn parse_month(month: &str) -> Option<NaiveDate> {
    if month.len() != 7 || month.chars().nth(4) != Some('-') {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{}-01", month), DAY_FORMAT).ok()
}

pub fn parse_day(day: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(day.trim(), DAY_FORMAT).ok()
}

/// Key of the month before `month`, or `None` if `month` is not a valid key.
pub fn previous_month(month: &str) -> Option<String> {
    let first = parse_month(month)?;
    let prev = first.checked_sub_months(Months::new(1))?;
    Some(month_key(prev))
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_day_of_month(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => next.signed_duration_since(first).num_days() as u32,
        None => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_key_is_zero_padded() {
        assert_eq!(month_key(day(2026, 3, 15)), "2026-03");
        assert_eq!(month_key(day(2026, 12, 1)), "2026-12");
    }

    #[test]
    fn test_previous_month_wraps_year() {
        assert_eq!(previous_month("2026-01").as_deref(), Some("2025-12"));
        assert_eq!(previous_month("2026-07").as_deref(), Some("2026-06"));
        assert_eq!(previous_month("not-a-month"), None);
    }

    #[test]
    fn test_parse_month_rejects_bad_formats() {
        assert_eq!(parse_month("2026-02"), Some(day(2026, 2, 1)));
        assert_eq!(parse_month("2026-13"), None);
        assert_eq!(parse_month("2026-2"), None);
        assert_eq!(parse_month("202602"), None);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(day(2026, 1, 20)), 31);
        assert_eq!(days_in_month(day(2026, 2, 1)), 28);
        assert_eq!(days_in_month(day(2028, 2, 29)), 29);
        assert_eq!(days_in_month(day(2026, 4, 30)), 30);
        assert_eq!(days_in_month(day(2026, 12, 31)), 31);
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day(" 2026-10-17 "), Some(day(2026, 10, 17)));
        assert_eq!(parse_day("17/10/2026"), None);
    }
}
