//! Month-end spend projection.
//!
//! A straight-line extrapolation of the month-to-date spend rate: no weekday
//! weighting, seasonality or outlier handling.

use common::money::{self, AmountOverflow};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    InsufficientData,
    ExceedsBudget,
    WithinBudget,
    NoBudget,
}

impl ForecastStatus {
    pub fn message(&self) -> &'static str {
        match self {
            ForecastStatus::InsufficientData => "Not enough data to forecast yet",
            ForecastStatus::ExceedsBudget => "At this rate, you may exceed your monthly budget",
            ForecastStatus::WithinBudget => "At this rate, you are within your budget",
            ForecastStatus::NoBudget => "At this rate, spending looks normal",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastInput {
    pub spent_so_far: i64, // Cents
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub budget: Option<i64>, // Cents
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Forecast {
    /// Projected month-end total, rounded to whole currency units.
    #[serde(with = "common::money::amount")]
    pub forecast: i64,
    pub message: String,
    pub status: ForecastStatus,
    #[serde(with = "common::money::amount")]
    pub spent_so_far: i64,
    #[serde(with = "common::money::optional_amount")]
    pub daily_average: Option<i64>,
    pub days_elapsed: u32,
    pub days_in_month: u32,
    #[serde(with = "common::money::optional_amount")]
    pub budget: Option<i64>,
}

/// Fails only when the projection does not fit in `i64` cents.
pub fn project(input: &ForecastInput) -> Result<Forecast, AmountOverflow> {
    // A zero budget counts as "not set".
    let budget = input.budget.filter(|b| *b > 0);

    if input.days_elapsed == 0 || input.spent_so_far <= 0 {
        let status = ForecastStatus::InsufficientData;
        return Ok(Forecast {
            forecast: 0,
            message: status.message().to_string(),
            status,
            spent_so_far: input.spent_so_far.max(0),
            daily_average: None,
            days_elapsed: input.days_elapsed,
            days_in_month: input.days_in_month,
            budget,
        });
    }

    let daily_average = money::to_amount(input.spent_so_far) / input.days_elapsed as f64;
    let forecast_units = (daily_average * input.days_in_month as f64).round();
    let forecast = money::round_cents(forecast_units * 100.0)?;

    let status = match budget {
        Some(limit) if forecast > limit => ForecastStatus::ExceedsBudget,
        Some(_) => ForecastStatus::WithinBudget,
        None => ForecastStatus::NoBudget,
    };

    Ok(Forecast {
        forecast,
        message: status.message().to_string(),
        status,
        spent_so_far: input.spent_so_far,
        daily_average: Some(money::round_cents(daily_average * 100.0)?),
        days_elapsed: input.days_elapsed,
        days_in_month: input.days_in_month,
        budget,
    })
}
