use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Budget {
    pub month: String, // YYYY-MM
    #[serde(with = "common::money::amount")]
    pub amount: i64, // Cents
}

#[derive(Debug, Deserialize, Validate)]
pub struct RawSetBudgetRequest {
    #[validate(
        required(message = "Budget amount must be a positive number"),
        range(min = 0.0, message = "Budget amount must be a positive number")
    )]
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SetBudgetRequest {
    month: String,
    amount: i64,
}

impl SetBudgetRequest {
    pub fn new(month: String, amount: f64) -> Result<Self, String> {
        if !amount.is_finite() || amount < 0.0 {
            return Err("Budget amount must be a positive number".to_string());
        }

        if common::calendar::parse_month(&month).is_none() {
            return Err("Invalid month format. Expected YYYY-MM".to_string());
        }

        let amount = common::money::to_cents(amount)
            .ok_or_else(|| "Budget amount is too large".to_string())?;

        Ok(Self { month, amount })
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }
}

/// Budget target next to what the month's summary says has been spent.
#[derive(Debug, Serialize, PartialEq)]
pub struct BudgetOverview {
    pub month: String,
    #[serde(with = "common::money::amount")]
    pub budget: i64,
    #[serde(with = "common::money::amount")]
    pub spent: i64,
}
