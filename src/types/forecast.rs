use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Covariates;

/// User input for one forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastQuery {
    pub query_date: NaiveDate,
    /// Trend model weight, intended for [0, 1]
    pub alpha: f64,
}

impl ForecastQuery {
    /// Parse a `YYYY-MM-DD` date and check that alpha is a usable number.
    ///
    /// Alpha outside [0, 1] is accepted and extrapolates the blend; only
    /// NaN and infinities are rejected.
    pub fn parse(date: &str, alpha: f64) -> Result<Self, String> {
        let query_date = parse_date(date)?;
        if !alpha.is_finite() {
            return Err(format!("alpha must be a finite number, got {}", alpha));
        }
        Ok(Self { query_date, alpha })
    }

    pub fn alpha_in_unit_range(&self) -> bool {
        (0.0..=1.0).contains(&self.alpha)
    }
}

/// Parse a calendar date as entered by a user
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    let trimmed = input.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD", input))
}

/// Query date mapped onto the model horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub target_date: NaiveDate,
    /// Whole days from the training cutoff to the target date, may be negative
    pub days_diff: i64,
    pub steps_ahead: usize,
    pub crisis_period: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub query_date: NaiveDate,
    pub target_date: NaiveDate,
    pub days_diff: i64,
    pub steps_ahead: usize,
    /// Computed for the target date; not fed to the trend model
    pub crisis_period: bool,
    /// Bias-corrected trend model forecast
    pub trend_forecast: f64,
    pub autoregressive_forecast: f64,
    pub ensemble_forecast: f64,
    pub alpha: f64,
}

/// Result of the display-only covariate lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CovariateLookup {
    Available { date: NaiveDate, values: Covariates },
    NotAvailable { date: NaiveDate },
}

impl CovariateLookup {
    pub fn values(&self) -> Option<&Covariates> {
        match self {
            CovariateLookup::Available { values, .. } => Some(values),
            CovariateLookup::NotAvailable { .. } => None,
        }
    }
}
