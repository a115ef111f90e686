use chrono::NaiveDate;
use std::fmt::Write;

use crate::types::{Covariate, CovariateLookup, ForecastResult};

/// Integer part with comma thousands separators, e.g. `98765.9` -> `98,765`
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let truncated = value.trunc() as i64;
    let digits = truncated.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if truncated < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Plain-text forecast report for the terminal
pub fn render_forecast(result: &ForecastResult, lookup: &CovariateLookup, cutoff: NaiveDate) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n=== Sales Forecast ===");
    let _ = writeln!(out, "Selected date:   {}", result.query_date);
    let _ = writeln!(out, "Forecast for:    {} (1 month earlier)", result.target_date);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Ensemble forecast: {} units",
        format_thousands(result.ensemble_forecast)
    );
    let _ = writeln!(out, "  Trend model:     {}", format_thousands(result.trend_forecast));
    let _ = writeln!(
        out,
        "  Seasonal ARIMA:  {}",
        format_thousands(result.autoregressive_forecast)
    );
    let _ = writeln!(
        out,
        "  Ensemble = {:.1} x Trend + {:.1} x Seasonal ARIMA",
        result.alpha,
        1.0 - result.alpha
    );

    out.push_str(&render_covariates(lookup));

    let _ = writeln!(out, "\n--- Debug ---");
    let _ = writeln!(out, "Steps ahead:      {}", result.steps_ahead);
    let _ = writeln!(out, "Last train date:  {}", cutoff);
    let _ = writeln!(out, "Target date:      {}", result.target_date);
    let _ = writeln!(out, "Days difference:  {}", result.days_diff);
    let _ = writeln!(
        out,
        "Crisis period:    {}",
        if result.crisis_period { "yes" } else { "no" }
    );
    out
}

pub fn render_covariates(lookup: &CovariateLookup) -> String {
    let mut out = String::new();
    match lookup {
        CovariateLookup::Available { date, values } => {
            let _ = writeln!(out, "\n--- Exogenous Variables ({}) ---", date);
            for covariate in Covariate::measured() {
                if let Some(v) = values.get(covariate) {
                    let _ = writeln!(out, "{:<30} {:.2}", format!("{}:", covariate.label()), v);
                }
            }
        }
        CovariateLookup::NotAvailable { date } => {
            let _ = writeln!(out, "\n--- Exogenous Variables ({}) ---", date);
            let _ = writeln!(out, "not in dataset (future extrapolation)");
        }
    }
    out
}
