use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::ForecastContext;
use crate::types::{Covariates, ForecastResult};

/// Shared handler state. The context is immutable, so cloning per request
/// is just an `Arc` bump.
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ForecastContext>,
    pub default_alpha: f64,
}

impl AppState {
    pub fn new(context: Arc<ForecastContext>, default_alpha: f64) -> Self {
        Self {
            context,
            default_alpha,
        }
    }
}

// === Request bodies ===

/// Body of `POST /api/forecast` and `POST /api/predict`.
/// Extra fields (raw covariate values sent by older clients) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastRequest {
    pub date: String,
    #[serde(default)]
    pub alpha: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputsParams {
    pub date: String,
    #[serde(default)]
    pub alpha: Option<f64>,
}

// === Responses ===

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub cutoff: NaiveDate,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub history_rows: usize,
    pub future_rows: usize,
    pub default_alpha: f64,
    pub default_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    #[serde(flatten)]
    pub result: ForecastResult,
    /// Covariates on the target date, `None` past the data
    pub covariates: Option<Covariates>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub date: NaiveDate,
    pub prediction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputsResponse {
    pub date: NaiveDate,
    pub target_date: NaiveDate,
    pub alpha: f64,
    pub covariates: Covariates,
}
