use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the series and models or computing a forecast
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The trend model needs covariate rows that the series does not have
    #[error(
        "date {target_date} beyond available covariate horizon: needs {required_rows} rows, \
         series has {available_rows} (last covariate date {last_available})"
    )]
    CovariateHorizonExceeded {
        target_date: NaiveDate,
        last_available: NaiveDate,
        required_rows: usize,
        available_rows: usize,
    },

    #[error("{0} model returned no predictions")]
    EmptyPrediction(&'static str),

    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
