pub mod additive;
pub mod sarima;
pub mod persistence;
pub mod ensemble;

pub use additive::AdditiveTrendModel;
pub use sarima::SarimaModel;
pub use persistence::{load_autoregressive_model, load_trend_bundle};
pub use ensemble::blend;

use crate::error::Result;
use crate::types::CovariateRow;

/// Trend/seasonality model with exogenous regressors
#[cfg_attr(test, mockall::automock)]
pub trait TrendModel: Send + Sync {
    /// Point forecast for every row of the covariate table, in order
    fn predict(&self, table: &[CovariateRow]) -> Result<Vec<f64>>;
}

/// Autoregressive model forecasting past its own training cutoff
#[cfg_attr(test, mockall::automock)]
pub trait AutoregressiveModel: Send + Sync {
    /// Point forecasts for steps 1..=horizon
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>>;
}
