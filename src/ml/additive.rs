use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::TrendModel;
use crate::error::{ForecastError, Result};
use crate::types::{Covariate, CovariateRow};

/// Fourier seasonality block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seasonality {
    pub name: String,
    pub period_days: f64,
    pub fourier_order: usize,
    /// Coefficients ordered sin(1), cos(1), sin(2), cos(2), ...
    pub beta: Vec<f64>,
}

/// Standardized additive regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regressor {
    /// Column name, either the source header (`EUR/TL`) or snake_case (`exchange_rate`)
    pub name: String,
    pub mu: f64,
    pub std: f64,
    pub coef: f64,
}

/// Fitted additive model: piecewise-linear trend plus Fourier seasonality
/// plus standardized regressors, all in units scaled by `y_scale`.
///
/// Trend time is `(date - start) / t_scale_days`; seasonality time is days
/// since 1970-01-01. Parameters are exported from the training pipeline and
/// only evaluated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditiveTrendModel {
    pub start: NaiveDate,
    pub t_scale_days: f64,
    pub y_scale: f64,
    /// Base growth rate
    pub k: f64,
    /// Base offset
    pub m: f64,
    /// Changepoint locations in scaled time
    #[serde(default)]
    pub changepoints: Vec<f64>,
    /// Rate adjustment at each changepoint
    #[serde(default)]
    pub deltas: Vec<f64>,
    #[serde(default)]
    pub seasonalities: Vec<Seasonality>,
    #[serde(default)]
    pub regressors: Vec<Regressor>,
}

impl AdditiveTrendModel {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ForecastError::InvalidModel(msg));

        if !(self.t_scale_days.is_finite() && self.t_scale_days > 0.0) {
            return invalid(format!("t_scale_days must be > 0, got {}", self.t_scale_days));
        }
        if !self.y_scale.is_finite() || !self.k.is_finite() || !self.m.is_finite() {
            return invalid("y_scale, k and m must be finite".to_string());
        }
        if self.changepoints.len() != self.deltas.len() {
            return invalid(format!(
                "{} changepoints but {} deltas",
                self.changepoints.len(),
                self.deltas.len()
            ));
        }
        for s in &self.seasonalities {
            if !(s.period_days > 0.0) {
                return invalid(format!("seasonality '{}' has non-positive period", s.name));
            }
            if s.beta.len() != 2 * s.fourier_order {
                return invalid(format!(
                    "seasonality '{}' expects {} coefficients, got {}",
                    s.name,
                    2 * s.fourier_order,
                    s.beta.len()
                ));
            }
        }
        for r in &self.regressors {
            if Covariate::from_name(&r.name).is_none() {
                return invalid(format!("unknown regressor '{}'", r.name));
            }
            if !(r.std.is_finite() && r.std > 0.0) {
                return invalid(format!("regressor '{}' has invalid std {}", r.name, r.std));
            }
        }
        Ok(())
    }

    fn feature_count(&self) -> usize {
        self.seasonalities.iter().map(|s| 2 * s.fourier_order).sum::<usize>() + self.regressors.len()
    }

    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.t_scale_days
    }

    /// Piecewise-linear trend in scaled units
    fn trend_at(&self, t: f64) -> f64 {
        let mut rate = self.k;
        let mut offset = self.m;
        for (&cp, &delta) in self.changepoints.iter().zip(&self.deltas) {
            if t >= cp {
                rate += delta;
                offset -= cp * delta;
            }
        }
        rate * t + offset
    }

    /// Seasonality and regressor columns for every row
    fn design_matrix(&self, table: &[CovariateRow]) -> Result<Array2<f64>> {
        let mut x = Array2::<f64>::zeros((table.len(), self.feature_count()));
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
            .ok_or_else(|| ForecastError::InvalidModel("epoch".to_string()))?;

        for (i, row) in table.iter().enumerate() {
            let t_days = (row.date - epoch).num_days() as f64;
            let mut col = 0;

            for s in &self.seasonalities {
                for order in 1..=s.fourier_order {
                    let angle = 2.0 * PI * order as f64 * t_days / s.period_days;
                    x[[i, col]] = angle.sin();
                    x[[i, col + 1]] = angle.cos();
                    col += 2;
                }
            }

            for r in &self.regressors {
                let covariate = Covariate::from_name(&r.name)
                    .ok_or_else(|| ForecastError::InvalidModel(format!("unknown regressor '{}'", r.name)))?;
                x[[i, col]] = (row.value(covariate) - r.mu) / r.std;
                col += 1;
            }
        }

        Ok(x)
    }

    fn coefficients(&self) -> Array1<f64> {
        self.seasonalities
            .iter()
            .flat_map(|s| s.beta.iter().copied())
            .chain(self.regressors.iter().map(|r| r.coef))
            .collect()
    }
}

impl TrendModel for AdditiveTrendModel {
    fn predict(&self, table: &[CovariateRow]) -> Result<Vec<f64>> {
        let additive = self.design_matrix(table)?.dot(&self.coefficients());

        Ok(table
            .iter()
            .zip(additive.iter())
            .map(|(row, &extra)| (self.trend_at(self.scaled_time(row.date)) + extra) * self.y_scale)
            .collect())
    }
}
