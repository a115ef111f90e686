use serde::{Deserialize, Serialize};

use super::AutoregressiveModel;
use crate::error::{ForecastError, Result};

/// Fitted seasonal ARIMA(p,d,q)(P,D,Q,s) model.
///
/// Sign conventions follow the usual state-space export: the AR side is
/// `(1 - φ1 B - ...)(1 - Φ1 B^s - ...)` and the MA side is
/// `(1 + θ1 B + ...)(1 + Θ1 B^s + ...)`. The intercept enters the ARMA
/// recursion on the differenced scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarimaModel {
    /// (p, d, q)
    pub order: [usize; 3],
    /// (P, D, Q, s)
    #[serde(default)]
    pub seasonal_order: [usize; 4],
    #[serde(default)]
    pub ar: Vec<f64>,
    #[serde(default)]
    pub ma: Vec<f64>,
    #[serde(default)]
    pub seasonal_ar: Vec<f64>,
    #[serde(default)]
    pub seasonal_ma: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    /// Training series on the original scale, oldest first
    pub endog: Vec<f64>,
    /// One-step residuals aligned to the end of `endog`
    #[serde(default)]
    pub residuals: Vec<f64>,
}

impl SarimaModel {
    pub fn validate(&self) -> Result<()> {
        let [p, _d, q] = self.order;
        let [sp, _sd, sq, s] = self.seasonal_order;
        let invalid = |msg: String| Err(ForecastError::InvalidModel(msg));

        if self.ar.len() != p || self.ma.len() != q {
            return invalid(format!(
                "order ({}, _, {}) does not match {} AR / {} MA coefficients",
                p,
                q,
                self.ar.len(),
                self.ma.len()
            ));
        }
        if self.seasonal_ar.len() != sp || self.seasonal_ma.len() != sq {
            return invalid(format!(
                "seasonal order ({}, _, {}) does not match {} seasonal AR / {} seasonal MA coefficients",
                sp,
                sq,
                self.seasonal_ar.len(),
                self.seasonal_ma.len()
            ));
        }
        if s == 0 && self.seasonal_order[..3].iter().any(|&o| o > 0) {
            return invalid("seasonal terms require a seasonal period".to_string());
        }

        let all_finite = self
            .ar
            .iter()
            .chain(&self.ma)
            .chain(&self.seasonal_ar)
            .chain(&self.seasonal_ma)
            .chain(&self.endog)
            .chain(&self.residuals)
            .all(|v| v.is_finite())
            && self.intercept.is_finite();
        if !all_finite {
            return invalid("non-finite coefficient or observation".to_string());
        }

        self.check_lag_degrees()
    }

    /// Expanded AR (with differencing) and MA degrees must fit inside the
    /// training history. Checked before any polynomial is allocated.
    fn check_lag_degrees(&self) -> Result<()> {
        let [p, d, q] = self.order;
        let [sp, sd, sq, s] = self.seasonal_order;

        let ar = sp
            .checked_add(sd)
            .and_then(|n| n.checked_mul(s))
            .and_then(|n| n.checked_add(p))
            .and_then(|n| n.checked_add(d));
        let ma = sq.checked_mul(s).and_then(|n| n.checked_add(q));

        match (ar, ma) {
            (Some(ar), Some(ma)) if ar.max(1) <= self.endog.len() && ma <= self.endog.len() => Ok(()),
            _ => Err(ForecastError::InvalidModel(format!(
                "order {:?} x {:?} needs more lags than the {} observations in the artifact",
                self.order,
                self.seasonal_order,
                self.endog.len()
            ))),
        }
    }

    /// Expanded AR polynomial on levels, including differencing.
    /// Index 0 is the coefficient of y_t (always 1).
    fn ar_polynomial(&self) -> Vec<f64> {
        let [_, d, _] = self.order;
        let [_, sd, _, s] = self.seasonal_order;

        let mut poly = lag_polynomial(&self.ar, 1, -1.0);
        poly = multiply(&poly, &lag_polynomial(&self.seasonal_ar, s, -1.0));
        for _ in 0..d {
            poly = multiply(&poly, &[1.0, -1.0]);
        }
        for _ in 0..sd {
            let mut seasonal_diff = vec![0.0; s + 1];
            seasonal_diff[0] = 1.0;
            seasonal_diff[s] = -1.0;
            poly = multiply(&poly, &seasonal_diff);
        }
        poly
    }

    /// Expanded MA polynomial, index 0 is 1
    fn ma_polynomial(&self) -> Vec<f64> {
        let [_, _, _, s] = self.seasonal_order;
        multiply(
            &lag_polynomial(&self.ma, 1, 1.0),
            &lag_polynomial(&self.seasonal_ma, s, 1.0),
        )
    }
}

impl AutoregressiveModel for SarimaModel {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Ok(Vec::new());
        }

        self.validate()?;
        let ar = self.ar_polynomial();
        let ma = self.ma_polynomial();

        let mut levels = self.endog.clone();
        let mut shocks = vec![0.0; levels.len()];
        // Residuals cover the tail of the series
        let offset = levels.len().saturating_sub(self.residuals.len());
        for (i, &r) in self.residuals.iter().rev().take(levels.len()).rev().enumerate() {
            shocks[offset + i] = r;
        }

        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let t = levels.len();
            let mut next = self.intercept;

            for (lag, &c) in ar.iter().enumerate().skip(1) {
                if t >= lag {
                    next -= c * levels[t - lag];
                }
            }
            for (lag, &c) in ma.iter().enumerate().skip(1) {
                if t >= lag {
                    next += c * shocks[t - lag];
                }
            }

            levels.push(next);
            shocks.push(0.0); // future shocks are zero
            out.push(next);
        }

        Ok(out)
    }
}

/// `1 + sign * (c1 B^step + c2 B^{2 step} + ...)`
fn lag_polynomial(coefs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    if coefs.is_empty() || step == 0 {
        return vec![1.0];
    }
    let mut poly = vec![0.0; coefs.len() * step + 1];
    poly[0] = 1.0;
    for (i, &c) in coefs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}
