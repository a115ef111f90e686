use chrono::NaiveDate;
use tracing::debug;

use super::alignment;
use crate::config::{DataSettings, ModelSettings};
use crate::data::{load_series, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::ml::{blend, load_autoregressive_model, load_trend_bundle, AutoregressiveModel, TrendModel};
use crate::types::{Alignment, CovariateLookup, ForecastResult};

/// Everything a forecast needs, loaded once at startup and read-only
/// afterwards. Shared between front-ends as `Arc<ForecastContext>`.
pub struct ForecastContext {
    series: TimeSeries,
    trend: Box<dyn TrendModel>,
    /// Added to every raw trend prediction
    bias: f64,
    autoregressive: Box<dyn AutoregressiveModel>,
}

impl ForecastContext {
    pub fn new(
        series: TimeSeries,
        trend: Box<dyn TrendModel>,
        bias: f64,
        autoregressive: Box<dyn AutoregressiveModel>,
    ) -> Self {
        Self {
            series,
            trend,
            bias,
            autoregressive,
        }
    }

    /// Load the series files and both model artifacts
    pub fn load(data: &DataSettings, models: &ModelSettings) -> Result<Self> {
        let series = load_series(&data.history_path, &data.future_path, &data.columns)?;
        let bundle = load_trend_bundle(&models.trend_path)?;
        let autoregressive = load_autoregressive_model(&models.autoregressive_path)?;

        Ok(Self::new(
            series,
            Box::new(bundle.model),
            bundle.bias,
            Box::new(autoregressive),
        ))
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.series.cutoff()
    }

    pub fn align(&self, query_date: NaiveDate) -> Alignment {
        alignment::align(query_date, self.series.cutoff())
    }

    /// Ensemble forecast for `query_date`.
    ///
    /// Alpha is used as given. The per-query crisis flag is reported but the
    /// trend model reads the crisis column built into the series.
    pub fn forecast(&self, query_date: NaiveDate, alpha: f64) -> Result<ForecastResult> {
        let aligned = self.align(query_date);

        let table = self.series.trend_inputs(aligned.steps_ahead).ok_or_else(|| {
            ForecastError::CovariateHorizonExceeded {
                target_date: aligned.target_date,
                last_available: self.series.last_date(),
                required_rows: self.series.history_len().saturating_add(aligned.steps_ahead),
                available_rows: self.series.len(),
            }
        })?;

        let raw_trend = self
            .trend
            .predict(table)?
            .last()
            .copied()
            .ok_or(ForecastError::EmptyPrediction("trend"))?;
        let trend_forecast = raw_trend + self.bias;

        let autoregressive_forecast = self
            .autoregressive
            .forecast(aligned.steps_ahead)?
            .last()
            .copied()
            .ok_or(ForecastError::EmptyPrediction("autoregressive"))?;

        let ensemble_forecast = blend(alpha, trend_forecast, autoregressive_forecast);

        debug!(
            "Forecast {} -> target {} ({} steps, {} days): trend={:.1} ar={:.1} ensemble={:.1} alpha={}",
            query_date,
            aligned.target_date,
            aligned.steps_ahead,
            aligned.days_diff,
            trend_forecast,
            autoregressive_forecast,
            ensemble_forecast,
            alpha
        );

        Ok(ForecastResult {
            query_date,
            target_date: aligned.target_date,
            days_diff: aligned.days_diff,
            steps_ahead: aligned.steps_ahead,
            crisis_period: aligned.crisis_period,
            trend_forecast,
            autoregressive_forecast,
            ensemble_forecast,
            alpha,
        })
    }

    /// Display-only covariate lookup; never fails
    pub fn lookup_covariates(&self, date: NaiveDate) -> CovariateLookup {
        match self.series.covariates_on(date) {
            Some(values) => CovariateLookup::Available { date, values: *values },
            None => CovariateLookup::NotAvailable { date },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::series::tests::{monthly, sample_series};
    use crate::ml::{AdditiveTrendModel, MockAutoregressiveModel, MockTrendModel, SarimaModel};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Trend mock returning 1000 * row index, AR mock returning 10 * step
    fn ramp_context(bias: f64) -> ForecastContext {
        let mut trend = MockTrendModel::new();
        trend
            .expect_predict()
            .returning(|table| Ok((0..table.len()).map(|i| i as f64 * 1000.0).collect()));

        let mut ar = MockAutoregressiveModel::new();
        ar.expect_forecast()
            .returning(|h| Ok((1..=h).map(|s| s as f64 * 10.0).collect()));

        ForecastContext::new(sample_series(), Box::new(trend), bias, Box::new(ar))
    }

    #[test]
    fn test_reference_forecast() {
        let ctx = ramp_context(500.0);
        let result = ctx.forecast(date(2022, 3, 1), 0.5).unwrap();

        assert_eq!(result.target_date, date(2022, 2, 1));
        assert_eq!(result.days_diff, 62);
        assert_eq!(result.steps_ahead, 3);
        // 60 history rows + 3 steps, last index 62
        assert_eq!(result.trend_forecast, 62_000.0 + 500.0);
        assert_eq!(result.autoregressive_forecast, 30.0);
        assert_eq!(result.ensemble_forecast, 0.5 * 62_500.0 + 0.5 * 30.0);
        assert_eq!(result.alpha, 0.5);
    }

    #[test]
    fn test_trend_receives_history_plus_horizon_rows() {
        let mut trend = MockTrendModel::new();
        trend
            .expect_predict()
            .withf(|table| table.len() == 63 && table[62].date == NaiveDate::from_ymd_opt(2022, 3, 1).unwrap())
            .times(1)
            .returning(|table| Ok(vec![1.0; table.len()]));

        let mut ar = MockAutoregressiveModel::new();
        ar.expect_forecast()
            .withf(|h| *h == 3)
            .times(1)
            .returning(|h| Ok(vec![2.0; h]));

        let ctx = ForecastContext::new(sample_series(), Box::new(trend), 0.0, Box::new(ar));
        ctx.forecast(date(2022, 3, 1), 0.5).unwrap();
    }

    #[test]
    fn test_alpha_endpoints() {
        let ctx = ramp_context(250.0);
        let trend_only = ctx.forecast(date(2022, 6, 1), 1.0).unwrap();
        let ar_only = ctx.forecast(date(2022, 6, 1), 0.0).unwrap();

        assert_eq!(trend_only.ensemble_forecast, trend_only.trend_forecast);
        assert_eq!(ar_only.ensemble_forecast, ar_only.autoregressive_forecast);
    }

    #[test]
    fn test_alpha_is_not_clamped() {
        let ctx = ramp_context(0.0);
        let result = ctx.forecast(date(2022, 3, 1), 2.0).unwrap();
        assert_eq!(result.alpha, 2.0);
        assert_eq!(result.ensemble_forecast, 2.0 * 62_000.0 - 30.0);
    }

    #[test]
    fn test_target_before_cutoff_uses_one_step() {
        let ctx = ramp_context(0.0);
        let result = ctx.forecast(date(2019, 7, 1), 0.5).unwrap();

        assert_eq!(result.steps_ahead, 1);
        assert!(result.days_diff < 0);
        assert!(result.crisis_period);
        assert_eq!(result.trend_forecast, 60_000.0);
        assert_eq!(result.autoregressive_forecast, 10.0);
    }

    #[test]
    fn test_beyond_covariate_horizon_is_rejected() {
        let mut trend = MockTrendModel::new();
        trend.expect_predict().never();
        let mut ar = MockAutoregressiveModel::new();
        ar.expect_forecast().never();

        let ctx = ForecastContext::new(sample_series(), Box::new(trend), 0.0, Box::new(ar));
        let err = ctx.forecast(date(2024, 6, 1), 0.5).unwrap_err();

        match err {
            ForecastError::CovariateHorizonExceeded {
                target_date,
                last_available,
                available_rows,
                ..
            } => {
                assert_eq!(target_date, date(2024, 5, 1));
                assert_eq!(last_available, date(2022, 12, 1));
                assert_eq!(available_rows, 72);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_last_future_row_is_reachable() {
        let ctx = ramp_context(0.0);
        // target 2022-12-01 is 365 days out: floor(365 / 30) + 1 = 13 steps > 12 rows
        assert!(ctx.forecast(date(2023, 1, 1), 0.5).is_err());
        // target 2022-11-01 is 335 days out: 12 steps
        let result = ctx.forecast(date(2022, 12, 1), 0.5).unwrap();
        assert_eq!(result.steps_ahead, 12);
        assert_eq!(result.trend_forecast, 71_000.0);
    }

    #[test]
    fn test_model_errors_propagate() {
        let mut trend = MockTrendModel::new();
        trend
            .expect_predict()
            .returning(|_| Err(ForecastError::InvalidModel("broken".to_string())));
        let ar = MockAutoregressiveModel::new();

        let ctx = ForecastContext::new(sample_series(), Box::new(trend), 0.0, Box::new(ar));
        assert!(matches!(
            ctx.forecast(date(2022, 3, 1), 0.5),
            Err(ForecastError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_empty_predictions_are_errors() {
        let mut trend = MockTrendModel::new();
        trend.expect_predict().returning(|_| Ok(Vec::new()));
        let ar = MockAutoregressiveModel::new();
        let ctx = ForecastContext::new(sample_series(), Box::new(trend), 0.0, Box::new(ar));
        assert!(matches!(
            ctx.forecast(date(2022, 3, 1), 0.5),
            Err(ForecastError::EmptyPrediction("trend"))
        ));

        let mut trend = MockTrendModel::new();
        trend.expect_predict().returning(|t| Ok(vec![1.0; t.len()]));
        let mut ar = MockAutoregressiveModel::new();
        ar.expect_forecast().returning(|_| Ok(Vec::new()));
        let ctx = ForecastContext::new(sample_series(), Box::new(trend), 0.0, Box::new(ar));
        assert!(matches!(
            ctx.forecast(date(2022, 3, 1), 0.5),
            Err(ForecastError::EmptyPrediction("autoregressive"))
        ));
    }

    #[test]
    fn test_covariate_lookup_does_not_block_forecast() {
        let ctx = ramp_context(0.0);

        // Mid-month target has no covariate row, forecast still runs
        let query = date(2022, 3, 15);
        let target = ctx.align(query).target_date;
        assert_eq!(target, date(2022, 2, 15));
        assert!(matches!(ctx.lookup_covariates(target), CovariateLookup::NotAvailable { .. }));
        assert!(ctx.forecast(query, 0.5).is_ok());

        let lookup = ctx.lookup_covariates(date(2022, 2, 1));
        assert!(lookup.values().is_some());
    }

    #[test]
    fn test_deterministic_results() {
        let ctx = real_context();
        let a = ctx.forecast(date(2022, 5, 1), 0.3).unwrap();
        let b = ctx.forecast(date(2022, 5, 1), 0.3).unwrap();

        assert_eq!(a.trend_forecast.to_bits(), b.trend_forecast.to_bits());
        assert_eq!(a.autoregressive_forecast.to_bits(), b.autoregressive_forecast.to_bits());
        assert_eq!(a.ensemble_forecast.to_bits(), b.ensemble_forecast.to_bits());
    }

    #[test]
    fn test_shared_across_threads() {
        let ctx = Arc::new(real_context());
        let expected = ctx.forecast(date(2022, 4, 1), 0.5).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let ctx = Arc::clone(&ctx);
                scope.spawn(move || {
                    let result = ctx.forecast(date(2022, 4, 1), 0.5).unwrap();
                    assert_eq!(result, expected);
                });
            }
        });
    }

    #[test]
    fn test_real_models_end_to_end() {
        let ctx = real_context();
        let result = ctx.forecast(date(2022, 3, 1), 0.5).unwrap();

        // Flat trend m * y_scale plus bias; random walk repeats the last value
        assert!((result.trend_forecast - 61_000.0).abs() < 1e-6);
        assert_eq!(result.autoregressive_forecast, 55_900.0);
        assert!((result.ensemble_forecast - 58_450.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_from_files() {
        use crate::data::ColumnNames;
        use std::path::PathBuf;

        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, contents: &str| -> PathBuf {
            let path = dir.path().join(name);
            std::fs::write(&path, contents).unwrap();
            path
        };

        let history_path = write(
            "train.csv",
            "Date,Otomotiv Satis,EUR/TL,Faiz,Kredi Stok,OTV Orani\n\
             2021-10-01,61000,9.8,18.0,1500.5,50\n\
             2021-11-01,64000,11.2,16.0,1520.0,50\n\
             2021-12-01,88000,15.6,14.0,1580.2,60\n",
        );
        let future_path = write(
            "test_filled.csv",
            "Date,Otomotiv Satis,EUR/TL,Faiz,Kredi Stok,OTV Orani\n\
             2022-01-01 00:00:00,,15.2,14.0,1600.0,60\n\
             2022-02-01 00:00:00,,15.4,14.0,1610.0,60\n",
        );
        let trend_path = write(
            "trend_model.json",
            r#"{"bias": 1250.5, "model": {"start": "2021-01-01", "t_scale_days": 365.0, "y_scale": 100000.0, "k": 0.0, "m": 0.5}}"#,
        );
        let autoregressive_path = write(
            "sarima_model.json",
            r#"{"order": [0, 1, 0], "endog": [61000.0, 64000.0, 88000.0]}"#,
        );

        let data = DataSettings {
            history_path,
            future_path,
            columns: ColumnNames::default(),
        };
        let models = ModelSettings {
            trend_path,
            autoregressive_path,
        };
        let ctx = ForecastContext::load(&data, &models).unwrap();
        assert_eq!(ctx.cutoff(), date(2021, 12, 1));

        // target 2022-01-01 is 31 days past the cutoff: 2 steps, all 5 rows
        let result = ctx.forecast(date(2022, 2, 1), 0.5).unwrap();
        assert_eq!(result.steps_ahead, 2);
        assert!((result.trend_forecast - (50_000.0 + 1250.5)).abs() < 1e-6);
        assert_eq!(result.autoregressive_forecast, 88_000.0);

        // One step more needs a sixth row
        assert!(matches!(
            ctx.forecast(date(2022, 3, 1), 0.5),
            Err(ForecastError::CovariateHorizonExceeded { .. })
        ));

        let missing = ModelSettings {
            trend_path: dir.path().join("missing.json"),
            autoregressive_path: models.autoregressive_path.clone(),
        };
        assert!(matches!(
            ForecastContext::load(&data, &missing),
            Err(ForecastError::Io { .. })
        ));
    }

    /// Flat trend at 60,000 plus 1,000 bias, random walk ending at 55,900
    pub fn real_context() -> ForecastContext {
        let trend = AdditiveTrendModel {
            start: date(2017, 1, 1),
            t_scale_days: 1826.0,
            y_scale: 100_000.0,
            k: 0.0,
            m: 0.6,
            changepoints: Vec::new(),
            deltas: Vec::new(),
            seasonalities: Vec::new(),
            regressors: Vec::new(),
        };
        let history = monthly(date(2017, 1, 1), 60, true);
        let endog: Vec<f64> = history.iter().filter_map(|o| o.value).collect();
        let ar = SarimaModel {
            order: [0, 1, 0],
            seasonal_order: [0, 0, 0, 0],
            ar: Vec::new(),
            ma: Vec::new(),
            seasonal_ar: Vec::new(),
            seasonal_ma: Vec::new(),
            intercept: 0.0,
            endog,
            residuals: Vec::new(),
        };
        ForecastContext::new(sample_series(), Box::new(trend), 1_000.0, Box::new(ar))
    }
}
