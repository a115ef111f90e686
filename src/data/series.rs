use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::types::{CovariateRow, Covariates};

/// One dated record of the sales series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    /// Observed sales; absent for future rows without actuals
    pub value: Option<f64>,
    pub covariates: Covariates,
}

/// Historical series plus its known-future covariate extension.
///
/// Rows are sorted by date with no duplicates, and every future row lies
/// strictly after the training cutoff. Built once at startup and never
/// mutated.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    observations: Vec<Observation>,
    table: Vec<CovariateRow>,
    history_len: usize,
}

impl TimeSeries {
    pub fn new(mut history: Vec<Observation>, mut future: Vec<Observation>) -> Result<Self> {
        if history.is_empty() {
            return Err(ForecastError::InvalidData("historical series is empty".to_string()));
        }

        history.sort_by_key(|o| o.date);
        future.sort_by_key(|o| o.date);

        check_unique(&history, "historical")?;
        check_unique(&future, "future")?;

        let cutoff = history[history.len() - 1].date;
        if let Some(first_future) = future.first() {
            if first_future.date <= cutoff {
                return Err(ForecastError::InvalidData(format!(
                    "future row {} does not come after the training cutoff {}",
                    first_future.date, cutoff
                )));
            }
        }

        if let Some(bad) = history.iter().chain(future.iter()).find(|o| !o.covariates.is_finite()) {
            return Err(ForecastError::InvalidData(format!(
                "non-finite covariate value on {}",
                bad.date
            )));
        }

        let history_len = history.len();
        let mut observations = history;
        observations.extend(future);

        // Crisis column is derived per row once, here
        let table = observations
            .iter()
            .map(|o| CovariateRow::new(o.date, o.covariates))
            .collect();

        Ok(Self {
            observations,
            table,
            history_len,
        })
    }

    /// Last date of the historical portion
    pub fn cutoff(&self) -> NaiveDate {
        self.observations[self.history_len - 1].date
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn future_len(&self) -> usize {
        self.observations.len() - self.history_len
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.observations[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].date
    }

    /// Covariate values recorded on exactly `date`
    pub fn covariates_on(&self, date: NaiveDate) -> Option<&Covariates> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .map(|idx| &self.observations[idx].covariates)
    }

    /// Trend model input: every row up to the cutoff plus `steps_ahead`
    /// future rows. `None` when the series is too short.
    pub fn trend_inputs(&self, steps_ahead: usize) -> Option<&[CovariateRow]> {
        let end = self.history_len.checked_add(steps_ahead)?;
        self.table.get(..end)
    }

    /// Dated target values that were actually observed
    pub fn observed_values(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.observations
            .iter()
            .filter_map(|o| o.value.map(|v| (o.date, v)))
    }
}

fn check_unique(rows: &[Observation], label: &str) -> Result<()> {
    if let Some(pair) = rows.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(ForecastError::InvalidData(format!(
            "duplicate date {} in {} rows",
            pair[0].date, label
        )));
    }
    Ok(())
}
