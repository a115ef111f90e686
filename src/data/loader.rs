use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

use super::{Observation, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::types::{Covariate, Covariates};

/// Column headers expected in the series files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub date: String,
    pub target: String,
    pub exchange_rate: String,
    pub interest_rate: String,
    pub credit_stock: String,
    pub tax_rate: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            target: "Otomotiv Satis".to_string(),
            exchange_rate: Covariate::ExchangeRate.source_column().to_string(),
            interest_rate: Covariate::InterestRate.source_column().to_string(),
            credit_stock: Covariate::CreditStock.source_column().to_string(),
            tax_rate: Covariate::TaxRate.source_column().to_string(),
        }
    }
}

impl ColumnNames {
    pub fn all(&self) -> [&str; 6] {
        [
            &self.date,
            &self.target,
            &self.exchange_rate,
            &self.interest_rate,
            &self.credit_stock,
            &self.tax_rate,
        ]
    }
}

struct ColumnIndex {
    date: usize,
    target: Option<usize>,
    exchange_rate: usize,
    interest_rate: usize,
    credit_stock: usize,
    tax_rate: usize,
}

/// Load the historical and future-extension files into one series
pub fn load_series(
    history_path: impl AsRef<Path>,
    future_path: impl AsRef<Path>,
    columns: &ColumnNames,
) -> Result<TimeSeries> {
    let history = read_observations(history_path.as_ref(), columns, true)?;
    let future = read_observations(future_path.as_ref(), columns, false)?;

    let series = TimeSeries::new(history, future)?;
    info!(
        "Loaded series: {} historical rows, {} future rows, cutoff {}, range {} to {}",
        series.history_len(),
        series.future_len(),
        series.cutoff(),
        series.first_date(),
        series.last_date()
    );
    Ok(series)
}

fn read_observations(path: &Path, columns: &ColumnNames, require_target: bool) -> Result<Vec<Observation>> {
    let file = File::open(path).map_err(|source| ForecastError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_observations(BufReader::new(file), columns, require_target)
        .map_err(|e| match e {
            ForecastError::InvalidData(msg) => {
                ForecastError::InvalidData(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
}

/// Parse CSV rows. Future files may leave the target empty or omit it.
pub fn parse_observations<R: Read>(
    reader: R,
    columns: &ColumnNames,
    require_target: bool,
) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let require = |name: &str| {
        find(name).ok_or_else(|| ForecastError::InvalidData(format!("missing column '{}'", name)))
    };

    let index = ColumnIndex {
        date: require(&columns.date)?,
        target: if require_target {
            Some(require(&columns.target)?)
        } else {
            find(&columns.target)
        },
        exchange_rate: require(&columns.exchange_rate)?,
        interest_rate: require(&columns.interest_rate)?,
        credit_stock: require(&columns.credit_stock)?,
        tax_rate: require(&columns.tax_rate)?,
    };

    let mut observations = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let line = row + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let date = parse_series_date(field(index.date)).ok_or_else(|| {
            ForecastError::InvalidData(format!("line {}: invalid date '{}'", line, field(index.date)))
        })?;

        let value = match index.target {
            Some(idx) if !field(idx).is_empty() => Some(parse_number(field(idx), &columns.target, line)?),
            Some(_) if require_target => {
                return Err(ForecastError::InvalidData(format!(
                    "line {}: missing '{}' value",
                    line, columns.target
                )));
            }
            _ => None,
        };

        let covariates = Covariates {
            exchange_rate: parse_number(field(index.exchange_rate), &columns.exchange_rate, line)?,
            interest_rate: parse_number(field(index.interest_rate), &columns.interest_rate, line)?,
            credit_stock: parse_number(field(index.credit_stock), &columns.credit_stock, line)?,
            tax_rate: parse_number(field(index.tax_rate), &columns.tax_rate, line)?,
        };

        observations.push(Observation { date, value, covariates });
    }

    Ok(observations)
}

/// Accepts `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`
pub fn parse_series_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn parse_number(raw: &str, column: &str, line: usize) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ForecastError::InvalidData(format!("line {}: invalid '{}' value '{}'", line, column, raw))
        })
}
