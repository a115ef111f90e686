use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use super::{AdditiveTrendModel, SarimaModel};
use crate::error::{ForecastError, Result};

/// Model artifact identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Trend,
    Autoregressive,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Trend => "trend",
            ModelKind::Autoregressive => "autoregressive",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trend model stored together with its bias correction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendBundle {
    pub model: AdditiveTrendModel,
    /// Mean training residual, added to every raw prediction
    pub bias: f64,
}

pub fn load_trend_bundle(path: impl AsRef<Path>) -> Result<TrendBundle> {
    let bundle: TrendBundle = read_artifact(path.as_ref(), ModelKind::Trend)?;
    bundle.model.validate()?;
    if !bundle.bias.is_finite() {
        return Err(ForecastError::InvalidModel(format!("non-finite bias {}", bundle.bias)));
    }

    info!(
        "Loaded trend model: {} seasonalities, {} regressors, {} changepoints, bias {:.2}",
        bundle.model.seasonalities.len(),
        bundle.model.regressors.len(),
        bundle.model.changepoints.len(),
        bundle.bias
    );
    Ok(bundle)
}

pub fn load_autoregressive_model(path: impl AsRef<Path>) -> Result<SarimaModel> {
    let model: SarimaModel = read_artifact(path.as_ref(), ModelKind::Autoregressive)?;
    model.validate()?;

    info!(
        "Loaded autoregressive model: order {:?}, seasonal order {:?}, {} observations",
        model.order,
        model.seasonal_order,
        model.endog.len()
    );
    Ok(model)
}

fn read_artifact<T: DeserializeOwned>(path: &Path, kind: ModelKind) -> Result<T> {
    let file = File::open(path).map_err(|source| ForecastError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        ForecastError::InvalidModel(format!(
            "Failed to parse {} model '{}': {}",
            kind,
            path.display(),
            e
        ))
    })
}
