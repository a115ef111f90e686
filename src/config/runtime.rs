use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::ColumnNames;

/// Prefix for environment overrides, e.g. `SALES_FORECAST__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "SALES_FORECAST";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSettings,
    pub models: ModelSettings,
    pub server: ServerSettings,
    pub forecast: ForecastSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Defaults, then the TOML file if it exists, then environment overrides
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::Config::try_from(&AppConfig::default())?)
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Invalid config in {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Data
        if self.data.history_path.as_os_str().is_empty() {
            errors.push("data.history_path must not be empty".to_string());
        }
        if self.data.future_path.as_os_str().is_empty() {
            errors.push("data.future_path must not be empty".to_string());
        }
        if self.data.columns.all().iter().any(|c| c.trim().is_empty()) {
            errors.push("data.columns: column names must not be empty".to_string());
        }

        // Models
        if self.models.trend_path.as_os_str().is_empty() {
            errors.push("models.trend_path must not be empty".to_string());
        }
        if self.models.autoregressive_path.as_os_str().is_empty() {
            errors.push("models.autoregressive_path must not be empty".to_string());
        }

        // Server
        if self.server.port == 0 {
            errors.push("server.port must be > 0".to_string());
        }
        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        // Forecast
        let alpha = self.forecast.default_alpha;
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            errors.push("forecast.default_alpha must be between 0 and 1".to_string());
        }

        // Logging
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            errors.push(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub history_path: PathBuf,
    pub future_path: PathBuf,
    pub columns: ColumnNames,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("data/final_data/train.csv"),
            future_path: PathBuf::from("data/final_data/test_filled.csv"),
            columns: ColumnNames::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub trend_path: PathBuf,
    pub autoregressive_path: PathBuf,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            trend_path: PathBuf::from("models/otomotiv_satis/trend_model.json"),
            autoregressive_path: PathBuf::from("models/otomotiv_satis/sarima_model.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Trend weight used when a request does not give one
    pub default_alpha: f64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self { default_alpha: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
