use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First day of the crisis window used for the `crisis_dummy` regressor
pub const CRISIS_START: (i32, u32, u32) = (2018, 1, 1);
/// Last day (inclusive) of the crisis window
pub const CRISIS_END: (i32, u32, u32) = (2020, 12, 31);

/// True when `date` falls inside the crisis window, bounds inclusive
pub fn is_crisis_period(date: NaiveDate) -> bool {
    let (sy, sm, sd) = CRISIS_START;
    let (ey, em, ed) = CRISIS_END;
    match (
        NaiveDate::from_ymd_opt(sy, sm, sd),
        NaiveDate::from_ymd_opt(ey, em, ed),
    ) {
        (Some(start), Some(end)) => start <= date && date <= end,
        _ => false,
    }
}

/// Exogenous regressors the trend model can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Covariate {
    ExchangeRate,
    InterestRate,
    CreditStock,
    TaxRate,
    CrisisDummy,
}

impl Covariate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Covariate::ExchangeRate => "exchange_rate",
            Covariate::InterestRate => "interest_rate",
            Covariate::CreditStock => "credit_stock",
            Covariate::TaxRate => "tax_rate",
            Covariate::CrisisDummy => "crisis_dummy",
        }
    }

    /// Column header used in the source data files
    pub fn source_column(&self) -> &'static str {
        match self {
            Covariate::ExchangeRate => "EUR/TL",
            Covariate::InterestRate => "Faiz",
            Covariate::CreditStock => "Kredi Stok",
            Covariate::TaxRate => "OTV Orani",
            Covariate::CrisisDummy => "crisis_dummy",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Covariate::ExchangeRate => "Exchange rate (EUR/TL)",
            Covariate::InterestRate => "Interest rate",
            Covariate::CreditStock => "Credit stock",
            Covariate::TaxRate => "Special consumption tax rate",
            Covariate::CrisisDummy => "Crisis period",
        }
    }

    /// Resolve a regressor name as written in a model artifact.
    /// Accepts both the snake_case name and the source column header.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "exchange_rate" | "EUR/TL" | "EUR_TL" => Some(Covariate::ExchangeRate),
            "interest_rate" | "Faiz" => Some(Covariate::InterestRate),
            "credit_stock" | "Kredi Stok" | "Kredi_Stok" => Some(Covariate::CreditStock),
            "tax_rate" | "OTV Orani" | "OTV_Orani" => Some(Covariate::TaxRate),
            "crisis_dummy" => Some(Covariate::CrisisDummy),
            _ => None,
        }
    }

    /// The four measured covariates, without the derived crisis flag
    pub fn measured() -> [Covariate; 4] {
        [
            Covariate::ExchangeRate,
            Covariate::InterestRate,
            Covariate::CreditStock,
            Covariate::TaxRate,
        ]
    }
}

impl fmt::Display for Covariate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Measured covariate values for one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Covariates {
    pub exchange_rate: f64,
    pub interest_rate: f64,
    pub credit_stock: f64,
    pub tax_rate: f64,
}

impl Covariates {
    pub fn get(&self, covariate: Covariate) -> Option<f64> {
        match covariate {
            Covariate::ExchangeRate => Some(self.exchange_rate),
            Covariate::InterestRate => Some(self.interest_rate),
            Covariate::CreditStock => Some(self.credit_stock),
            Covariate::TaxRate => Some(self.tax_rate),
            Covariate::CrisisDummy => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        Covariate::measured()
            .iter()
            .filter_map(|c| self.get(*c))
            .all(f64::is_finite)
    }
}

/// One row of the trend model's input table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CovariateRow {
    pub date: NaiveDate,
    pub covariates: Covariates,
    /// 1.0 inside the crisis window, derived from this row's own date
    pub crisis_dummy: f64,
}

impl CovariateRow {
    pub fn new(date: NaiveDate, covariates: Covariates) -> Self {
        Self {
            date,
            covariates,
            crisis_dummy: if is_crisis_period(date) { 1.0 } else { 0.0 },
        }
    }

    pub fn value(&self, covariate: Covariate) -> f64 {
        match covariate {
            Covariate::CrisisDummy => self.crisis_dummy,
            other => self.covariates.get(other).unwrap_or(0.0),
        }
    }
}
