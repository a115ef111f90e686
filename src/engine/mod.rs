pub mod alignment;
pub mod orchestrator;

pub use alignment::target_date;
pub use orchestrator::ForecastContext;
