pub mod covariate;
pub mod forecast;

pub use covariate::*;
pub use forecast::*;
