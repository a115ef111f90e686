pub mod series;
pub mod loader;

pub use series::*;
pub use loader::*;
