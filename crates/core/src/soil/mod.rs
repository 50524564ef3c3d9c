//! Single-column soil water balance

pub mod column;
pub mod parameters;

pub use column::{SoilColumn, StepResult, DRY_SOIL_MOISTURE};
pub use parameters::{ParameterError, SoilParameters};
