//! Hillslope Leaky-Bucket Simulation Core Library
//!
//! Vertical water balance of a soil column ("leaky bucket") and its
//! composition into a hillslope, where each column's overland and subsurface
//! flow feed the columns downslope of it. Based on the soil hydrology model
//! of Wainwright and Parsons (2002).
//!
//! ## Layout
//!
//! - [`soil`]: single-column infiltration, runoff, subsurface flow and
//!   drainage, stepped with explicit Euler
//! - [`hillslope`]: columns linked by upslope index lists and evaluated
//!   upslope-first
//! - [`simulation`]: rainfall schedules, driver loops, step sinks, the text
//!   transcript and JSON scenario files
//!
//! ```
//! use hillslope_core::{SoilColumn, SoilParameters};
//!
//! let mut column = SoilColumn::new(&SoilParameters::default()).unwrap();
//! let step = column.advance(20.0, 0.0, 0.0, 1.0 / 60.0);
//! assert!(step.soil_moisture > 20.0);
//! ```

// Core types and utilities
pub mod core_types;

pub mod hillslope;
pub mod simulation;
pub mod soil;

pub use core_types::{Degrees, Radians};
pub use hillslope::{ChainError, ColumnInflow, HillslopeChain};
pub use simulation::{
    run_chain, run_column, ConfigError, OutputError, RainfallSchedule, ScenarioConfig,
    SeriesDifference, SimulationSettings, StepRecord, StepSink, TimeSeries, TranscriptWriter,
};
pub use soil::{ParameterError, SoilColumn, SoilParameters, StepResult};
