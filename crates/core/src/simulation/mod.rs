//! Driving simulations and collecting their output

pub mod config;
pub mod driver;
pub mod output;
pub mod rainfall;
pub mod transcript;

pub use config::{ColumnConfig, ConfigError, ScenarioConfig};
pub use driver::{run_chain, run_column, SimulationSettings};
pub use output::{OutputError, SeriesDifference, StepRecord, StepSink, TimeSeries};
pub use rainfall::RainfallSchedule;
pub use transcript::{TranscriptWriter, TRANSCRIPT_HEADER};
