//! Per-step outputs and the sinks that consume them
//!
//! `StepRecord` is what a driver hands to a sink once per step.
//! `TimeSeries` keeps the whole run in memory, one vector per variable.

use crate::soil::StepResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observed step of a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Zero-based step index
    pub step: usize,
    /// Elapsed time at the start of the step (hours)
    pub time_hours: f64,
    /// Rainfall rate applied on this step (mm/h)
    pub rainfall: f64,
    /// State of the observed column after the step
    pub result: StepResult,
}

/// Consumer of per-step simulation output
pub trait StepSink {
    /// Record one step
    ///
    /// # Errors
    /// Returns [`OutputError`] if the record cannot be persisted.
    fn record(&mut self, record: &StepRecord) -> Result<(), OutputError>;

    /// Called once after the last step
    ///
    /// # Errors
    /// Returns [`OutputError`] if buffered output cannot be flushed.
    fn finish(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

impl StepSink for Vec<StepRecord> {
    fn record(&mut self, record: &StepRecord) -> Result<(), OutputError> {
        self.push(*record);
        Ok(())
    }
}

/// Feed the same records to two sinks
impl<A: StepSink, B: StepSink> StepSink for (A, B) {
    fn record(&mut self, record: &StepRecord) -> Result<(), OutputError> {
        self.0.record(record)?;
        self.1.record(record)
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.0.finish()?;
        self.1.finish()
    }
}

impl<S: StepSink + ?Sized> StepSink for &mut S {
    fn record(&mut self, record: &StepRecord) -> Result<(), OutputError> {
        (**self).record(record)
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        (**self).finish()
    }
}

/// Full run of an observed column, one vector per variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub time_hours: Vec<f64>,
    pub rainfall: Vec<f64>,
    pub infiltration_rate: Vec<f64>,
    pub subsurface_flow: Vec<f64>,
    pub drainage: Vec<f64>,
    pub soil_moisture: Vec<f64>,
    pub overland_flow: Vec<f64>,
}

impl TimeSeries {
    /// Pre-allocate all vectors for `n` steps
    pub fn with_capacity(n: usize) -> Self {
        Self {
            time_hours: Vec::with_capacity(n),
            rainfall: Vec::with_capacity(n),
            infiltration_rate: Vec::with_capacity(n),
            subsurface_flow: Vec::with_capacity(n),
            drainage: Vec::with_capacity(n),
            soil_moisture: Vec::with_capacity(n),
            overland_flow: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, record: &StepRecord) {
        self.time_hours.push(record.time_hours);
        self.rainfall.push(record.rainfall);
        self.infiltration_rate.push(record.result.infiltration_rate);
        self.subsurface_flow.push(record.result.subsurface_flow);
        self.drainage.push(record.result.drainage);
        self.soil_moisture.push(record.result.soil_moisture);
        self.overland_flow.push(record.result.overland_flow);
    }

    pub fn len(&self) -> usize {
        self.time_hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_hours.is_empty()
    }

    /// Summed absolute differences against another run of the same length
    ///
    /// Used to cross-check two implementations of the same hillslope. Only
    /// the overlapping prefix is compared if the lengths differ.
    pub fn total_abs_difference(&self, other: &TimeSeries) -> SeriesDifference {
        fn summed(a: &[f64], b: &[f64]) -> f64 {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
        }

        SeriesDifference {
            soil_moisture: summed(&self.soil_moisture, &other.soil_moisture),
            overland_flow: summed(&self.overland_flow, &other.overland_flow),
            subsurface_flow: summed(&self.subsurface_flow, &other.subsurface_flow),
        }
    }
}

impl StepSink for TimeSeries {
    fn record(&mut self, record: &StepRecord) -> Result<(), OutputError> {
        self.push(record);
        Ok(())
    }
}

/// Summed absolute differences between two time series
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeriesDifference {
    pub soil_moisture: f64,
    pub overland_flow: f64,
    pub subsurface_flow: f64,
}

impl SeriesDifference {
    /// Largest of the three summed differences
    pub fn max(&self) -> f64 {
        self.soil_moisture
            .max(self.overland_flow)
            .max(self.subsurface_flow)
    }
}

impl fmt::Display for SeriesDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Soil moisture {}, overland flow {}, subsurface flow {}",
            self.soil_moisture, self.overland_flow, self.subsurface_flow
        )
    }
}

/// Errors that can occur while writing simulation output
#[derive(Debug)]
pub enum OutputError {
    /// Underlying writer failed
    Io(std::io::Error),
    /// Observed column index does not name a column in the chain
    UnknownColumn { index: usize, len: usize },
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Io(e) => write!(f, "Failed to write output: {e}"),
            OutputError::UnknownColumn { index, len } => write!(
                f,
                "Cannot observe column {index}: chain has {len} columns"
            ),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(e) => Some(e),
            OutputError::UnknownColumn { .. } => None,
        }
    }
}

impl From<std::io::Error> for OutputError {
    fn from(e: std::io::Error) -> Self {
        OutputError::Io(e)
    }
}
