//! Fixed-step driver loops
//!
//! The soil model has no notion of time beyond the `dt` it is handed. These
//! loops decide how many steps to run, look up the rainfall for each step and
//! pass the observed column's state to a [`StepSink`].

use super::output::{OutputError, StepRecord, StepSink};
use super::rainfall::RainfallSchedule;
use crate::hillslope::HillslopeChain;
use crate::soil::SoilColumn;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Step count, timestep and rainfall forcing for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub steps: usize,
    pub timestep_hours: f64,
    pub rainfall: RainfallSchedule,
}

impl SimulationSettings {
    /// 20 mm/h for sixty one-minute steps followed by sixty dry minutes
    pub fn reference_storm() -> Self {
        Self {
            steps: 120,
            timestep_hours: 1.0 / 60.0,
            rainfall: RainfallSchedule::Storm {
                intensity: 20.0,
                duration_steps: 60,
            },
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::reference_storm()
    }
}

/// Drive a single column with no upslope contributions
///
/// # Errors
/// Returns [`OutputError`] if the sink fails; the column keeps the state of
/// the last completed step.
pub fn run_column<S: StepSink + ?Sized>(
    column: &mut SoilColumn,
    settings: &SimulationSettings,
    sink: &mut S,
) -> Result<(), OutputError> {
    info!(
        "Running single column: {} steps of {:.4}h",
        settings.steps, settings.timestep_hours
    );

    for step in 0..settings.steps {
        let rainfall = settings.rainfall.rate_at(step);
        let result = column.advance(rainfall, 0.0, 0.0, settings.timestep_hours);
        sink.record(&StepRecord {
            step,
            time_hours: step as f64 * settings.timestep_hours,
            rainfall,
            result,
        })?;
    }

    sink.finish()
}

/// Drive a hillslope chain, recording column `observed` after every step
///
/// # Errors
/// Returns [`OutputError::UnknownColumn`] before any step is taken if
/// `observed` is not a column of the chain, or [`OutputError`] if the sink
/// fails.
pub fn run_chain<S: StepSink + ?Sized>(
    chain: &mut HillslopeChain,
    settings: &SimulationSettings,
    observed: usize,
    sink: &mut S,
) -> Result<(), OutputError> {
    if observed >= chain.len() {
        return Err(OutputError::UnknownColumn {
            index: observed,
            len: chain.len(),
        });
    }

    info!(
        "Running hillslope of {} columns: {} steps of {:.4}h, observing column {}",
        chain.len(),
        settings.steps,
        settings.timestep_hours,
        observed
    );

    for step in 0..settings.steps {
        let rainfall = settings.rainfall.rate_at(step);
        chain.step(rainfall, settings.timestep_hours);

        if let Some(column) = chain.column(observed) {
            sink.record(&StepRecord {
                step,
                time_hours: step as f64 * settings.timestep_hours,
                rainfall,
                result: column.last_step(),
            })?;
        }
    }

    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::output::TimeSeries;
    use crate::simulation::transcript::{TranscriptWriter, TRANSCRIPT_HEADER};
    use crate::soil::SoilParameters;

    #[test]
    fn test_run_column_records_every_step() {
        let mut column = SoilColumn::new(&SoilParameters::default()).unwrap();
        let settings = SimulationSettings::reference_storm();
        let mut series = TimeSeries::with_capacity(settings.steps);

        run_column(&mut column, &settings, &mut series).unwrap();

        assert_eq!(series.len(), 120);
        assert_eq!(series.rainfall[59], 20.0);
        assert_eq!(series.rainfall[60], 0.0);
        assert!((series.time_hours[60] - 1.0).abs() < 1e-12);
        assert_eq!(*series.soil_moisture.last().unwrap(), column.soil_moisture());
    }

    #[test]
    fn test_run_chain_observes_requested_column() {
        let params = SoilParameters {
            final_infilt_rate: 5.0,
            ..Default::default()
        };
        let columns = (0..3)
            .map(|_| SoilColumn::new(&params).unwrap())
            .collect();
        let mut chain = HillslopeChain::linear(columns);
        let settings = SimulationSettings {
            steps: 60,
            timestep_hours: 1.0 / 60.0,
            rainfall: RainfallSchedule::Constant { rate: 20.0 },
        };
        let mut records: Vec<StepRecord> = Vec::new();

        run_chain(&mut chain, &settings, 2, &mut records).unwrap();

        assert_eq!(records.len(), 60);
        assert_eq!(records[59].result, chain.column(2).unwrap().last_step());
    }

    #[test]
    fn test_run_chain_rejects_unknown_observed_column() {
        let mut chain = HillslopeChain::linear(vec![
            SoilColumn::new(&SoilParameters::default()).unwrap(),
        ]);
        let settings = SimulationSettings {
            steps: 5,
            ..Default::default()
        };
        let mut sinks = (
            Vec::<StepRecord>::new(),
            TranscriptWriter::new(Vec::new()).unwrap(),
        );

        let result = run_chain(&mut chain, &settings, 3, &mut sinks);

        assert!(matches!(
            result,
            Err(OutputError::UnknownColumn { index: 3, len: 1 })
        ));
        let (records, transcript) = sinks;
        assert!(records.is_empty());
        assert_eq!(transcript.into_inner().len(), TRANSCRIPT_HEADER.len() + 1);
        // Nothing was stepped
        assert!((chain.column(0).unwrap().soil_moisture() - 20.0).abs() < 1e-12);
    }
}
