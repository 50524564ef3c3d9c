//! Command-line pieces shared by the headless binaries

use clap::Args;
use hillslope_core::{
    OutputError, RainfallSchedule, SimulationSettings, SoilParameters, StepRecord, StepSink,
};
use tracing_subscriber::EnvFilter;

/// Log to stderr so the step tables on stdout stay clean; `RUST_LOG` overrides
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Soil parameter overrides; unset flags keep the built-in value
#[derive(Args, Debug)]
#[group(id = "soil_overrides", multiple = true)]
pub struct SoilArgs {
    /// Final infiltration rate in mm/h
    #[arg(long)]
    pub final_infilt_rate: Option<f64>,

    /// Initial soil moisture in m/m
    #[arg(long)]
    pub initial_moisture: Option<f64>,

    /// Saturated soil moisture in m/m
    #[arg(long)]
    pub saturated_moisture: Option<f64>,

    /// Soil transmissivity (unsaturated flow)
    #[arg(long)]
    pub transmissivity: Option<f64>,

    /// Soil depth in mm
    #[arg(long)]
    pub depth: Option<f64>,

    /// Surface slope in degrees
    #[arg(long)]
    pub slope: Option<f64>,
}

impl SoilArgs {
    pub fn apply(&self, base: SoilParameters) -> SoilParameters {
        SoilParameters {
            final_infilt_rate: self.final_infilt_rate.unwrap_or(base.final_infilt_rate),
            initial_moisture_fraction: self
                .initial_moisture
                .unwrap_or(base.initial_moisture_fraction),
            saturated_moisture_fraction: self
                .saturated_moisture
                .unwrap_or(base.saturated_moisture_fraction),
            transmissivity: self.transmissivity.unwrap_or(base.transmissivity),
            depth_mm: self.depth.unwrap_or(base.depth_mm),
            slope_degrees: self.slope.unwrap_or(base.slope_degrees),
        }
    }
}

/// Storm forcing and stepping
#[derive(Args, Debug)]
#[group(id = "storm", multiple = true)]
pub struct StormArgs {
    /// Rainfall rate during the storm in mm/h
    #[arg(short, long, default_value_t = 20.0)]
    pub rainfall: f64,

    /// Storm length in minutes
    #[arg(short, long, default_value_t = 60)]
    pub storm_length: u64,

    /// Dry period simulated after the storm, in minutes
    #[arg(long)]
    pub dry_length: Option<u64>,

    /// Timestep in minutes
    #[arg(
        short,
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timestep: u64,
}

impl StormArgs {
    /// Driver settings; `default_dry_length` (minutes) applies when `--dry-length` is unset
    ///
    /// # Errors
    /// Returns a message if the storm or dry period is not a whole number of
    /// timesteps.
    pub fn settings(&self, default_dry_length: u64) -> Result<SimulationSettings, String> {
        let dry_length = self.dry_length.unwrap_or(default_dry_length);
        for (flag, minutes) in [("storm length", self.storm_length), ("dry length", dry_length)] {
            if minutes % self.timestep != 0 {
                return Err(format!(
                    "{} of {} min is not a whole number of {} min timesteps",
                    flag, minutes, self.timestep
                ));
            }
        }

        let storm_steps = (self.storm_length / self.timestep) as usize;
        let dry_steps = (dry_length / self.timestep) as usize;
        Ok(SimulationSettings {
            steps: storm_steps + dry_steps,
            timestep_hours: self.timestep as f64 / 60.0,
            rainfall: RainfallSchedule::Storm {
                intensity: self.rainfall,
                duration_steps: storm_steps,
            },
        })
    }
}

/// Prints every `report_every`-th step as a table row
pub struct ConsoleTable {
    report_every: usize,
}

impl ConsoleTable {
    pub fn new(report_every: usize) -> Self {
        println!(
            "Time(h) | Rain(mm/h) | Infilt(mm/h) | SSF(mm/h) | Drain(mm/h) | Moist(mm) | OF(mm/h)"
        );
        println!(
            "--------|------------|--------------|-----------|-------------|-----------|---------"
        );
        Self {
            report_every: report_every.max(1),
        }
    }
}

impl StepSink for ConsoleTable {
    fn record(&mut self, record: &StepRecord) -> Result<(), OutputError> {
        if record.step % self.report_every == 0 {
            let r = &record.result;
            println!(
                "{:7.3} | {:10.2} | {:12.4} | {:9.2e} | {:11.2e} | {:9.3} | {:8.4}",
                record.time_hours,
                record.rainfall,
                r.infiltration_rate,
                r.subsurface_flow,
                r.drainage,
                r.soil_moisture,
                r.overland_flow
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct StormOnly {
        #[command(flatten)]
        storm: StormArgs,
    }

    #[test]
    fn test_zero_timestep_rejected() {
        assert!(StormOnly::try_parse_from(["storm", "--timestep", "0"]).is_err());
    }

    #[test]
    fn test_storm_must_be_whole_timesteps() {
        let args = StormOnly::try_parse_from(["storm", "-s", "5", "-t", "2"]).unwrap();
        assert!(args.storm.settings(0).is_err());

        let args = StormOnly::try_parse_from(["storm", "-s", "6", "-t", "2"]).unwrap();
        assert!(args.storm.settings(3).is_err());

        let settings = args.storm.settings(4).unwrap();
        assert_eq!(settings.steps, 5);
        assert!((settings.timestep_hours - 2.0 / 60.0).abs() < 1e-12);
        assert_eq!(settings.rainfall.rate_at(2), 20.0);
        assert_eq!(settings.rainfall.rate_at(3), 0.0);
    }

    #[test]
    fn test_default_storm_matches_reference() {
        let args = StormOnly::try_parse_from(["storm"]).unwrap();
        assert_eq!(
            args.storm.settings(60).unwrap(),
            SimulationSettings::reference_storm()
        );
    }
}
