//! Rainfall forcing schedules

use serde::{Deserialize, Serialize};

/// Rainfall rate (mm/h) as a function of step index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RainfallSchedule {
    /// Same rate on every step
    Constant { rate: f64 },
    /// `intensity` for the first `duration_steps` steps, dry afterwards
    Storm { intensity: f64, duration_steps: usize },
    /// Explicit per-step rates; dry past the end of the series
    Series { rates: Vec<f64> },
}

impl RainfallSchedule {
    pub fn rate_at(&self, step: usize) -> f64 {
        match self {
            RainfallSchedule::Constant { rate } => *rate,
            RainfallSchedule::Storm {
                intensity,
                duration_steps,
            } => {
                if step < *duration_steps {
                    *intensity
                } else {
                    0.0
                }
            }
            RainfallSchedule::Series { rates } => rates.get(step).copied().unwrap_or(0.0),
        }
    }
}

impl Default for RainfallSchedule {
    fn default() -> Self {
        RainfallSchedule::Storm {
            intensity: 20.0,
            duration_steps: 60,
        }
    }
}
