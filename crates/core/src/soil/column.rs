//! Leaky-bucket soil column
//!
//! A single vertical soil profile whose moisture store is filled by rainfall,
//! runon and subsurface inflow from upslope, and emptied by Hortonian
//! overland flow, lateral subsurface flow and vertical drainage. Each call to
//! [`SoilColumn::advance`] is one explicit Euler step.
//!
//! # Scientific References
//! - Wainwright, J. & Parsons, A.J. (2002). "The effect of temporal variations
//!   in rainfall on scale dependency in runoff coefficients"
//!   Water Resources Research, 38(12), 1271

use super::parameters::{ParameterError, SoilParameters};
use crate::core_types::units::{Degrees, Radians};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Moisture (mm) a column is reset to when a step would leave it dry or negative
pub const DRY_SOIL_MOISTURE: f64 = 1.0e-6;

/// Rates and state produced by one [`SoilColumn::advance`] call
///
/// All rates are in mm/h, `soil_moisture` in mm and `relative_moisture` is
/// the dimensionless ratio moisture / saturated capacity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StepResult {
    pub infiltration_rate: f64,
    pub overland_flow: f64,
    pub subsurface_flow: f64,
    pub drainage: f64,
    pub relative_moisture: f64,
    pub soil_moisture: f64,
}

/// One soil profile at a point on the hillslope
#[derive(Debug, Clone, PartialEq)]
pub struct SoilColumn {
    // Parameters
    final_infilt_rate: f64,
    /// `final_infilt_rate - 1`, the bias term of the infiltration curve
    final_infilt_prime: f64,
    saturated_capacity: f64,
    transmissivity: f64,
    depth_mm: f64,
    slope: Radians,

    // State
    soil_moisture: f64,

    // Process rates from the last step
    infiltration_rate: f64,
    overland_flow: f64,
    subsurface_flow: f64,
    drainage: f64,
    relative_moisture: f64,
}

impl SoilColumn {
    /// Create a column from a validated parameter set
    ///
    /// # Errors
    /// Returns [`ParameterError`] if the parameters fail
    /// [`SoilParameters::validate`].
    pub fn new(parameters: &SoilParameters) -> Result<Self, ParameterError> {
        parameters.validate()?;

        let mut column = Self {
            final_infilt_rate: 0.0,
            final_infilt_prime: 0.0,
            saturated_capacity: 0.0,
            transmissivity: 0.0,
            depth_mm: 0.0,
            slope: Radians::default(),
            soil_moisture: 0.0,
            infiltration_rate: 0.0,
            overland_flow: 0.0,
            subsurface_flow: 0.0,
            drainage: 0.0,
            relative_moisture: 0.0,
        };
        column.apply_parameters(parameters);

        debug!(
            "Soil column created: capacity={:.2}mm, moisture={:.2}mm, slope={}",
            column.saturated_capacity,
            column.soil_moisture,
            Degrees::new(parameters.slope_degrees)
        );

        Ok(column)
    }

    /// Replace parameters and re-initialise moisture in place
    ///
    /// Rates from the previous step are left as they were until the next
    /// [`advance`](Self::advance).
    ///
    /// # Errors
    /// Returns [`ParameterError`] and leaves the column untouched if the new
    /// parameters are invalid.
    pub fn reset(&mut self, parameters: &SoilParameters) -> Result<(), ParameterError> {
        parameters.validate()?;
        self.apply_parameters(parameters);
        Ok(())
    }

    fn apply_parameters(&mut self, parameters: &SoilParameters) {
        self.final_infilt_rate = parameters.final_infilt_rate;
        self.final_infilt_prime = parameters.final_infilt_rate - 1.0;
        self.saturated_capacity = parameters.saturated_capacity();
        self.transmissivity = parameters.transmissivity;
        self.depth_mm = parameters.depth_mm;
        self.slope = Degrees::new(parameters.slope_degrees).to_radians();
        self.soil_moisture = parameters.initial_moisture();
        self.relative_moisture = self.soil_moisture / self.saturated_capacity;
    }

    /// Advance the water balance by one timestep
    ///
    /// # Arguments
    /// * `rainfall` - Rainfall rate (mm/h)
    /// * `runon` - Overland flow arriving from upslope (mm/h)
    /// * `subsurface_inflow` - Subsurface flow arriving from upslope (mm/h)
    /// * `dt_hours` - Timestep (hours)
    ///
    /// # Returns
    /// Snapshot of the rates and moisture after the step
    pub fn advance(
        &mut self,
        rainfall: f64,
        runon: f64,
        subsurface_inflow: f64,
        dt_hours: f64,
    ) -> StepResult {
        debug_assert!(self.soil_moisture > 0.0, "soil moisture must stay positive");
        debug_assert!(dt_hours > 0.0, "timestep must be positive");

        // Infiltration capacity rises without bound as the profile dries
        self.infiltration_rate =
            self.final_infilt_prime + self.saturated_capacity / self.soil_moisture;

        // Hortonian (infiltration-excess) overland flow
        let inflow = rainfall + runon;
        self.overland_flow = if inflow > self.infiltration_rate {
            inflow - self.infiltration_rate
        } else {
            0.0
        };

        let ssf_const = self.final_infilt_rate
            * (-(self.saturated_capacity - self.soil_moisture) / self.transmissivity).exp();
        self.subsurface_flow = ssf_const * self.slope.sin();
        self.drainage = ssf_const * self.slope.cos();
        if self.subsurface_flow < 0.0 {
            warn!(
                saturated_capacity = self.saturated_capacity,
                soil_moisture = self.soil_moisture,
                ssf_const,
                slope = self.slope.value(),
                sin_slope = self.slope.sin(),
                subsurface_flow = self.subsurface_flow,
                "Negative subsurface flow"
            );
        }

        let delta = dt_hours
            * (rainfall + runon + subsurface_inflow
                - self.overland_flow
                - self.subsurface_flow
                - self.drainage);
        self.soil_moisture += delta;

        if self.soil_moisture > self.saturated_capacity {
            // Saturation-excess overland flow
            let overflow = self.soil_moisture - self.saturated_capacity;
            self.overland_flow += overflow;
            self.soil_moisture = self.saturated_capacity;
            debug!(overflow, "Column saturated");
        } else if self.soil_moisture <= 0.0 {
            debug!(
                soil_moisture = self.soil_moisture,
                "Column dried out, applying moisture floor"
            );
            self.soil_moisture = DRY_SOIL_MOISTURE;
            self.overland_flow = 0.0;
        }

        self.relative_moisture = self.soil_moisture / self.saturated_capacity;

        self.last_step()
    }

    /// Snapshot of the current state and last-computed rates
    pub fn last_step(&self) -> StepResult {
        StepResult {
            infiltration_rate: self.infiltration_rate,
            overland_flow: self.overland_flow,
            subsurface_flow: self.subsurface_flow,
            drainage: self.drainage,
            relative_moisture: self.relative_moisture,
            soil_moisture: self.soil_moisture,
        }
    }

    /// Current moisture store (mm)
    pub fn soil_moisture(&self) -> f64 {
        self.soil_moisture
    }

    /// Saturated moisture store (mm)
    pub fn saturated_capacity(&self) -> f64 {
        self.saturated_capacity
    }

    /// Moisture relative to saturation (0-1]
    pub fn relative_moisture(&self) -> f64 {
        self.relative_moisture
    }

    pub fn infiltration_rate(&self) -> f64 {
        self.infiltration_rate
    }

    pub fn overland_flow(&self) -> f64 {
        self.overland_flow
    }

    pub fn subsurface_flow(&self) -> f64 {
        self.subsurface_flow
    }

    pub fn drainage(&self) -> f64 {
        self.drainage
    }

    pub fn final_infilt_rate(&self) -> f64 {
        self.final_infilt_rate
    }

    pub fn transmissivity(&self) -> f64 {
        self.transmissivity
    }

    pub fn depth_mm(&self) -> f64 {
        self.depth_mm
    }

    pub fn slope(&self) -> Radians {
        self.slope
    }
}
