//! Soil column parameter record
//!
//! Parameters are given the way field data is usually reported: moisture as
//! volumetric fractions (m/m) and profile depth in millimetres. The column
//! converts them to depth-normalised stores (mm) on construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Construction parameters for a single soil column
///
/// `Default` gives the reference dry-soil storm setup: 12 mm/h final
/// infiltration, 4% initial moisture, 38% saturated moisture, 500 mm deep
/// profile on a 5° slope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilParameters {
    /// Final (saturated) infiltration rate (mm/h)
    pub final_infilt_rate: f64,
    /// Initial volumetric soil moisture (m/m)
    pub initial_moisture_fraction: f64,
    /// Saturated volumetric soil moisture (m/m)
    pub saturated_moisture_fraction: f64,
    /// Unsaturated-flow shape parameter (mm)
    pub transmissivity: f64,
    /// Soil profile depth (mm)
    pub depth_mm: f64,
    /// Surface slope (degrees)
    pub slope_degrees: f64,
}

impl Default for SoilParameters {
    fn default() -> Self {
        Self {
            final_infilt_rate: 12.0,
            initial_moisture_fraction: 0.04,
            saturated_moisture_fraction: 0.38,
            transmissivity: 10.0,
            depth_mm: 500.0,
            slope_degrees: 5.0,
        }
    }
}

impl SoilParameters {
    /// Saturated moisture store (mm) = saturated fraction × depth
    pub fn saturated_capacity(&self) -> f64 {
        self.saturated_moisture_fraction * self.depth_mm
    }

    /// Initial moisture store (mm) = initial fraction × depth
    pub fn initial_moisture(&self) -> f64 {
        self.initial_moisture_fraction * self.depth_mm
    }

    /// Check the parameter set can drive a column
    ///
    /// Initial moisture must be strictly positive because infiltration is
    /// computed as capacity / moisture on the first step, and may not exceed
    /// the saturated fraction.
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let fields = [
            ("final_infilt_rate", self.final_infilt_rate),
            ("initial_moisture_fraction", self.initial_moisture_fraction),
            ("saturated_moisture_fraction", self.saturated_moisture_fraction),
            ("transmissivity", self.transmissivity),
            ("depth_mm", self.depth_mm),
            ("slope_degrees", self.slope_degrees),
        ];
        if let Some((name, value)) = fields.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ParameterError::NotFinite { name, value });
        }

        if self.final_infilt_rate < 0.0 {
            return Err(ParameterError::Negative {
                name: "final_infilt_rate",
                value: self.final_infilt_rate,
            });
        }

        let positive = [
            ("initial_moisture_fraction", self.initial_moisture_fraction),
            ("saturated_moisture_fraction", self.saturated_moisture_fraction),
            ("transmissivity", self.transmissivity),
            ("depth_mm", self.depth_mm),
        ];
        if let Some((name, value)) = positive.into_iter().find(|(_, v)| *v <= 0.0) {
            return Err(ParameterError::NotPositive { name, value });
        }

        if self.initial_moisture_fraction > self.saturated_moisture_fraction {
            return Err(ParameterError::OverSaturated {
                initial: self.initial_moisture_fraction,
                saturated: self.saturated_moisture_fraction,
            });
        }

        Ok(())
    }
}

/// Errors raised when a parameter set cannot drive a soil column
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// Value is NaN or infinite
    NotFinite { name: &'static str, value: f64 },
    /// Rate must be zero or greater
    Negative { name: &'static str, value: f64 },
    /// Value must be strictly greater than zero
    NotPositive { name: &'static str, value: f64 },
    /// Initial moisture fraction exceeds the saturated fraction
    OverSaturated { initial: f64, saturated: f64 },
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterError::NotFinite { name, value } => {
                write!(f, "{name} must be finite (got {value})")
            }
            ParameterError::Negative { name, value } => {
                write!(f, "{name} must not be negative (got {value})")
            }
            ParameterError::NotPositive { name, value } => {
                write!(f, "{name} must be greater than zero (got {value})")
            }
            ParameterError::OverSaturated { initial, saturated } => write!(
                f,
                "initial moisture fraction {initial} exceeds saturated fraction {saturated}"
            ),
        }
    }
}

impl std::error::Error for ParameterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_derived_stores() {
        let p = SoilParameters::default();
        assert!((p.saturated_capacity() - 190.0).abs() < 1e-12);
        assert!((p.initial_moisture() - 20.0).abs() < 1e-12);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_zero_initial_moisture_rejected() {
        let p = SoilParameters {
            initial_moisture_fraction: 0.0,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ParameterError::NotPositive {
                name: "initial_moisture_fraction",
                value: 0.0
            })
        );
    }

    #[test]
    fn test_initial_moisture_above_saturation_rejected() {
        let p = SoilParameters {
            initial_moisture_fraction: 0.5,
            ..Default::default()
        };
        assert_eq!(
            p.validate(),
            Err(ParameterError::OverSaturated {
                initial: 0.5,
                saturated: 0.38
            })
        );

        // A profile may start exactly saturated
        let saturated = SoilParameters {
            initial_moisture_fraction: 0.38,
            ..Default::default()
        };
        assert!(saturated.validate().is_ok());
    }

    #[test]
    fn test_negative_infiltration_rejected() {
        let p = SoilParameters {
            final_infilt_rate: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParameterError::Negative { name: "final_infilt_rate", .. })
        ));
    }

    #[test]
    fn test_nan_rejected_before_sign_checks() {
        let p = SoilParameters {
            depth_mm: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParameterError::NotFinite { name: "depth_mm", .. })
        ));
    }

    #[test]
    fn test_zero_final_rate_and_flat_slope_allowed() {
        let p = SoilParameters {
            final_infilt_rate: 0.0,
            slope_degrees: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let p: SoilParameters = serde_json::from_str(r#"{ "final_infilt_rate": 5.0 }"#).unwrap();
        assert_eq!(p.final_infilt_rate, 5.0);
        assert_eq!(p.depth_mm, 500.0);
    }

    #[test]
    fn test_error_display() {
        let e = ParameterError::NotPositive {
            name: "depth_mm",
            value: -2.0,
        };
        assert_eq!(e.to_string(), "depth_mm must be greater than zero (got -2)");
    }
}
