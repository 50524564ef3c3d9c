//! Scenario files
//!
//! A scenario names its columns, lists which named columns drain into each
//! one, and carries the driver settings. Names are resolved to chain indices
//! once, when the chain is built.
//!
//! ```json
//! {
//!   "steps": 60,
//!   "timestep_hours": 0.016666666666666666,
//!   "rainfall": { "kind": "constant", "rate": 20.0 },
//!   "columns": [
//!     { "name": "top", "parameters": { "final_infilt_rate": 5.0 } },
//!     { "name": "bottom", "parameters": { "final_infilt_rate": 5.0 }, "upslope": ["top"] }
//!   ],
//!   "observe": "bottom"
//! }
//! ```

use super::driver::SimulationSettings;
use super::rainfall::RainfallSchedule;
use crate::hillslope::{ChainError, HillslopeChain};
use crate::soil::{ParameterError, SoilColumn, SoilParameters};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

/// One named column in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default)]
    pub parameters: SoilParameters,
    /// Names of the columns draining directly into this one
    #[serde(default)]
    pub upslope: Vec<String>,
}

/// Complete description of a hillslope run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(flatten)]
    pub settings: SimulationSettings,
    pub columns: Vec<ColumnConfig>,
    /// Column to record; defaults to the chain outlet
    #[serde(default)]
    pub observe: Option<String>,
}

impl ScenarioConfig {
    /// Three identical columns in a line under a one-hour 20 mm/h storm
    pub fn reference_hillslope() -> Self {
        let parameters = SoilParameters {
            final_infilt_rate: 5.0,
            ..Default::default()
        };
        let names = ["top", "middle", "bottom"];
        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnConfig {
                name: (*name).to_string(),
                parameters,
                upslope: if i == 0 {
                    Vec::new()
                } else {
                    vec![names[i - 1].to_string()]
                },
            })
            .collect();

        Self {
            settings: SimulationSettings {
                steps: 60,
                timestep_hours: 1.0 / 60.0,
                rainfall: RainfallSchedule::Constant { rate: 20.0 },
            },
            columns,
            observe: Some("bottom".to_string()),
        }
    }

    /// Load a scenario from a JSON file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Parse a scenario from JSON text
    ///
    /// # Errors
    /// Returns [`ConfigError::ParseFailed`] for malformed JSON or missing fields
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    fn name_index(&self) -> Result<FxHashMap<&str, usize>, ConfigError> {
        let mut indices = FxHashMap::default();
        for (index, column) in self.columns.iter().enumerate() {
            if indices.insert(column.name.as_str(), index).is_some() {
                return Err(ConfigError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(indices)
    }

    /// Build the chain, resolving upslope names to column indices
    ///
    /// Column `i` of the scenario becomes column `i` of the chain.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for an empty scenario, duplicate or unknown
    /// names, invalid soil parameters, or links that form a cycle.
    pub fn build_chain(&self) -> Result<HillslopeChain, ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::NoColumns);
        }
        let indices = self.name_index()?;

        let mut chain = HillslopeChain::new();
        for column in &self.columns {
            let soil = SoilColumn::new(&column.parameters).map_err(|source| {
                ConfigError::InvalidParameters {
                    column: column.name.clone(),
                    source,
                }
            })?;
            chain.push(soil);
        }

        for (index, column) in self.columns.iter().enumerate() {
            for name in &column.upslope {
                let upslope = *indices
                    .get(name.as_str())
                    .ok_or_else(|| ConfigError::UnknownColumn {
                        column: column.name.clone(),
                        upslope: name.clone(),
                    })?;
                chain.link(upslope, index)?;
            }
        }

        info!(
            "Built hillslope from scenario: {} columns, evaluation order {:?}",
            chain.len(),
            chain.evaluation_order()
        );
        Ok(chain)
    }

    /// Index of the column to record
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownColumn`] if `observe` names no column,
    /// or [`ConfigError::NoColumns`] if the chain has no outlet.
    pub fn observed_index(&self, chain: &HillslopeChain) -> Result<usize, ConfigError> {
        match &self.observe {
            Some(name) => self
                .columns
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| ConfigError::UnknownColumn {
                    column: "observe".to_string(),
                    upslope: name.clone(),
                }),
            None => chain.outlet().ok_or(ConfigError::NoColumns),
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::reference_hillslope()
    }
}

/// Errors that can occur while loading or building a scenario
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read file
    LoadFailed(String),
    /// Failed to parse file contents
    ParseFailed(String),
    /// Scenario has no columns
    NoColumns,
    /// Two columns share a name
    DuplicateColumn(String),
    /// A column refers to a name that does not exist
    UnknownColumn { column: String, upslope: String },
    /// Soil parameters of a column are invalid
    InvalidParameters {
        column: String,
        source: ParameterError,
    },
    /// Links do not form a valid hillslope
    Chain(ChainError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            ConfigError::NoColumns => write!(f, "Scenario has no columns"),
            ConfigError::DuplicateColumn(name) => write!(f, "Duplicate column name '{name}'"),
            ConfigError::UnknownColumn { column, upslope } => {
                write!(f, "Column '{column}' refers to unknown column '{upslope}'")
            }
            ConfigError::InvalidParameters { column, source } => {
                write!(f, "Invalid parameters for column '{column}': {source}")
            }
            ConfigError::Chain(e) => write!(f, "Invalid hillslope links: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidParameters { source, .. } => Some(source),
            ConfigError::Chain(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChainError> for ConfigError {
    fn from(e: ChainError) -> Self {
        ConfigError::Chain(e)
    }
}
