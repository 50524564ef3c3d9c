//! Downslope chain of soil columns
//!
//! Columns are owned by the chain and refer to each other by index. Each
//! column lists the columns directly upslope of it; on every step their
//! overland flow and subsurface flow, already updated for that same step,
//! become the column's runon and subsurface inflow.
//!
//! Links are checked as they are added so the upslope graph is always a DAG,
//! and the evaluation order is recomputed once per change rather than per
//! step.

use crate::soil::{SoilColumn, StepResult};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info};

/// Water a column received from upslope on the most recent step (mm/h)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnInflow {
    pub runon: f64,
    pub subsurface_inflow: f64,
}

/// Ordered collection of soil columns with upslope routing
#[derive(Debug, Clone, Default)]
pub struct HillslopeChain {
    columns: Vec<SoilColumn>,
    /// `upslope[i]` lists the columns draining directly into column `i`
    upslope: Vec<Vec<usize>>,
    inflows: Vec<ColumnInflow>,
    /// Upslope-before-downslope evaluation order
    order: Vec<usize>,
}

impl HillslopeChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a linear catena where column `i` drains into column `i + 1`
    pub fn linear(columns: Vec<SoilColumn>) -> Self {
        let len = columns.len();
        let upslope = (0..len)
            .map(|i| if i == 0 { Vec::new() } else { vec![i - 1] })
            .collect();

        info!("Linear hillslope chain created with {} columns", len);

        Self {
            columns,
            upslope,
            inflows: vec![ColumnInflow::default(); len],
            order: (0..len).collect(),
        }
    }

    /// Append an unlinked column, returning its index
    pub fn push(&mut self, column: SoilColumn) -> usize {
        let index = self.columns.len();
        self.columns.push(column);
        self.upslope.push(Vec::new());
        self.inflows.push(ColumnInflow::default());
        // A column with no links can be evaluated last
        self.order.push(index);
        index
    }

    /// Append a column fed by existing upslope columns
    ///
    /// # Errors
    /// Returns [`ChainError`] if any upslope index is out of range or listed
    /// twice. The column is not added in that case.
    pub fn push_linked(
        &mut self,
        column: SoilColumn,
        upslope: &[usize],
    ) -> Result<usize, ChainError> {
        let len = self.columns.len();
        for (position, &up) in upslope.iter().enumerate() {
            if up >= len {
                return Err(ChainError::ColumnOutOfRange { index: up, len });
            }
            if upslope[..position].contains(&up) {
                return Err(ChainError::DuplicateLink {
                    upslope: up,
                    downslope: len,
                });
            }
        }

        let index = self.push(column);
        self.upslope[index].extend_from_slice(upslope);
        Ok(index)
    }

    /// Route `upslope`'s outflow into `downslope`
    ///
    /// # Errors
    /// Returns [`ChainError`] for out-of-range indices, self-links, links that
    /// already exist, and links that would close a cycle.
    pub fn link(&mut self, upslope: usize, downslope: usize) -> Result<(), ChainError> {
        let len = self.columns.len();
        for index in [upslope, downslope] {
            if index >= len {
                return Err(ChainError::ColumnOutOfRange { index, len });
            }
        }
        if upslope == downslope {
            return Err(ChainError::SelfLink(upslope));
        }
        if self.upslope[downslope].contains(&upslope) {
            return Err(ChainError::DuplicateLink {
                upslope,
                downslope,
            });
        }
        if self.drains_into(downslope, upslope) {
            return Err(ChainError::Cycle {
                upslope,
                downslope,
            });
        }

        self.upslope[downslope].push(upslope);
        self.order = self.evaluation_order_from_links();
        debug!("Linked column {} -> {}", upslope, downslope);
        Ok(())
    }

    /// True if water leaving `from` eventually reaches `to`
    fn drains_into(&self, from: usize, to: usize) -> bool {
        // Walk upslope from `to` looking for `from`
        let mut visited = vec![false; self.columns.len()];
        let mut stack = vec![to];
        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            if visited[current] {
                continue;
            }
            visited[current] = true;
            stack.extend(self.upslope[current].iter().copied());
        }
        false
    }

    /// Kahn's algorithm, lowest index first among ready columns
    fn evaluation_order_from_links(&self) -> Vec<usize> {
        let len = self.columns.len();
        let mut downslope: Vec<Vec<usize>> = vec![Vec::new(); len];
        let mut pending: Vec<usize> = vec![0; len];
        for (index, ups) in self.upslope.iter().enumerate() {
            pending[index] = ups.len();
            for &up in ups {
                downslope[up].push(index);
            }
        }

        let mut ready: VecDeque<usize> = (0..len).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(len);
        while let Some(index) = ready.pop_front() {
            order.push(index);
            for &down in &downslope[index] {
                pending[down] -= 1;
                if pending[down] == 0 {
                    ready.push_back(down);
                }
            }
        }

        debug_assert_eq!(order.len(), len, "upslope links must form a DAG");
        order
    }

    /// Advance every column by one timestep under uniform rainfall
    ///
    /// # Arguments
    /// * `rainfall` - Rainfall rate applied to every column (mm/h)
    /// * `dt_hours` - Timestep (hours)
    pub fn step(&mut self, rainfall: f64, dt_hours: f64) {
        for position in 0..self.order.len() {
            let index = self.order[position];
            self.advance_column(index, rainfall, dt_hours);
        }

        debug!(
            "Hillslope step: dt={:.4}h, rainfall={:.2}mm/h, outlet={:?}",
            dt_hours,
            rainfall,
            self.outlet().map(|i| self.columns[i].soil_moisture())
        );
    }

    /// Advance every column by one timestep with per-column rainfall
    ///
    /// # Errors
    /// Returns [`ChainError::RainfallLength`] if `rainfall` does not have one
    /// entry per column. No column is advanced in that case.
    pub fn step_with_rainfall(
        &mut self,
        rainfall: &[f64],
        dt_hours: f64,
    ) -> Result<(), ChainError> {
        if rainfall.len() != self.columns.len() {
            return Err(ChainError::RainfallLength {
                expected: self.columns.len(),
                got: rainfall.len(),
            });
        }
        for position in 0..self.order.len() {
            let index = self.order[position];
            self.advance_column(index, rainfall[index], dt_hours);
        }
        Ok(())
    }

    fn advance_column(&mut self, index: usize, rainfall: f64, dt_hours: f64) -> StepResult {
        let inflow = self.upslope[index]
            .iter()
            .fold(ColumnInflow::default(), |acc, &up| ColumnInflow {
                runon: acc.runon + self.columns[up].overland_flow(),
                subsurface_inflow: acc.subsurface_inflow + self.columns[up].subsurface_flow(),
            });
        self.inflows[index] = inflow;
        self.columns[index].advance(rainfall, inflow.runon, inflow.subsurface_inflow, dt_hours)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&SoilColumn> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &[SoilColumn] {
        &self.columns
    }

    /// Columns draining directly into `index`
    pub fn upslope_of(&self, index: usize) -> Option<&[usize]> {
        self.upslope.get(index).map(Vec::as_slice)
    }

    /// Runon and subsurface inflow `index` received on the last step
    pub fn inflow(&self, index: usize) -> Option<ColumnInflow> {
        self.inflows.get(index).copied()
    }

    pub fn evaluation_order(&self) -> &[usize] {
        &self.order
    }

    /// Most downslope column: the last column in evaluation order that feeds
    /// no other column
    pub fn outlet(&self) -> Option<usize> {
        let mut feeds = vec![false; self.columns.len()];
        for &up in self.upslope.iter().flatten() {
            feeds[up] = true;
        }
        self.order.iter().rev().copied().find(|&i| !feeds[i])
    }
}

/// Errors raised while wiring or driving a hillslope chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Index does not name a column in the chain
    ColumnOutOfRange { index: usize, len: usize },
    /// Column cannot drain into itself
    SelfLink(usize),
    /// Link already exists
    DuplicateLink { upslope: usize, downslope: usize },
    /// Link would route water back upslope
    Cycle { upslope: usize, downslope: usize },
    /// Per-column rainfall does not match the number of columns
    RainfallLength { expected: usize, got: usize },
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::ColumnOutOfRange { index, len } => {
                write!(f, "Column {index} out of range for chain of {len} columns")
            }
            ChainError::SelfLink(index) => write!(f, "Column {index} cannot drain into itself"),
            ChainError::DuplicateLink { upslope, downslope } => {
                write!(f, "Column {upslope} already drains into column {downslope}")
            }
            ChainError::Cycle { upslope, downslope } => write!(
                f,
                "Linking column {upslope} into column {downslope} would create a cycle"
            ),
            ChainError::RainfallLength { expected, got } => {
                write!(f, "Expected rainfall for {expected} columns, got {got}")
            }
        }
    }
}

impl std::error::Error for ChainError {}
