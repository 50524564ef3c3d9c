//! Hillslope routing between soil columns

pub mod chain;

pub use chain::{ChainError, ColumnInflow, HillslopeChain};
