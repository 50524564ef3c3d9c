//! Core types and utilities

pub mod units;

pub use units::{Degrees, Radians};
