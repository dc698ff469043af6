//! Smoothed-particle hydrodynamics.

pub mod kernel;
pub mod simulator;

pub use kernel::{CubicSpline, Field};
pub use simulator::SphSimulator;
