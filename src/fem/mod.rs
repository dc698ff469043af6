//! Tetrahedral finite-element model of an elastic solid.

pub mod grid;
pub mod tetrahedron;

pub use grid::{ElasticGrid, NodalForceModel};
pub use tetrahedron::Tetrahedron;
