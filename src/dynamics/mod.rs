//! Simulation dynamics: integration, external forces and the rigid-body driver.

pub mod forces;
pub mod integrator;
pub mod parallel;
pub mod rigid;

pub use forces::{ForceGenerator, ForceRegistry, GravityForce};
pub use integrator::Integrator;
pub use rigid::RigidBodySimulator;
