//! Core state containers shared by every simulator.

pub mod particle;
pub mod rigidbody;
pub mod types;

pub use particle::{Particle, ParticleSystem};
pub use rigidbody::RigidBody;
pub use types::{
    ElasticMaterial, FloorContact, FluidParameters, GridLayout, InertiaTensorExt,
    OrientationIntegration, RigidBodySettings,
};
