//! physim – small physically-based simulators for Rust.
//!
//! Three independent simulators share one particle container and one symplectic Euler
//! integrator:
//!
//! - [`ElasticGrid`]: a tetrahedral finite-element solid (St. Venant-Kirchhoff);
//! - [`SphSimulator`]: a weakly compressible SPH fluid backed by a spatial hash;
//! - [`RigidBodySimulator`]: one rigid box with impulse-based ground contact.
//!
//! Each implements [`Simulation`] and can be advanced directly with
//! [`Simulation::update`] or at a fixed rate through [`PhysicsWorld`].

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod fem;
pub mod sph;
pub mod utils;
pub mod world;

pub use glam::{Mat3, Mat4, Quat, UVec3, Vec3};

pub use collision::{
    ground::{ContactImpulse, ContactModel, GroundCollision},
    neighbor::NeighborSearch,
};
pub use core::{
    particle::{Particle, ParticleSystem},
    rigidbody::RigidBody,
    types::{
        ElasticMaterial, FloorContact, FluidParameters, GridLayout, InertiaTensorExt,
        OrientationIntegration, RigidBodySettings,
    },
};
pub use dynamics::{
    forces::{ForceGenerator, ForceRegistry, GravityForce},
    integrator::Integrator,
    rigid::RigidBodySimulator,
};
pub use error::{Result, SimError};
pub use fem::{ElasticGrid, NodalForceModel, Tetrahedron};
pub use sph::{CubicSpline, Field, SphSimulator};
pub use utils::StepProfiler;
pub use world::{PhysicsWorld, Simulation};
