use glam::{Mat3, Quat, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    config::{
        DEFAULT_BOX_HALF_EXTENT, DEFAULT_BOX_HEIGHT, DEFAULT_BOX_STIFFNESS, DEFAULT_BUCKET_COUNT,
        DEFAULT_DENSITY_TOLERANCE, DEFAULT_DIVERGENCE_SPEED, DEFAULT_FLOOR_FRICTION,
        DEFAULT_FLUID_STIFFNESS, DEFAULT_GRAVITY, DEFAULT_KERNEL_RADIUS,
        DEFAULT_MAX_MASS_ITERATIONS, DEFAULT_ORTHONORMALITY_TOLERANCE, DEFAULT_POISSON_RATIO,
        DEFAULT_REST_DENSITY, DEFAULT_SOLID_DENSITY, DEFAULT_VISCOSITY, DEFAULT_YOUNGS_MODULUS,
    },
    error::{ensure_non_negative, ensure_positive, Result, SimError},
};

/// Placement and resolution of an elastic particle lattice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub origin: Vec3,
    pub rotation: Quat,
    /// Spacing between neighboring lattice particles along each local axis.
    pub cell_size: Vec3,
    /// Number of particles along each local axis (at least 2).
    pub dimensions: UVec3,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            origin: Vec3::new(0.5, 2.0, 0.5),
            rotation: Quat::IDENTITY,
            cell_size: Vec3::splat(0.5),
            dimensions: UVec3::splat(4),
        }
    }
}

impl GridLayout {
    pub fn new(origin: Vec3, rotation: Quat, cell_size: Vec3, dimensions: UVec3) -> Self {
        Self {
            origin,
            rotation,
            cell_size,
            dimensions,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.origin.is_finite() {
            return Err(SimError::invalid("origin", "must be finite"));
        }
        if !self.rotation.is_finite() || !self.rotation.is_normalized() {
            return Err(SimError::invalid("rotation", "must be a unit quaternion"));
        }
        ensure_positive("cell_size.x", self.cell_size.x)?;
        ensure_positive("cell_size.y", self.cell_size.y)?;
        ensure_positive("cell_size.z", self.cell_size.z)?;
        if self.dimensions.min_element() < 2 {
            return Err(SimError::invalid(
                "dimensions",
                format!("need at least 2 particles per axis, got {}", self.dimensions),
            ));
        }
        Ok(())
    }

    pub fn particle_count(&self) -> usize {
        self.dimensions.x as usize * self.dimensions.y as usize * self.dimensions.z as usize
    }

    pub fn cell_count(&self) -> usize {
        let cells = self.dimensions.saturating_sub(UVec3::ONE);
        cells.x as usize * cells.y as usize * cells.z as usize
    }
}

/// Material coefficients of an elastic solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticMaterial {
    pub youngs_modulus: f32,
    pub poisson_ratio: f32,
    /// Strain-rate damping `η`; zero disables the viscous term.
    pub damping: f32,
    pub density: f32,
}

impl Default for ElasticMaterial {
    fn default() -> Self {
        Self {
            youngs_modulus: DEFAULT_YOUNGS_MODULUS,
            poisson_ratio: DEFAULT_POISSON_RATIO,
            damping: 0.0,
            density: DEFAULT_SOLID_DENSITY,
        }
    }
}

impl ElasticMaterial {
    pub fn new(youngs_modulus: f32, poisson_ratio: f32, damping: f32, density: f32) -> Self {
        Self {
            youngs_modulus,
            poisson_ratio,
            damping,
            density,
        }
    }

    pub fn rubber() -> Self {
        Self::new(100.0, 0.45, 0.5, 1.1)
    }

    pub fn jelly() -> Self {
        Self::new(30.0, 0.3, 0.1, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("youngs_modulus", self.youngs_modulus)?;
        ensure_non_negative("damping", self.damping)?;
        ensure_positive("density", self.density)?;
        if !(0.0..0.5).contains(&self.poisson_ratio) {
            return Err(SimError::invalid(
                "poisson_ratio",
                format!("must lie in [0, 0.5), got {}", self.poisson_ratio),
            ));
        }
        Ok(())
    }

    /// Returns the Lamé parameters `(λ, μ)`.
    pub fn lame(&self) -> (f32, f32) {
        let e = self.youngs_modulus;
        let nu = self.poisson_ratio;
        let lambda = e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu));
        let mu = e / (2.0 * (1.0 + nu));
        (lambda, mu)
    }
}

/// Penalty-free floor response applied to elastic particles at `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorContact {
    pub enabled: bool,
    /// Fraction of downward speed reflected on impact; zero stops the particle.
    pub restitution: f32,
    pub friction: f32,
}

impl Default for FloorContact {
    fn default() -> Self {
        Self {
            enabled: true,
            restitution: 0.0,
            friction: DEFAULT_FLOOR_FRICTION,
        }
    }
}

impl FloorContact {
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("floor.restitution", self.restitution)?;
        ensure_non_negative("floor.friction", self.friction)
    }
}

/// Parameters of a weakly compressible SPH fluid and its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidParameters {
    /// Smoothing length `h`; particles interact within `2h`.
    pub kernel_radius: f32,
    pub stiffness: f32,
    pub rest_density: f32,
    pub viscosity: f32,
    pub box_x: f32,
    pub box_z: f32,
    pub box_height: f32,
    pub box_stiffness: f32,
    pub bucket_count: usize,
    pub density_tolerance: f32,
    pub max_mass_iterations: u32,
    pub divergence_speed: f32,
}

impl Default for FluidParameters {
    fn default() -> Self {
        Self {
            kernel_radius: DEFAULT_KERNEL_RADIUS,
            stiffness: DEFAULT_FLUID_STIFFNESS,
            rest_density: DEFAULT_REST_DENSITY,
            viscosity: DEFAULT_VISCOSITY,
            box_x: DEFAULT_BOX_HALF_EXTENT,
            box_z: DEFAULT_BOX_HALF_EXTENT,
            box_height: DEFAULT_BOX_HEIGHT,
            box_stiffness: DEFAULT_BOX_STIFFNESS,
            bucket_count: DEFAULT_BUCKET_COUNT,
            density_tolerance: DEFAULT_DENSITY_TOLERANCE,
            max_mass_iterations: DEFAULT_MAX_MASS_ITERATIONS,
            divergence_speed: DEFAULT_DIVERGENCE_SPEED,
        }
    }
}

impl FluidParameters {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("kernel_radius", self.kernel_radius)?;
        ensure_non_negative("stiffness", self.stiffness)?;
        ensure_positive("rest_density", self.rest_density)?;
        ensure_non_negative("viscosity", self.viscosity)?;
        ensure_positive("box_x", self.box_x)?;
        ensure_positive("box_z", self.box_z)?;
        ensure_non_negative("box_stiffness", self.box_stiffness)?;
        ensure_positive("density_tolerance", self.density_tolerance)?;
        ensure_positive("divergence_speed", self.divergence_speed)?;
        if self.bucket_count == 0 {
            return Err(SimError::invalid("bucket_count", "must be positive"));
        }
        if self.max_mass_iterations == 0 {
            return Err(SimError::invalid("max_mass_iterations", "must be positive"));
        }
        Ok(())
    }

    /// Support radius of the smoothing kernel.
    pub fn support_radius(&self) -> f32 {
        2.0 * self.kernel_radius
    }
}

/// How a rigid body's orientation is advanced from its angular velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OrientationIntegration {
    /// `A ← exp([ω]× dt)·A`, an exact rotation for constant ω.
    #[default]
    Exponential,
    /// `A ← A + [ω]×·A·dt`, first order and drifts off orthonormality.
    Linearized,
}

/// Integration settings for a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodySettings {
    pub orientation: OrientationIntegration,
    /// Re-orthonormalize the orientation after every update.
    pub reorthonormalize: bool,
    pub gravity: Vec3,
    pub orthonormality_tolerance: f32,
}

impl Default for RigidBodySettings {
    fn default() -> Self {
        Self {
            orientation: OrientationIntegration::default(),
            reorthonormalize: true,
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            orthonormality_tolerance: DEFAULT_ORTHONORMALITY_TOLERANCE,
        }
    }
}

/// Helper methods for inertia calculations.
pub trait InertiaTensorExt {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Mat3;
}

impl InertiaTensorExt for Mat3 {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Mat3 {
        let lx = half_extents.x * 2.0;
        let ly = half_extents.y * 2.0;
        let lz = half_extents.z * 2.0;
        let factor = mass / 12.0;
        Mat3::from_diagonal(Vec3::new(
            factor * (ly * ly + lz * lz),
            factor * (lx * lx + lz * lz),
            factor * (lx * lx + ly * ly),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lame_parameters_match_closed_form() {
        let material = ElasticMaterial::new(100.0, 0.25, 0.0, 1.0);
        let (lambda, mu) = material.lame();
        assert!((lambda - 40.0).abs() < 1e-4);
        assert!((mu - 40.0).abs() < 1e-4);
    }

    #[test]
    fn incompressible_poisson_ratio_is_rejected() {
        let material = ElasticMaterial::new(100.0, 0.5, 0.0, 1.0);
        assert!(matches!(
            material.validate(),
            Err(SimError::InvalidParameter {
                name: "poisson_ratio",
                ..
            })
        ));
    }

    #[test]
    fn layout_requires_two_particles_per_axis() {
        let mut layout = GridLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.particle_count(), 64);
        assert_eq!(layout.cell_count(), 27);

        layout.dimensions = UVec3::new(4, 1, 4);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn unit_cube_inertia_is_one_sixth_mass() {
        let inertia = Mat3::for_solid_box(Vec3::splat(0.5), 6.0);
        assert!((inertia.x_axis.x - 1.0).abs() < 1e-6);
        assert!((inertia.y_axis.y - 1.0).abs() < 1e-6);
        assert!((inertia.z_axis.z - 1.0).abs() < 1e-6);
    }
}
