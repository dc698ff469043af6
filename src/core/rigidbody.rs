use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::types::{InertiaTensorExt, OrientationIntegration};
use crate::{
    error::{ensure_positive, Result, SimError},
    utils::math::{orthonormality_error, orthonormalize, rotation_from_angular_velocity, skew},
};

/// Box-shaped rigid body integrated in momentum form.
///
/// Offsets passed to [`RigidBody::add_force`], [`RigidBody::add_impulse`] and
/// [`RigidBody::velocity_at`] are world-frame vectors from the center of mass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    position: Vec3,
    momentum: Vec3,
    orientation: Mat3,
    angular_momentum: Vec3,
    /// Body-frame inertia tensor (diagonal for a box).
    inertia: Mat3,
    inverse_inertia: Mat3,
    force: Vec3,
    torque: Vec3,
    mass: f32,
    size: Vec3,
    pub orientation_integration: OrientationIntegration,
    pub reorthonormalize: bool,
}

impl RigidBody {
    /// Creates a solid box of full extents `size`.
    pub fn new(
        center: Vec3,
        orientation: Mat3,
        angular_momentum: Vec3,
        size: Vec3,
        mass: f32,
    ) -> Result<Self> {
        ensure_positive("mass", mass)?;
        ensure_positive("size.x", size.x)?;
        ensure_positive("size.y", size.y)?;
        ensure_positive("size.z", size.z)?;
        if !center.is_finite() || !angular_momentum.is_finite() {
            return Err(SimError::invalid("center", "state must be finite"));
        }
        if orthonormality_error(&orientation) > 1e-3 || orientation.determinant() <= 0.0 {
            return Err(SimError::invalid(
                "orientation",
                "must be a proper rotation matrix",
            ));
        }

        let inertia = Mat3::for_solid_box(size * 0.5, mass);
        Ok(Self {
            position: center,
            momentum: Vec3::ZERO,
            orientation,
            angular_momentum,
            inertia,
            inverse_inertia: inertia.inverse(),
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            mass,
            size,
            orientation_integration: OrientationIntegration::default(),
            reorthonormalize: true,
        })
    }

    /// Unit box of mass 1 resting in identity orientation at `center`.
    pub fn unit_box(center: Vec3) -> Result<Self> {
        Self::new(center, Mat3::IDENTITY, Vec3::ZERO, Vec3::ONE, 1.0)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Mat3 {
        self.orientation
    }

    pub fn momentum(&self) -> Vec3 {
        self.momentum
    }

    pub fn angular_momentum(&self) -> Vec3 {
        self.angular_momentum
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn body_inertia(&self) -> Mat3 {
        self.inertia
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.momentum / self.mass
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.momentum = velocity * self.mass;
    }

    pub fn set_angular_momentum(&mut self, angular_momentum: Vec3) {
        self.angular_momentum = angular_momentum;
    }

    /// Accumulated force and torque since the last update.
    pub fn accumulated_wrench(&self) -> (Vec3, Vec3) {
        (self.force, self.torque)
    }

    /// World-frame inertia `A·I·Aᵀ`.
    pub fn world_inertia(&self) -> Mat3 {
        self.orientation * self.inertia * self.orientation.transpose()
    }

    /// World-frame inverse inertia `A·I⁻¹·Aᵀ`.
    pub fn inverse_world_inertia(&self) -> Mat3 {
        self.orientation * self.inverse_inertia * self.orientation.transpose()
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.inverse_world_inertia() * self.angular_momentum
    }

    /// Offset from the center of mass to a world-space point.
    pub fn offset(&self, point: Vec3) -> Vec3 {
        point - self.position
    }

    pub fn velocity_at(&self, offset: Vec3) -> Vec3 {
        self.linear_velocity() + self.angular_velocity().cross(offset)
    }

    pub fn add_force(&mut self, force: Vec3, offset: Vec3) {
        self.force += force;
        self.torque += offset.cross(force);
    }

    pub fn add_impulse(&mut self, impulse: Vec3, offset: Vec3) {
        self.momentum += impulse;
        self.angular_momentum += offset.cross(impulse);
    }

    /// Homogeneous world transform (rotation then translation).
    pub fn transform(&self) -> Mat4 {
        let mut matrix = Mat4::from_mat3(self.orientation);
        matrix.w_axis = self.position.extend(1.0);
        matrix
    }

    /// World positions of the 8 box corners.
    pub fn corners(&self) -> [Vec3; 8] {
        let h = self.size * 0.5;
        let local = [
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        local.map(|corner| self.position + self.orientation * corner)
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.momentum.length_squared() / self.mass
            + 0.5 * self.angular_momentum.dot(self.angular_velocity())
    }

    pub fn orthonormality_error(&self) -> f32 {
        orthonormality_error(&self.orientation)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.momentum.is_finite()
            && self.angular_momentum.is_finite()
            && self.orientation.is_finite()
    }

    /// Integrates the accumulated wrench over `dt` and clears it.
    pub fn update(&mut self, dt: f32) {
        self.momentum += self.force * dt;
        self.position += self.momentum / self.mass * dt;

        self.angular_momentum += self.torque * dt;
        let omega = self.angular_velocity();
        match self.orientation_integration {
            OrientationIntegration::Exponential => {
                self.orientation = rotation_from_angular_velocity(omega, dt) * self.orientation;
            }
            OrientationIntegration::Linearized => {
                self.orientation += skew(omega) * self.orientation * dt;
            }
        }
        if self.reorthonormalize {
            self.orientation = orthonormalize(&self.orientation);
        }

        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_center_force_produces_torque() {
        let mut body = RigidBody::unit_box(Vec3::ZERO).unwrap();
        body.add_force(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        let (force, torque) = body.accumulated_wrench();
        assert_eq!(force, Vec3::Z);
        assert!((torque - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-6);

        body.update(0.1);
        assert_eq!(body.accumulated_wrench(), (Vec3::ZERO, Vec3::ZERO));
    }

    #[test]
    fn transform_places_translation_in_last_column() {
        let body = RigidBody::unit_box(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let m = body.transform();
        assert_eq!(m.w_axis, glam::Vec4::new(1.0, 2.0, 3.0, 1.0));
        let corner = m.transform_point3(Vec3::splat(0.5));
        assert!((corner - Vec3::new(1.5, 2.5, 3.5)).length() < 1e-6);
    }

    #[test]
    fn rejects_non_positive_mass() {
        let result = RigidBody::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::ZERO, Vec3::ONE, 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn impulse_at_offset_spins_the_body() {
        let mut body = RigidBody::unit_box(Vec3::ZERO).unwrap();
        body.add_impulse(Vec3::Y, Vec3::X * 0.5);
        assert!((body.linear_velocity() - Vec3::Y).length() < 1e-6);
        // I = m/6 for a unit cube, so ω = 6 · (0.5 x̂ × ŷ).
        assert!((body.angular_velocity() - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-4);
    }
}
