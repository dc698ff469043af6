use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_CONTACT_FRICTION, DEFAULT_RESTITUTION},
    core::rigidbody::RigidBody,
    error::{ensure_non_negative, Result},
};

/// Impulses applied by one contact resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactImpulse {
    pub point: Vec3,
    pub normal: Vec3,
    pub normal_impulse: f32,
    /// Friction impulse actually applied (already opposing the sliding direction).
    pub tangent_impulse: Vec3,
}

/// Collision strategy for a single rigid body.
pub trait ContactModel: Send + Sync {
    /// Returns the world-space contact point, if the body touches the obstacle.
    fn detect(&self, body: &RigidBody) -> Option<Vec3>;

    /// Detects contact and applies the response impulses to `body`.
    fn compute(&self, body: &mut RigidBody) -> Option<ContactImpulse>;
}

/// Impulse response against the infinite plane `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundCollision {
    pub restitution: f32,
    pub friction: f32,
}

impl Default for GroundCollision {
    fn default() -> Self {
        Self {
            restitution: DEFAULT_RESTITUTION,
            friction: DEFAULT_CONTACT_FRICTION,
        }
    }
}

impl GroundCollision {
    pub const NORMAL: Vec3 = Vec3::Y;

    pub fn new(restitution: f32, friction: f32) -> Result<Self> {
        ensure_non_negative("restitution", restitution)?;
        ensure_non_negative("friction", friction)?;
        Ok(Self {
            restitution,
            friction,
        })
    }

    /// `1/m + d·((I⁻¹(r×d))×r)`: inverse effective mass along `direction` at offset `r`.
    fn inverse_effective_mass(body: &RigidBody, r: Vec3, direction: Vec3) -> f32 {
        let inverse_inertia = body.inverse_world_inertia();
        1.0 / body.mass() + direction.dot((inverse_inertia * r.cross(direction)).cross(r))
    }
}

impl ContactModel for GroundCollision {
    fn detect(&self, body: &RigidBody) -> Option<Vec3> {
        let mut sum = Vec3::ZERO;
        let mut count = 0;
        for corner in body.corners() {
            if corner.y <= 0.0 {
                sum += corner;
                count += 1;
            }
        }
        (count > 0).then(|| sum / count as f32)
    }

    fn compute(&self, body: &mut RigidBody) -> Option<ContactImpulse> {
        let point = self.detect(body)?;
        let n = Self::NORMAL;
        let r = body.offset(point);
        let v = body.velocity_at(r);
        let approach = v.dot(n);
        if approach >= 0.0 {
            return None;
        }

        let j_n = -(1.0 + self.restitution) * approach / Self::inverse_effective_mass(body, r, n);
        body.add_impulse(j_n * n, r);

        let v_t = v - approach * n;
        let sliding = v_t.length();
        let mut tangent_impulse = Vec3::ZERO;
        if sliding > f32::EPSILON {
            let t = v_t / sliding;
            let j_t = sliding / Self::inverse_effective_mass(body, r, t);
            tangent_impulse = -(self.friction * j_n.abs()).min(j_t) * t;
            body.add_impulse(tangent_impulse, r);
        }

        Some(ContactImpulse {
            point,
            normal: n,
            normal_impulse: j_n,
            tangent_impulse,
        })
    }
}
