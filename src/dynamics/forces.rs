use crate::core::particle::{Particle, ParticleSystem};
use glam::Vec3;

/// Trait describing an external force generator applied to particles.
pub trait ForceGenerator: Send + Sync {
    fn apply(&self, particle: &mut Particle, dt: f32);
}

/// Uniform gravitational acceleration.
pub struct GravityForce {
    pub gravity: Vec3,
}

impl GravityForce {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl ForceGenerator for GravityForce {
    fn apply(&self, particle: &mut Particle, _dt: f32) {
        particle.apply_force(self.gravity * particle.mass);
    }
}

/// Collection of forces applied to every particle each step.
pub struct ForceRegistry {
    forces: Vec<Box<dyn ForceGenerator>>,
}

impl Default for ForceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ForceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForceRegistry")
            .field("forces", &self.forces.len())
            .finish()
    }
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self { forces: Vec::new() }
    }

    /// Registry holding a single [`GravityForce`].
    pub fn with_gravity(gravity: Vec3) -> Self {
        let mut registry = Self::new();
        registry.add_force(GravityForce::new(gravity));
        registry
    }

    pub fn add_force<F: ForceGenerator + 'static>(&mut self, force: F) {
        self.forces.push(Box::new(force));
    }

    pub fn clear(&mut self) {
        self.forces.clear();
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn apply_all(&self, system: &mut ParticleSystem, dt: f32) {
        for force in &self.forces {
            for particle in system.iter_mut() {
                force.apply(particle, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_scales_with_mass() {
        let mut system = ParticleSystem::new();
        system.add(Particle::at(Vec3::ZERO).with_mass(2.0));
        ForceRegistry::with_gravity(Vec3::new(0.0, -9.8, 0.0)).apply_all(&mut system, 1e-3);
        assert!((system[0].force.y + 19.6).abs() < 1e-5);
    }
}
