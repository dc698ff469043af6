use std::ops::{Index, IndexMut};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Point mass shared by the elastic and fluid simulators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Force accumulator, rebuilt from zero every step.
    pub force: Vec3,
    pub mass: f32,
    /// Fluid density; unused by the elastic grid.
    pub density: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            mass: 0.0,
            density: 0.0,
        }
    }
}

impl Particle {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn apply_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_squared()
    }
}

/// Index-addressed particle collection.
///
/// Particles are only ever appended, so an index handed out by [`ParticleSystem::add`]
/// stays valid for the lifetime of the system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    /// Appends a particle and returns its stable index.
    pub fn add(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.particles.iter().map(|p| p.position)
    }

    pub fn clear_forces(&mut self) {
        for particle in &mut self.particles {
            particle.force = Vec3::ZERO;
        }
    }

    pub fn total_mass(&self) -> f32 {
        self.particles.iter().map(|p| p.mass).sum()
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    pub fn max_speed(&self) -> f32 {
        self.particles
            .iter()
            .map(|p| p.velocity.length())
            .fold(0.0, f32::max)
    }

    /// True when every position and velocity component is finite.
    pub fn is_finite(&self) -> bool {
        self.particles
            .iter()
            .all(|p| p.position.is_finite() && p.velocity.is_finite())
    }
}

impl Index<usize> for ParticleSystem {
    type Output = Particle;

    fn index(&self, index: usize) -> &Particle {
        &self.particles[index]
    }
}

impl IndexMut<usize> for ParticleSystem {
    fn index_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.particles[index]
    }
}

impl FromIterator<Particle> for ParticleSystem {
    fn from_iter<I: IntoIterator<Item = Particle>>(iter: I) -> Self {
        Self {
            particles: iter.into_iter().collect(),
        }
    }
}
