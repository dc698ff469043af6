use crate::core::particle::{Particle, ParticleSystem};

use super::parallel;

/// Symplectic Euler integrator shared by the particle simulators.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    parallel: bool,
}

impl Integrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the data-parallel path (only effective with the `parallel` feature).
    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled;
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// `v += f/m·dt`, then `p += v·dt`.
    pub fn integrate_particle(particle: &mut Particle, dt: f32) {
        let acceleration = particle.force / particle.mass;
        particle.velocity += acceleration * dt;
        particle.position += particle.velocity * dt;
    }

    pub fn integrate(&self, system: &mut ParticleSystem, dt: f32) {
        if self.parallel {
            parallel::for_each_mut(system.as_mut_slice(), |particle| {
                Self::integrate_particle(particle, dt)
            });
        } else {
            for particle in system.iter_mut() {
                Self::integrate_particle(particle, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn velocity_is_updated_before_position() {
        let mut system = ParticleSystem::new();
        let mut particle = Particle::at(Vec3::ZERO).with_mass(2.0);
        particle.force = Vec3::new(4.0, 0.0, 0.0);
        system.add(particle);

        Integrator::new().integrate(&mut system, 0.5);

        assert_eq!(system[0].velocity, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(system[0].position, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn parallel_and_sequential_paths_agree() {
        let build = || -> ParticleSystem {
            (0..64)
                .map(|i| {
                    let mut p = Particle::at(Vec3::splat(i as f32)).with_mass(1.0 + i as f32);
                    p.force = Vec3::new(i as f32, -9.8, 0.5);
                    p
                })
                .collect()
        };
        let mut a = build();
        let mut b = build();
        let mut parallel = Integrator::new();
        parallel.set_parallel(true);

        Integrator::new().integrate(&mut a, 1e-2);
        parallel.integrate(&mut b, 1e-2);

        assert_eq!(a.as_slice(), b.as_slice());
    }
}
