use glam::{UVec3, Vec3};

use super::kernel::{CubicSpline, Field};
use crate::{
    collision::neighbor::NeighborSearch,
    config::DEFAULT_GRAVITY,
    core::{
        particle::{Particle, ParticleSystem},
        types::FluidParameters,
    },
    dynamics::{forces::ForceRegistry, integrator::Integrator, parallel},
    error::{ensure_non_negative, ensure_positive, Result, SimError},
    utils::logging::{report_divergence, ScopedTimer},
    world::Simulation,
};

/// Slack added before flooring the lattice extent so `max` itself is kept despite rounding.
const LATTICE_SLACK: f32 = 1e-4;

/// Weakly compressible SPH fluid inside an open-topped box.
#[derive(Debug)]
pub struct SphSimulator {
    params: FluidParameters,
    kernel: CubicSpline,
    particles: ParticleSystem,
    search: NeighborSearch,
    pressures: Vec<f32>,
    integrator: Integrator,
    forces: ForceRegistry,
    /// Set when positions may have changed since the last neighbor rebuild.
    neighbors_stale: bool,
    diverged: bool,
}

impl SphSimulator {
    /// Seeds particles on the `h`-spaced lattice inside `[min, max]` wherever `indicator`
    /// holds, then corrects their masses until the rest density is reproduced.
    pub fn new(
        min: Vec3,
        max: Vec3,
        indicator: impl Fn(Vec3) -> bool,
        params: FluidParameters,
    ) -> Result<Self> {
        params.validate()?;
        if !min.is_finite() || !max.is_finite() || max.cmplt(min).any() {
            return Err(SimError::invalid("bounds", "max must not be below min"));
        }

        let h = params.kernel_radius;
        let counts = ((max - min) / h + LATTICE_SLACK).floor().as_uvec3() + UVec3::ONE;
        let mass = h.powi(3) * params.rest_density;
        let mut particles = ParticleSystem::new();
        for i in 0..counts.x {
            for j in 0..counts.y {
                for k in 0..counts.z {
                    let position = min + UVec3::new(i, j, k).as_vec3() * h;
                    if indicator(position) {
                        let mut particle = Particle::at(position).with_mass(mass);
                        particle.density = params.rest_density;
                        particles.add(particle);
                    }
                }
            }
        }
        if particles.is_empty() {
            return Err(SimError::EmptyFluidRegion);
        }

        let mut search = NeighborSearch::new(params.support_radius(), params.bucket_count)?;
        search.update(&particles);

        let mut integrator = Integrator::new();
        integrator.set_parallel(cfg!(feature = "parallel"));

        let mut simulator = Self {
            params,
            kernel: CubicSpline::new(h),
            pressures: vec![0.0; particles.len()],
            particles,
            search,
            integrator,
            forces: ForceRegistry::with_gravity(Vec3::from_array(DEFAULT_GRAVITY)),
            neighbors_stale: false,
            diverged: false,
        };
        simulator.correct_masses()?;

        log::debug!(
            "sph: {} particles, total mass {:.4}, h={}",
            simulator.particles.len(),
            simulator.particles.total_mass(),
            h
        );
        Ok(simulator)
    }

    /// Gauss-Seidel sweeps of `m_i = (ρ₀ − Σ_{j≠i} m_j W_ij) / W_ii` until every particle
    /// sees the rest density. Returns the number of sweeps.
    fn correct_masses(&mut self) -> Result<u32> {
        let rest_density = self.params.rest_density;
        let self_weight = self.kernel.self_weight();
        let limit = self.params.max_mass_iterations;

        let mut sweep = 0;
        loop {
            let error = self.max_density_error();
            log::trace!("mass correction sweep {sweep}: density error {error:.3e}");
            if error < self.params.density_tolerance {
                log::info!("mass correction converged after {sweep} sweeps (error {error:.2e})");
                return Ok(sweep);
            }
            if sweep == limit {
                return Err(SimError::MassCorrectionDiverged {
                    iterations: limit,
                    error,
                });
            }

            for i in 0..self.particles.len() {
                let position = self.particles[i].position;
                let excluded: f32 = self
                    .search
                    .neighbors(i)
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| {
                        let other = &self.particles[j];
                        other.mass * self.kernel.value(position.distance(other.position))
                    })
                    .sum();
                let mass = (rest_density - excluded) / self_weight;
                if !(mass > 0.0) {
                    return Err(SimError::NonPositiveMass { index: i, mass });
                }
                self.particles[i].mass = mass;
            }
            sweep += 1;
        }
    }

    /// Largest `|Σ m_j W_ij − ρ₀| / ρ₀` over all particles, using the current neighbor lists.
    pub fn max_density_error(&self) -> f32 {
        let rest_density = self.params.rest_density;
        (0..self.particles.len())
            .map(|i| (self.summed_density(i) - rest_density).abs() / rest_density)
            .fold(0.0, f32::max)
    }

    fn summed_density(&self, i: usize) -> f32 {
        let position = self.particles[i].position;
        self.search
            .neighbors(i)
            .iter()
            .map(|&j| {
                let other = &self.particles[j];
                other.mass * self.kernel.value(position.distance(other.position))
            })
            .sum()
    }

    /// Kernel interpolation `Σ_j (m_j/ρ_j) A_j W_ij` of a per-particle field at particle `i`.
    pub fn value<T: Field>(&self, i: usize, field: impl Fn(usize) -> T) -> T {
        let position = self.particles[i].position;
        self.search.neighbors(i).iter().fold(T::ZERO, |acc, &j| {
            let other = &self.particles[j];
            let weight = other.mass / other.density
                * self.kernel.value(position.distance(other.position));
            acc + field(j) * weight
        })
    }

    /// Symmetric gradient `ρ_i Σ_j m_j (A_i/ρ_i² + A_j/ρ_j²) ⊗ ∇W_ij`.
    pub fn gradient<T: Field>(&self, i: usize, field: impl Fn(usize) -> T) -> T::Gradient {
        let particle = &self.particles[i];
        let own = field(i) * particle.density.powi(-2);
        let sum = self
            .search
            .neighbors(i)
            .iter()
            .fold(T::ZERO_GRADIENT, |acc, &j| {
                let other = &self.particles[j];
                let grad = self.kernel.gradient(particle.position - other.position);
                let combined = (own + field(j) * other.density.powi(-2)) * other.mass;
                acc + combined.outer(grad)
            });
        sum * particle.density
    }

    /// Laplacian `2 Σ_j (m_j/ρ_j)(A_i − A_j)(x_ij·∇W_ij)/(|x_ij|² + 0.01h²)`.
    pub fn laplacian<T: Field>(&self, i: usize, field: impl Fn(usize) -> T) -> T {
        let particle = &self.particles[i];
        let own = field(i);
        let eta_sq = 0.01 * self.params.kernel_radius * self.params.kernel_radius;
        let sum = self.search.neighbors(i).iter().fold(T::ZERO, |acc, &j| {
            let other = &self.particles[j];
            let x_ij = particle.position - other.position;
            let grad = self.kernel.gradient(x_ij);
            let weight = other.mass / other.density * x_ij.dot(grad) / (x_ij.length_squared() + eta_sq);
            acc + (own - field(j)) * weight
        });
        sum * 2.0
    }

    /// Pressure plus viscosity force on particle `i`.
    fn internal_force(&self, i: usize) -> Vec3 {
        let particle = &self.particles[i];
        let pressure = self.gradient(i, |j| self.pressures[j]) * (-particle.mass / particle.density);
        let viscosity =
            self.laplacian(i, |j| self.particles[j].velocity) * (particle.mass * self.params.viscosity);
        pressure + viscosity
    }

    fn equation_of_state(&self, density: f32) -> f32 {
        self.params.stiffness * ((density / self.params.rest_density).powi(7) - 1.0)
    }

    /// Penalty springs pushing particles back inside the floor and the four side walls.
    fn apply_box_penalty(&mut self) {
        let FluidParameters {
            box_x,
            box_z,
            box_stiffness,
            ..
        } = self.params;
        for particle in self.particles.iter_mut() {
            let p = particle.position;
            let penetration = Vec3::new(
                (-p.x - box_x).max(0.0) - (p.x - box_x).max(0.0),
                (-p.y).max(0.0),
                (-p.z - box_z).max(0.0) - (p.z - box_z).max(0.0),
            );
            particle.force += penetration * (box_stiffness * particle.mass);
        }
    }

    fn check_divergence(&mut self) {
        let speed = self.particles.max_speed();
        let bad = !self.particles.is_finite() || !(speed <= self.params.divergence_speed);
        self.diverged = report_divergence(self.name(), self.diverged, bad, speed);
    }

    /// Interpolated density at an arbitrary point.
    ///
    /// Buckets are rebuilt at the end of every step, so this sees the current positions
    /// unless particles were moved through [`SphSimulator::particles_mut`] since.
    pub fn density_at(&self, point: Vec3) -> f32 {
        self.search
            .search(&self.particles, point)
            .into_iter()
            .map(|j| {
                let other = &self.particles[j];
                other.mass * self.kernel.value(point.distance(other.position))
            })
            .sum()
    }

    /// Samples [`SphSimulator::density_at`] on a regular lattice spanning `[min, max]`.
    ///
    /// Samples are ordered with `z` varying fastest, then `y`, then `x`.
    pub fn sample_density_grid(&self, min: Vec3, max: Vec3, dimensions: UVec3) -> Result<Vec<f32>> {
        if dimensions.min_element() < 2 {
            return Err(SimError::invalid("dimensions", "need at least 2 samples per axis"));
        }
        if !min.is_finite() || !max.is_finite() || max.cmplt(min).any() {
            return Err(SimError::invalid("bounds", "max must not be below min"));
        }
        let spacing = (max - min) / (dimensions - UVec3::ONE).as_vec3();
        let (ny, nz) = (dimensions.y as usize, dimensions.z as usize);
        let count = dimensions.x as usize * ny * nz;
        Ok(parallel::map_indices_if(self.integrator.parallel(), count, |flat| {
            let index = UVec3::new((flat / (ny * nz)) as u32, ((flat / nz) % ny) as u32, (flat % nz) as u32);
            self.density_at(min + index.as_vec3() * spacing)
        }))
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Mutable particle access; neighbors are rebuilt before the next step.
    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        self.neighbors_stale = true;
        &mut self.particles
    }

    pub fn neighbors(&self) -> &NeighborSearch {
        &self.search
    }

    /// Pressures computed during the last step.
    pub fn pressures(&self) -> &[f32] {
        &self.pressures
    }

    pub fn parameters(&self) -> &FluidParameters {
        &self.params
    }

    pub fn kernel(&self) -> &CubicSpline {
        &self.kernel
    }

    /// Half extents along `x`/`z` and the nominal height of the container.
    pub fn box_extent(&self) -> Vec3 {
        Vec3::new(self.params.box_x, self.params.box_height, self.params.box_z)
    }

    pub fn set_stiffness(&mut self, stiffness: f32) -> Result<()> {
        ensure_non_negative("stiffness", stiffness)?;
        self.params.stiffness = stiffness;
        Ok(())
    }

    pub fn set_viscosity(&mut self, viscosity: f32) -> Result<()> {
        ensure_non_negative("viscosity", viscosity)?;
        self.params.viscosity = viscosity;
        Ok(())
    }

    pub fn set_box(&mut self, box_x: f32, box_z: f32) -> Result<()> {
        ensure_positive("box_x", box_x)?;
        ensure_positive("box_z", box_z)?;
        self.params.box_x = box_x;
        self.params.box_z = box_z;
        Ok(())
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.integrator.set_parallel(enabled);
    }

    /// External forces applied to every particle; holds gravity by default.
    pub fn forces_mut(&mut self) -> &mut ForceRegistry {
        &mut self.forces
    }
}

impl Simulation for SphSimulator {
    fn update(&mut self, dt: f32) {
        let _timer = ScopedTimer::new("sph::update");
        if self.neighbors_stale {
            self.search.update(&self.particles);
            self.neighbors_stale = false;
        }
        let threaded = self.integrator.parallel();

        let densities = parallel::map_indices_if(threaded, self.particles.len(), |i| {
            self.summed_density(i)
        });
        for (particle, density) in self.particles.iter_mut().zip(densities) {
            particle.density = density;
        }
        let pressures: Vec<f32> = self
            .particles
            .iter()
            .map(|particle| self.equation_of_state(particle.density))
            .collect();
        self.pressures = pressures;

        let internal = parallel::map_indices_if(threaded, self.particles.len(), |i| {
            self.internal_force(i)
        });
        for (particle, force) in self.particles.iter_mut().zip(internal) {
            particle.force = force;
        }
        self.forces.apply_all(&mut self.particles, dt);
        self.apply_box_penalty();

        self.integrator.integrate(&mut self.particles, dt);
        self.search.update(&self.particles);
        self.check_divergence();
    }

    fn has_diverged(&self) -> bool {
        self.diverged
    }

    fn reset_divergence(&mut self) {
        self.diverged = false;
    }

    fn name(&self) -> &'static str {
        "sph fluid"
    }
}
