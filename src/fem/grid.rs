use glam::{Mat3, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use super::tetrahedron::Tetrahedron;
use crate::{
    config::{DEFAULT_DIVERGENCE_SPEED, DEFAULT_GRAVITY, MASS_CHECK_TOLERANCE},
    core::{
        particle::{Particle, ParticleSystem},
        types::{ElasticMaterial, FloorContact, GridLayout},
    },
    dynamics::{forces::ForceRegistry, integrator::Integrator, parallel},
    error::{ensure_positive, Result, SimError},
    utils::{
        logging::{report_divergence, ScopedTimer},
        math::{cofactor, double_dot, trace},
    },
    world::Simulation,
};

/// Corner offsets of the five tetrahedra carved out of every lattice cell.
const CELL_TETRAHEDRA: [[[u32; 3]; 4]; 5] = [
    [[0, 0, 0], [1, 0, 0], [0, 0, 1], [0, 1, 0]],
    [[1, 0, 0], [1, 0, 1], [0, 0, 1], [1, 1, 1]],
    [[1, 1, 1], [0, 1, 0], [0, 1, 1], [0, 0, 1]],
    [[1, 1, 1], [1, 1, 0], [0, 0, 1], [1, 0, 0]],
    [[1, 0, 0], [1, 1, 1], [0, 0, 1], [0, 1, 0]],
];

/// How element stress is turned into nodal forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NodalForceModel {
    /// `f = σ·n`: small-deformation response, not rotation invariant.
    Reference,
    /// `f = F·σ·n`: first Piola-Kirchhoff stress of a St. Venant-Kirchhoff solid.
    #[default]
    Piola,
    /// `f = cof(F)·σ·n`: treats `σ` as a Cauchy stress on the deformed faces.
    Cofactor,
}

#[derive(Debug, Clone, Copy)]
struct Lame {
    lambda: f32,
    mu: f32,
    damping: f32,
}

/// Elastic solid discretized as a lattice of particles joined by tetrahedra.
#[derive(Debug)]
pub struct ElasticGrid {
    layout: GridLayout,
    material: ElasticMaterial,
    lame: Lame,
    stride: UVec3,
    particles: ParticleSystem,
    tetrahedra: Vec<Tetrahedron>,
    integrator: Integrator,
    forces: ForceRegistry,
    floor: FloorContact,
    force_model: NodalForceModel,
    divergence_speed: f32,
    diverged: bool,
}

impl ElasticGrid {
    pub fn new(layout: GridLayout, material: ElasticMaterial) -> Result<Self> {
        layout.validate()?;
        material.validate()?;

        let dims = layout.dimensions;
        let stride = UVec3::new(dims.y * dims.z, dims.z, 1);
        let (lambda, mu) = material.lame();
        let mut integrator = Integrator::new();
        integrator.set_parallel(cfg!(feature = "parallel"));

        let mut grid = Self {
            layout,
            material,
            lame: Lame {
                lambda,
                mu,
                damping: material.damping,
            },
            stride,
            particles: ParticleSystem::with_capacity(layout.particle_count()),
            tetrahedra: Vec::with_capacity(layout.cell_count() * CELL_TETRAHEDRA.len()),
            integrator,
            forces: ForceRegistry::with_gravity(Vec3::from_array(DEFAULT_GRAVITY)),
            floor: FloorContact::default(),
            force_model: NodalForceModel::default(),
            divergence_speed: DEFAULT_DIVERGENCE_SPEED,
            diverged: false,
        };
        grid.setup_particles();
        grid.link_tetrahedra()?;
        grid.distribute_mass()?;

        log::debug!(
            "elastic grid: {} particles, {} tetrahedra, volume {:.4}, mass {:.4}, λ={:.3} μ={:.3}",
            grid.particles.len(),
            grid.tetrahedra.len(),
            grid.total_volume(),
            grid.total_mass(),
            lambda,
            mu
        );
        Ok(grid)
    }

    fn setup_particles(&mut self) {
        let dims = self.layout.dimensions;
        for i in 0..dims.x {
            for j in 0..dims.y {
                for k in 0..dims.z {
                    let local = UVec3::new(i, j, k).as_vec3() * self.layout.cell_size;
                    let position = self.layout.origin + self.layout.rotation * local;
                    self.particles.add(Particle::at(position));
                }
            }
        }
    }

    fn link_tetrahedra(&mut self) -> Result<()> {
        let cells = self.layout.dimensions - UVec3::ONE;
        for i in 0..cells.x {
            for j in 0..cells.y {
                for k in 0..cells.z {
                    let base = UVec3::new(i, j, k);
                    for pattern in CELL_TETRAHEDRA {
                        let indices = pattern.map(|offset| self.flat_index(base + UVec3::from_array(offset)));
                        self.add_tetrahedron(indices)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn add_tetrahedron(&mut self, indices: [usize; 4]) -> Result<()> {
        let index = self.tetrahedra.len();
        match Tetrahedron::from_rest(indices, &self.particles) {
            Some(tet) if tet.rest_volume > 0.0 => {
                self.tetrahedra.push(tet);
                Ok(())
            }
            other => Err(SimError::DegenerateTetrahedron {
                index,
                volume: other.map_or_else(
                    || Tetrahedron::signed_volume(indices, |i| self.particles[i].position),
                    |tet| tet.rest_volume,
                ),
            }),
        }
    }

    /// Spreads a quarter of every element's mass onto each of its vertices.
    fn distribute_mass(&mut self) -> Result<()> {
        for particle in self.particles.iter_mut() {
            particle.mass = 0.0;
        }
        let density = self.material.density;
        for tet in &self.tetrahedra {
            let share = density * tet.rest_volume / 4.0;
            for &index in &tet.indices {
                self.particles[index].mass += share;
            }
        }

        if let Some((index, particle)) = self
            .particles
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.mass > 0.0))
        {
            return Err(SimError::NonPositiveMass {
                index,
                mass: particle.mass,
            });
        }

        let total_mass = self.total_mass();
        let expected = density * self.total_volume();
        if ((total_mass - expected) / expected).abs() > MASS_CHECK_TOLERANCE {
            return Err(SimError::MassMismatch {
                total_mass,
                expected,
            });
        }
        Ok(())
    }

    fn flat_index(&self, coord: UVec3) -> usize {
        (coord.x * self.stride.x + coord.y * self.stride.y + coord.z * self.stride.z) as usize
    }

    /// Particle index of lattice coordinate `coord`, if it lies inside the grid.
    pub fn index_of(&self, coord: UVec3) -> Option<usize> {
        coord
            .cmplt(self.layout.dimensions)
            .all()
            .then(|| self.flat_index(coord))
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Mutable particle access for host interaction (dragging, perturbations).
    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    pub fn tetrahedra(&self) -> &[Tetrahedron] {
        &self.tetrahedra
    }

    pub fn tetrahedron_indices(&self) -> Vec<[usize; 4]> {
        self.tetrahedra.iter().map(|tet| tet.indices).collect()
    }

    pub fn material(&self) -> &ElasticMaterial {
        &self.material
    }

    /// Replaces the material, recomputing Lamé parameters and particle masses.
    pub fn set_material(&mut self, material: ElasticMaterial) -> Result<()> {
        material.validate()?;
        let (lambda, mu) = material.lame();
        self.material = material;
        self.lame = Lame {
            lambda,
            mu,
            damping: material.damping,
        };
        self.distribute_mass()
    }

    /// Lamé parameters `(λ, μ)` of the current material.
    pub fn lame(&self) -> (f32, f32) {
        (self.lame.lambda, self.lame.mu)
    }

    pub fn floor(&self) -> &FloorContact {
        &self.floor
    }

    pub fn set_floor(&mut self, floor: FloorContact) -> Result<()> {
        floor.validate()?;
        self.floor = floor;
        Ok(())
    }

    pub fn force_model(&self) -> NodalForceModel {
        self.force_model
    }

    pub fn set_force_model(&mut self, model: NodalForceModel) {
        self.force_model = model;
    }

    /// External forces applied to every particle; holds gravity by default.
    pub fn forces_mut(&mut self) -> &mut ForceRegistry {
        &mut self.forces
    }

    pub fn set_divergence_speed(&mut self, speed: f32) -> Result<()> {
        ensure_positive("divergence_speed", speed)?;
        self.divergence_speed = speed;
        Ok(())
    }

    /// Runs the element pass and the integrator on the rayon pool when enabled.
    pub fn set_parallel(&mut self, enabled: bool) {
        self.integrator.set_parallel(enabled);
    }

    pub fn total_mass(&self) -> f32 {
        self.particles.total_mass()
    }

    /// Sum of the rest volumes of all elements.
    pub fn total_volume(&self) -> f32 {
        self.tetrahedra.iter().map(|tet| tet.rest_volume).sum()
    }

    pub fn current_volume(&self) -> f32 {
        self.tetrahedra
            .iter()
            .map(|tet| tet.current_volume(&self.particles))
            .sum()
    }

    /// Green-Lagrange strain `(FᵀF − I)/2` of an element.
    pub fn strain(&self, tet: &Tetrahedron) -> Mat3 {
        green_strain(&tet.deformation_gradient(&self.particles))
    }

    /// Stress `2μ·ε + λ·tr(ε)·I + η·ε̇` of an element.
    pub fn stress(&self, tet: &Tetrahedron) -> Mat3 {
        element_state(&self.particles, tet, self.lame).1
    }

    /// Stored St. Venant-Kirchhoff energy `Σ V (μ ε:ε + λ/2 tr(ε)²)`.
    pub fn elastic_energy(&self) -> f32 {
        let Lame { lambda, mu, .. } = self.lame;
        self.tetrahedra
            .iter()
            .map(|tet| {
                let strain = self.strain(tet);
                let tr = trace(&strain);
                tet.rest_volume * (mu * double_dot(&strain, &strain) + 0.5 * lambda * tr * tr)
            })
            .sum()
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.particles.kinetic_energy()
    }

    /// Accumulates the elastic (and viscous) nodal forces of every element.
    pub fn deform_tetrahedra(&mut self) {
        let particles = &self.particles;
        let tetrahedra = &self.tetrahedra;
        let lame = self.lame;
        let model = self.force_model;

        let threaded = self.integrator.parallel();
        let contributions = parallel::map_indices_if(threaded, tetrahedra.len(), |t| {
            let tet = &tetrahedra[t];
            let (f, sigma) = element_state(particles, tet, lame);
            let map = match model {
                NodalForceModel::Reference => sigma,
                NodalForceModel::Piola => f * sigma,
                NodalForceModel::Cofactor => cofactor(&f) * sigma,
            };
            tet.rest_normals.map(|normal| map * normal / 3.0)
        });

        for (tet, forces) in self.tetrahedra.iter().zip(contributions) {
            for (&index, force) in tet.indices.iter().zip(forces) {
                self.particles[index].force += force;
            }
        }
    }

    /// Clamps particles to `y >= 0` and applies the floor's normal and friction forces.
    fn apply_floor_contact(&mut self, dt: f32) {
        let FloorContact {
            restitution,
            friction,
            ..
        } = self.floor;
        for particle in self.particles.iter_mut() {
            if particle.position.y > 0.0 {
                continue;
            }
            particle.position.y = 0.0;
            if particle.velocity.y < 0.0 {
                particle.velocity.y *= -restitution;
            }

            let normal = (-particle.force.y).max(0.0);
            particle.force.y += normal;

            let sliding = Vec3::new(particle.velocity.x, 0.0, particle.velocity.z);
            let speed = sliding.length();
            if speed > f32::EPSILON && normal > 0.0 {
                // Never push harder than what stops the sliding within this step.
                let limit = particle.mass * speed / dt;
                let magnitude = (friction * normal).min(limit);
                particle.force -= sliding / speed * magnitude;
            }
        }
    }

    fn check_divergence(&mut self) {
        let speed = self.particles.max_speed();
        let bad = !self.particles.is_finite() || !(speed <= self.divergence_speed);
        self.diverged = report_divergence(self.name(), self.diverged, bad, speed);
    }
}

fn green_strain(f: &Mat3) -> Mat3 {
    (f.transpose() * *f - Mat3::IDENTITY) * 0.5
}

/// Deformation gradient and stress of one element.
fn element_state(particles: &ParticleSystem, tet: &Tetrahedron, lame: Lame) -> (Mat3, Mat3) {
    let f = tet.deformation_gradient(particles);
    let strain = green_strain(&f);
    let mut sigma = strain * (2.0 * lame.mu) + Mat3::IDENTITY * (lame.lambda * trace(&strain));
    if lame.damping > 0.0 {
        let f_dot = tet.velocity_gradient(particles);
        let strain_rate = (f.transpose() * f_dot + f_dot.transpose() * f) * 0.5;
        sigma += strain_rate * lame.damping;
    }
    (f, sigma)
}

impl Simulation for ElasticGrid {
    fn update(&mut self, dt: f32) {
        let _timer = ScopedTimer::new("fem::update");
        self.particles.clear_forces();
        self.deform_tetrahedra();
        self.forces.apply_all(&mut self.particles, dt);
        if self.floor.enabled {
            self.apply_floor_contact(dt);
        }
        self.integrator.integrate(&mut self.particles, dt);
        self.check_divergence();
    }

    fn has_diverged(&self) -> bool {
        self.diverged
    }

    fn reset_divergence(&mut self) {
        self.diverged = false;
    }

    fn name(&self) -> &'static str {
        "elastic grid"
    }
}
