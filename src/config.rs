//! Global configuration constants for the physim simulators.

/// Default gravity vector applied to every simulator (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.8, 0.0];

/// Default fixed integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1e-3;

/// Upper bound on fixed sub-steps consumed by a single `PhysicsWorld::step` call.
pub const DEFAULT_MAX_SUBSTEPS: u32 = 1000;

/// Speed (m/s) above which a simulator flags itself as diverged.
pub const DEFAULT_DIVERGENCE_SPEED: f32 = 1e3;

/// Default Young's modulus for elastic grids.
pub const DEFAULT_YOUNGS_MODULUS: f32 = 100.0;

/// Default Poisson ratio for elastic grids.
pub const DEFAULT_POISSON_RATIO: f32 = 0.4;

/// Default density for elastic grids.
pub const DEFAULT_SOLID_DENSITY: f32 = 1.0;

/// Default Coulomb friction between elastic particles and the floor.
pub const DEFAULT_FLOOR_FRICTION: f32 = 0.5;

/// SPH smoothing length `h`; the kernel support radius is `2h`.
pub const DEFAULT_KERNEL_RADIUS: f32 = 0.1;

/// Stiffness `k` of the Tait equation of state.
pub const DEFAULT_FLUID_STIFFNESS: f32 = 1119e3;

/// Rest density of the fluid.
pub const DEFAULT_REST_DENSITY: f32 = 1e3;

/// Kinematic viscosity of the fluid.
pub const DEFAULT_VISCOSITY: f32 = 1e-2;

/// Half extent of the fluid container along X and Z.
pub const DEFAULT_BOX_HALF_EXTENT: f32 = 1.0;

/// Reported height of the fluid container (it has no top plane).
pub const DEFAULT_BOX_HEIGHT: f32 = 10.0;

/// Penalty stiffness of the container walls.
pub const DEFAULT_BOX_STIFFNESS: f32 = 1e5;

/// Number of spatial-hash buckets used by the fluid neighbor search.
pub const DEFAULT_BUCKET_COUNT: usize = 10_007;

/// Relative density error accepted by the initial mass correction.
pub const DEFAULT_DENSITY_TOLERANCE: f32 = 1e-3;

/// Iteration cap of the initial mass correction.
pub const DEFAULT_MAX_MASS_ITERATIONS: u32 = 100;

/// Default restitution of rigid ground contact.
pub const DEFAULT_RESTITUTION: f32 = 0.5;

/// Default friction of rigid ground contact.
pub const DEFAULT_CONTACT_FRICTION: f32 = 0.5;

/// Orthonormality error above which a rigid body is flagged as diverged.
pub const DEFAULT_ORTHONORMALITY_TOLERANCE: f32 = 1e-2;

/// Relative tolerance of the total-mass check performed on grid construction.
pub const MASS_CHECK_TOLERANCE: f32 = 1e-3;
