use physim::*;

fn main() {
    let center = Vec3::new(0.0, 1.0, 0.0);
    let radius = 0.5;
    let fluid = SphSimulator::new(
        center - Vec3::splat(radius),
        center + Vec3::splat(radius),
        |p| p.distance(center) <= radius,
        FluidParameters::default(),
    )
    .expect("sphere of fluid is valid");
    println!(
        "{} particles, density error {:.2e}",
        fluid.particles().len(),
        fluid.max_density_error()
    );

    let mut world = PhysicsWorld::with_default_step(fluid);
    for frame in 1..=30 {
        world.step(1.0 / 60.0);
        if frame % 5 == 0 {
            let fluid = world.simulation();
            let particles = fluid.particles();
            let lowest = particles
                .positions()
                .fold(f32::INFINITY, |acc, p| acc.min(p.y));
            let max_pressure = fluid.pressures().iter().copied().fold(f32::MIN, f32::max);
            println!(
                "frame {frame}: lowest y={lowest:.3} max speed={:.3} max pressure={max_pressure:.1}",
                particles.max_speed()
            );
        }
    }

    let extent = world.simulation().box_extent();
    let samples = world
        .simulation()
        .sample_density_grid(
            Vec3::new(-extent.x, 0.0, -extent.z),
            Vec3::new(extent.x, 1.5, extent.z),
            UVec3::splat(8),
        )
        .expect("sampling lattice is valid");
    let wet = samples.iter().filter(|&&rho| rho > 500.0).count();
    println!("{wet}/{} density samples inside the fluid", samples.len());
}
