use physim::*;

fn main() {
    let body = RigidBody::new(
        Vec3::new(0.0, 5.0, 0.0),
        Mat3::from_rotation_z(0.3),
        Vec3::new(0.0, 0.2, 0.1),
        Vec3::ONE,
        1.0,
    )
    .expect("box is valid");
    let sim = RigidBodySimulator::new(body, GroundCollision::default(), RigidBodySettings::default())
        .expect("settings are valid");
    let mut world = PhysicsWorld::with_default_step(sim);

    for frame in 1..=180 {
        world.step(1.0 / 60.0);
        let sim = world.simulation();
        if let Some(contact) = sim.last_contact() {
            println!(
                "frame {frame}: contact at {:?}, normal impulse {:.3}",
                contact.point, contact.normal_impulse
            );
        }
        if frame % 30 == 0 {
            let body = sim.body();
            println!(
                "frame {frame}: y={:.3} speed={:.3} drift={:.1e}",
                body.position().y,
                body.linear_velocity().length(),
                body.orthonormality_error()
            );
        }
    }
}
