use physim::*;

fn main() {
    let grid = ElasticGrid::new(GridLayout::default(), ElasticMaterial::default())
        .expect("default grid is valid");
    let mut world = PhysicsWorld::with_default_step(grid);

    for frame in 0..=60 {
        if frame > 0 {
            world.step(1.0 / 30.0);
        }
        if frame % 10 == 0 {
            let grid = world.simulation();
            let lowest = grid
                .particles()
                .positions()
                .fold(f32::INFINITY, |acc, p| acc.min(p.y));
            println!(
                "t={:.2}s lowest y={:.3} volume={:.3} elastic={:.4} kinetic={:.4}",
                frame as f32 / 30.0,
                lowest,
                grid.current_volume(),
                grid.elastic_energy(),
                grid.kinetic_energy()
            );
        }
    }

    if world.has_diverged() {
        println!("simulation diverged");
    }
    world.profiler().report();
}
