use physim::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_cloud(rng: &mut StdRng, count: usize) -> ParticleSystem {
    (0..count)
        .map(|_| {
            let position = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            Particle::at(position).with_mass(1.0)
        })
        .collect()
}

fn brute_force(system: &ParticleSystem, point: Vec3, radius: f32) -> Vec<usize> {
    system
        .iter()
        .enumerate()
        .filter(|(_, p)| point.distance(p.position) < radius)
        .map(|(j, _)| j)
        .collect()
}

fn sorted(mut indices: Vec<usize>) -> Vec<usize> {
    indices.sort_unstable();
    indices
}

#[test]
fn hashed_neighbors_equal_brute_force() {
    let mut rng = StdRng::seed_from_u64(7);
    let system = random_cloud(&mut rng, 800);

    // A small prime bucket count forces many unrelated cells to collide.
    for buckets in [13, 997, 10_007] {
        let mut search = NeighborSearch::new(0.2, buckets).unwrap();
        search.update(&system);
        for (i, particle) in system.iter().enumerate() {
            let expected = brute_force(&system, particle.position, 0.2);
            assert_eq!(sorted(search.neighbors(i).to_vec()), expected, "particle {i}");
        }
    }
}

#[test]
fn arbitrary_point_queries_equal_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    let system = random_cloud(&mut rng, 300);
    let mut search = NeighborSearch::new(0.35, 101).unwrap();
    search.update(&system);

    for _ in 0..100 {
        let point = Vec3::new(
            rng.random_range(-1.2..1.2),
            rng.random_range(-1.2..1.2),
            rng.random_range(-1.2..1.2),
        );
        assert_eq!(sorted(search.search(&system, point)), brute_force(&system, point, 0.35));
    }
}

#[test]
fn rebuild_tracks_moving_particles() {
    let mut system: ParticleSystem = [Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0)]
        .into_iter()
        .map(|p| Particle::at(p).with_mass(1.0))
        .collect();
    let mut search = NeighborSearch::new(0.1, 31).unwrap();
    search.update(&system);
    assert_eq!(search.neighbors(0).len(), 2);

    system[1].position = Vec3::new(3.0, 0.0, 0.0);
    search.update(&system);
    assert_eq!(search.neighbors(0), &[0]);
    assert_eq!(search.neighbors(1), &[1]);
}
