use approx::assert_relative_eq;
use physim::*;

fn max_abs(m: Mat3) -> f32 {
    m.to_cols_array().iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

#[test]
fn total_mass_matches_density_times_volume() {
    let layout = GridLayout::default();
    let grid = ElasticGrid::new(layout, ElasticMaterial::new(100.0, 0.4, 0.0, 3.0)).unwrap();

    assert_eq!(grid.particles().len(), 64);
    assert_eq!(grid.tetrahedra().len(), 27 * 5);
    assert_relative_eq!(grid.total_volume(), 27.0 * 0.125, max_relative = 1e-5);
    assert_relative_eq!(grid.total_mass(), 3.0 * grid.total_volume(), max_relative = 1e-3);
    assert!(grid.particles().iter().all(|p| p.mass > 0.0));
}

#[test]
fn rotated_grid_at_rest_is_unstressed() {
    let layout = GridLayout::new(
        Vec3::new(0.0, 1.0, 0.0),
        Quat::from_rotation_y(0.5) * Quat::from_rotation_x(0.3),
        Vec3::new(0.5, 0.25, 0.4),
        UVec3::new(3, 4, 2),
    );
    let grid = ElasticGrid::new(layout, ElasticMaterial::default()).unwrap();

    for tet in grid.tetrahedra() {
        assert!(tet.rest_volume > 0.0);
        assert!(max_abs(grid.strain(tet)) < 1e-5);
        assert!(max_abs(grid.stress(tet)) < 1e-3);
    }
    assert!(grid.elastic_energy() < 1e-6);
}

#[test]
fn force_free_grid_is_unchanged_by_update() {
    let mut grid = ElasticGrid::new(GridLayout::default(), ElasticMaterial::default()).unwrap();
    grid.forces_mut().clear();
    let before: Vec<Vec3> = grid.particles().positions().collect();

    for _ in 0..10 {
        grid.update(1e-3);
    }

    for (particle, start) in grid.particles().iter().zip(before) {
        assert!(particle.position.distance(start) < 1e-6);
        assert!(particle.velocity.length() < 1e-5);
    }
    assert!(!grid.has_diverged());
}

#[test]
fn dropped_grid_lands_on_the_floor() {
    let layout = GridLayout {
        origin: Vec3::new(0.0, 0.5, 0.0),
        ..GridLayout::default()
    };
    let mut grid = ElasticGrid::new(layout, ElasticMaterial::default()).unwrap();
    let start_height = grid.particles().positions().map(|p| p.y).sum::<f32>();

    for _ in 0..1000 {
        grid.update(1e-3);
    }

    assert!(!grid.has_diverged());
    assert!(grid.particles().is_finite());
    assert!(grid.particles().iter().all(|p| p.position.y > -1e-2));
    let end_height = grid.particles().positions().map(|p| p.y).sum::<f32>();
    assert!(end_height < start_height);
}

#[test]
fn divergence_is_sticky_until_reset() {
    let mut grid = ElasticGrid::new(GridLayout::default(), ElasticMaterial::default()).unwrap();
    grid.particles_mut()[0].velocity = Vec3::new(5e3, 0.0, 0.0);

    grid.update(1e-4);
    assert!(grid.has_diverged());

    grid.particles_mut()[0].velocity = Vec3::ZERO;
    grid.update(1e-4);
    assert!(grid.has_diverged());

    grid.reset_divergence();
    assert!(!grid.has_diverged());
}

#[test]
fn invalid_construction_fails_fast() {
    let thin = GridLayout {
        dimensions: UVec3::new(1, 4, 4),
        ..GridLayout::default()
    };
    assert!(matches!(
        ElasticGrid::new(thin, ElasticMaterial::default()),
        Err(SimError::InvalidParameter { .. })
    ));

    let incompressible = ElasticMaterial::new(100.0, 0.5, 0.0, 1.0);
    assert!(ElasticGrid::new(GridLayout::default(), incompressible).is_err());

    let flat = GridLayout {
        cell_size: Vec3::new(0.5, 0.0, 0.5),
        ..GridLayout::default()
    };
    assert!(ElasticGrid::new(flat, ElasticMaterial::default()).is_err());
}

#[test]
fn changing_material_redistributes_mass() {
    let mut grid = ElasticGrid::new(GridLayout::default(), ElasticMaterial::default()).unwrap();
    let light = grid.total_mass();

    grid.set_material(ElasticMaterial::new(200.0, 0.3, 0.1, 2.0)).unwrap();
    assert_relative_eq!(grid.total_mass(), 2.0 * light, max_relative = 1e-5);

    let (lambda, mu) = grid.lame();
    assert_relative_eq!(mu, 200.0 / 2.6, max_relative = 1e-5);
    assert_relative_eq!(lambda, 60.0 / (1.3 * 0.4), max_relative = 1e-5);
}

#[test]
fn force_models_agree_for_small_strain() {
    let mut grid = ElasticGrid::new(GridLayout::default(), ElasticMaterial::default()).unwrap();
    grid.forces_mut().clear();
    for particle in grid.particles_mut().iter_mut() {
        particle.position.x *= 1.001;
    }

    let mut forces = Vec::new();
    for model in [
        NodalForceModel::Reference,
        NodalForceModel::Piola,
        NodalForceModel::Cofactor,
    ] {
        grid.set_force_model(model);
        grid.particles_mut().clear_forces();
        grid.deform_tetrahedra();
        forces.push(grid.particles().iter().map(|p| p.force).collect::<Vec<_>>());
    }

    let scale = forces[1].iter().fold(0.0f32, |acc, f| acc.max(f.length()));
    assert!(scale > 0.0);
    for other in [&forces[0], &forces[2]] {
        for (a, b) in other.iter().zip(&forces[1]) {
            assert!(a.distance(*b) < 1e-2 * scale);
        }
    }
}
