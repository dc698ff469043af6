use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::particle::ParticleSystem;

/// Smallest `|det R| / (|r0|·|r1|·|r2|)` accepted for a rest edge matrix `R`.
const MIN_SHAPE_QUALITY: f32 = 1e-6;

/// Linear tetrahedral element with precomputed rest-frame data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tetrahedron {
    pub indices: [usize; 4],
    /// Inverse of the rest edge matrix `[x0 - x3, x1 - x3, x2 - x3]`.
    pub rest_inverse: Mat3,
    /// Outward area-weighted normal of the face opposite each vertex.
    pub rest_normals: [Vec3; 4],
    pub rest_volume: f32,
}

impl Tetrahedron {
    /// Builds the element from the current (rest) positions of its vertices.
    ///
    /// Returns `None` when the element is flat relative to its own edge lengths, so
    /// the test does not depend on the lattice scale.
    pub fn from_rest(indices: [usize; 4], system: &ParticleSystem) -> Option<Self> {
        let rest = Self::edge_matrix(indices, |i| system[i].position);
        let (r0, r1, r2) = (rest.x_axis, rest.y_axis, rest.z_axis);
        let det = rest.determinant();
        let scale = r0.length() * r1.length() * r2.length();
        if !det.is_finite() || !(det.abs() > MIN_SHAPE_QUALITY * scale) {
            return None;
        }
        let volume = det / 6.0;

        let rest_normals = [
            r2.cross(r1) * 0.5,
            r0.cross(r2) * 0.5,
            r1.cross(r0) * 0.5,
            (r1 - r0).cross(r2 - r0) * 0.5,
        ];

        Some(Self {
            indices,
            rest_inverse: rest.inverse(),
            rest_normals,
            rest_volume: volume,
        })
    }

    /// Signed volume spanned by four positions, positive for the outward-normal orientation.
    pub fn signed_volume(indices: [usize; 4], position: impl Fn(usize) -> Vec3) -> f32 {
        Self::edge_matrix(indices, position).determinant() / 6.0
    }

    /// `[a0 - a3, a1 - a3, a2 - a3]` for a per-vertex vector field `a`.
    pub fn edge_matrix(indices: [usize; 4], field: impl Fn(usize) -> Vec3) -> Mat3 {
        let origin = field(indices[3]);
        Mat3::from_cols(
            field(indices[0]) - origin,
            field(indices[1]) - origin,
            field(indices[2]) - origin,
        )
    }

    pub fn deformation_gradient(&self, system: &ParticleSystem) -> Mat3 {
        Self::edge_matrix(self.indices, |i| system[i].position) * self.rest_inverse
    }

    /// Time derivative of the deformation gradient.
    pub fn velocity_gradient(&self, system: &ParticleSystem) -> Mat3 {
        Self::edge_matrix(self.indices, |i| system[i].velocity) * self.rest_inverse
    }

    pub fn current_volume(&self, system: &ParticleSystem) -> f32 {
        Self::signed_volume(self.indices, |i| system[i].position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particle::Particle;

    fn corner_tetrahedron() -> ParticleSystem {
        [Vec3::X, Vec3::Y, Vec3::Z, Vec3::ZERO]
            .into_iter()
            .map(|p| Particle::at(p).with_mass(1.0))
            .collect()
    }

    #[test]
    fn rest_normals_close_the_surface() {
        let system = corner_tetrahedron();
        let tet = Tetrahedron::from_rest([0, 1, 2, 3], &system).unwrap();
        let sum: Vec3 = tet.rest_normals.iter().copied().sum();
        assert!(sum.length() < 1e-6);
        assert!((tet.rest_volume - 1.0 / 6.0).abs() < 1e-6);
        // Face opposite vertex 3 is the slanted one with area √3/2.
        assert!((tet.rest_normals[3].length() - 3f32.sqrt() / 2.0).abs() < 1e-6);
    }

    #[test]
    fn normals_point_away_from_their_vertex() {
        let system = corner_tetrahedron();
        let tet = Tetrahedron::from_rest([0, 1, 2, 3], &system).unwrap();
        let centroid: Vec3 = system.positions().sum::<Vec3>() / 4.0;
        for (k, normal) in tet.rest_normals.iter().enumerate() {
            let towards_vertex = system[tet.indices[k]].position - centroid;
            assert!(normal.dot(towards_vertex) < 0.0, "normal {k} points inward");
        }
    }

    #[test]
    fn undeformed_gradient_is_identity() {
        let system = corner_tetrahedron();
        let tet = Tetrahedron::from_rest([0, 1, 2, 3], &system).unwrap();
        let f = tet.deformation_gradient(&system);
        assert!((f - Mat3::IDENTITY).abs_diff_eq(Mat3::ZERO, 1e-6));
    }

    #[test]
    fn flat_tetrahedron_is_rejected() {
        let system: ParticleSystem = [Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO]
            .into_iter()
            .map(|p| Particle::at(p).with_mass(1.0))
            .collect();
        assert!(Tetrahedron::from_rest([0, 1, 2, 3], &system).is_none());
    }

    #[test]
    fn tiny_well_shaped_tetrahedron_is_accepted() {
        let scale = 1e-3;
        let system: ParticleSystem = [Vec3::X, Vec3::Y, Vec3::Z, Vec3::ZERO]
            .into_iter()
            .map(|p| Particle::at(p * scale).with_mass(1.0))
            .collect();
        let tet = Tetrahedron::from_rest([0, 1, 2, 3], &system).unwrap();
        assert!((tet.rest_volume - scale.powi(3) / 6.0).abs() < 1e-15);
        assert_eq!(tet.rest_volume, Tetrahedron::signed_volume(tet.indices, |i| system[i].position));
    }
}
