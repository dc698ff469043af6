//! Additional math helpers layered on top of `glam`.

use glam::{Mat3, Vec3};

/// Cross-product matrix `[v]×` such that `[v]× · u == v × u`.
pub fn skew(v: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, v.z, -v.y),
        Vec3::new(-v.z, 0.0, v.x),
        Vec3::new(v.y, -v.x, 0.0),
    )
}

pub fn trace(m: &Mat3) -> f32 {
    m.x_axis.x + m.y_axis.y + m.z_axis.z
}

/// Double contraction `a : b`.
pub fn double_dot(a: &Mat3, b: &Mat3) -> f32 {
    a.x_axis.dot(b.x_axis) + a.y_axis.dot(b.y_axis) + a.z_axis.dot(b.z_axis)
}

/// Cofactor matrix, `det(m)·m⁻ᵀ` for invertible `m`, well defined when singular.
pub fn cofactor(m: &Mat3) -> Mat3 {
    Mat3::from_cols(
        m.y_axis.cross(m.z_axis),
        m.z_axis.cross(m.x_axis),
        m.x_axis.cross(m.y_axis),
    )
}

/// Rotation matrix for angular velocity `omega` applied over `dt` (exponential map).
pub fn rotation_from_angular_velocity(omega: Vec3, dt: f32) -> Mat3 {
    let speed = omega.length();
    let angle = speed * dt;
    if angle.abs() < 1e-9 || !angle.is_finite() {
        return Mat3::IDENTITY;
    }
    Mat3::from_axis_angle(omega / speed, angle)
}

/// Gram-Schmidt re-orthonormalization of the columns of `m`.
///
/// The result keeps the handedness of the input; degenerate inputs fall back to identity.
pub fn orthonormalize(m: &Mat3) -> Mat3 {
    let x = m.x_axis.normalize_or_zero();
    let y = (m.y_axis - x * x.dot(m.y_axis)).normalize_or_zero();
    if x == Vec3::ZERO || y == Vec3::ZERO {
        return Mat3::IDENTITY;
    }
    let z = x.cross(y);
    let z = if z.dot(m.z_axis) < 0.0 { -z } else { z };
    Mat3::from_cols(x, y, z)
}

/// Largest absolute entry of `mᵀm − I`.
pub fn orthonormality_error(m: &Mat3) -> f32 {
    let residual = m.transpose() * *m - Mat3::IDENTITY;
    residual
        .to_cols_array()
        .iter()
        .fold(0.0_f32, |acc, v| acc.max(v.abs()))
}
