use std::f32::consts::PI;
use std::ops::{Add, Mul, Sub};

use glam::{Mat3, Vec3};

const NORMALIZATION: f32 = 3.0 / (2.0 * PI);

/// Cubic B-spline smoothing kernel with smoothing length `h` and support `2h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSpline {
    h: f32,
    inv_h3: f32,
    inv_h4: f32,
}

impl CubicSpline {
    pub fn new(smoothing_length: f32) -> Self {
        let h = smoothing_length;
        Self {
            h,
            inv_h3: h.powi(-3),
            inv_h4: h.powi(-4),
        }
    }

    pub fn smoothing_length(&self) -> f32 {
        self.h
    }

    pub fn support_radius(&self) -> f32 {
        2.0 * self.h
    }

    /// Dimensionless kernel shape `f(q)`.
    pub fn shape(q: f32) -> f32 {
        if q < 1.0 {
            NORMALIZATION * (2.0 / 3.0 - q * q + 0.5 * q * q * q)
        } else if q < 2.0 {
            let s = 2.0 - q;
            NORMALIZATION * s * s * s / 6.0
        } else {
            0.0
        }
    }

    /// `f'(q)`.
    pub fn shape_derivative(q: f32) -> f32 {
        if q < 1.0 {
            NORMALIZATION * (-2.0 * q + 1.5 * q * q)
        } else if q < 2.0 {
            let s = 2.0 - q;
            -NORMALIZATION * 0.5 * s * s
        } else {
            0.0
        }
    }

    /// `W(r) = f(r/h)/h³`.
    pub fn value(&self, r: f32) -> f32 {
        Self::shape(r / self.h) * self.inv_h3
    }

    /// Weight a particle assigns to itself, `W(0)`.
    pub fn self_weight(&self) -> f32 {
        self.value(0.0)
    }

    /// `∇W` for the separation `x_ij = x_i - x_j`; zero for coincident particles.
    pub fn gradient(&self, x_ij: Vec3) -> Vec3 {
        let r = x_ij.length();
        if r <= f32::EPSILON {
            return Vec3::ZERO;
        }
        x_ij * (Self::shape_derivative(r / self.h) * self.inv_h4 / r)
    }
}

/// Per-particle quantity that kernel sums can interpolate.
pub trait Field:
    Copy + Send + Sync + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    /// Spatial derivative of the field: a vector for scalars, a Jacobian for vectors.
    type Gradient: Copy + Add<Output = Self::Gradient> + Mul<f32, Output = Self::Gradient>;

    const ZERO: Self;
    const ZERO_GRADIENT: Self::Gradient;

    /// `self ⊗ direction`.
    fn outer(self, direction: Vec3) -> Self::Gradient;
}

impl Field for f32 {
    type Gradient = Vec3;

    const ZERO: Self = 0.0;
    const ZERO_GRADIENT: Vec3 = Vec3::ZERO;

    fn outer(self, direction: Vec3) -> Vec3 {
        direction * self
    }
}

impl Field for Vec3 {
    type Gradient = Mat3;

    const ZERO: Self = Vec3::ZERO;
    const ZERO_GRADIENT: Mat3 = Mat3::ZERO;

    /// Column `k` holds `∂/∂x_k`, so `J · d` is the directional derivative along `d`.
    fn outer(self, direction: Vec3) -> Mat3 {
        Mat3::from_cols(self * direction.x, self * direction.y, self * direction.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn kernel_integrates_to_one() {
        let kernel = CubicSpline::new(0.1);
        let step = 0.01;
        let mut total = 0.0;
        for x in -20..=20 {
            for y in -20..=20 {
                for z in -20..=20 {
                    let r = Vec3::new(x as f32, y as f32, z as f32).length() * step;
                    total += kernel.value(r) * step * step * step;
                }
            }
        }
        assert_relative_eq!(total, 1.0, epsilon = 1e-2);
    }

    #[test]
    fn kernel_is_continuous_and_compact() {
        let below = CubicSpline::shape(1.0 - 1e-4);
        let above = CubicSpline::shape(1.0 + 1e-4);
        assert_relative_eq!(below, above, epsilon = 1e-3);
        assert_eq!(CubicSpline::shape(2.0), 0.0);
        assert_eq!(CubicSpline::shape_derivative(2.5), 0.0);
        assert_relative_eq!(
            CubicSpline::shape_derivative(1.0 - 1e-4),
            CubicSpline::shape_derivative(1.0 + 1e-4),
            epsilon = 1e-3
        );
    }

    #[test]
    fn gradient_points_towards_the_neighbor() {
        let kernel = CubicSpline::new(0.1);
        let x_ij = Vec3::new(0.05, 0.0, 0.0);
        let grad = kernel.gradient(x_ij);
        assert!(grad.x < 0.0);
        assert_eq!(grad.y, 0.0);
        assert_eq!(kernel.gradient(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let kernel = CubicSpline::new(0.1);
        let r = 0.13;
        let eps = 1e-4;
        let numeric = (kernel.value(r + eps) - kernel.value(r - eps)) / (2.0 * eps);
        let analytic = kernel.gradient(Vec3::new(r, 0.0, 0.0)).x;
        assert_relative_eq!(numeric, analytic, max_relative = 1e-2);
    }

    #[test]
    fn vector_outer_product_is_a_jacobian() {
        let jacobian = Vec3::new(1.0, 2.0, 3.0).outer(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(jacobian * Vec3::Y, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(jacobian * Vec3::X, Vec3::ZERO);
    }
}
