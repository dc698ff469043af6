//! Error types for physim.
//!
//! Only construction and setter validation can fail. Numerical divergence
//! during stepping is reported through `Simulation::has_diverged` instead.

use thiserror::Error;

/// Errors raised while building or reconfiguring a simulator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A scalar or vector parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    /// A particle ended up with zero or negative mass.
    #[error("particle {index} has non-positive mass {mass}")]
    NonPositiveMass { index: usize, mass: f32 },
    /// A tetrahedron has (near) zero or negative rest volume.
    #[error("tetrahedron {index} is degenerate (rest volume {volume})")]
    DegenerateTetrahedron { index: usize, volume: f32 },
    /// The shape predicate rejected every seed point.
    #[error("fluid region is empty: the shape predicate accepted no lattice point")]
    EmptyFluidRegion,
    /// The initial mass correction did not reach the density tolerance.
    #[error("mass correction did not converge after {iterations} iterations (relative error {error})")]
    MassCorrectionDiverged { iterations: u32, error: f32 },
    /// Total particle mass disagrees with density times volume.
    #[error("total mass {total_mass} does not match density x volume {expected}")]
    MassMismatch { total_mass: f32, expected: f32 },
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;

/// Fails with [`SimError::InvalidParameter`] unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(name, format!("must be positive, got {value}")))
    }
}

/// Fails with [`SimError::InvalidParameter`] unless `value` is finite and not negative.
pub(crate) fn ensure_non_negative(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(
            name,
            format!("must be non-negative, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_check_rejects_zero_and_nan() {
        assert!(ensure_positive("h", 0.1).is_ok());
        assert!(ensure_positive("h", 0.0).is_err());
        assert!(ensure_positive("h", f32::NAN).is_err());
        assert!(ensure_non_negative("eta", 0.0).is_ok());
        assert!(ensure_non_negative("eta", -1.0).is_err());
    }

    #[test]
    fn errors_render_their_context() {
        let err = SimError::NonPositiveMass {
            index: 3,
            mass: -0.5,
        };
        assert_eq!(err.to_string(), "particle 3 has non-positive mass -0.5");
    }
}
