//! Gaussian kernel
//!
//! `K(x, y) = exp(-γ‖x − y‖²)`. With standardized player statistics the
//! default γ is `1 / (n_features · Var(X))`, resolved by the classifier.

use crate::core::{Result, SVMError};
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};

/// Radial basis function kernel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// Kernel with width `gamma`; rejects non-positive or non-finite values
    pub fn new(gamma: f64) -> Result<Self> {
        check_gamma(gamma)?;
        Ok(Self { gamma })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (-self.gamma * squared_distance(x, y)).exp()
    }
}

pub(crate) fn check_gamma(gamma: f64) -> Result<()> {
    if gamma > 0.0 && gamma.is_finite() {
        Ok(())
    } else {
        Err(SVMError::InvalidParameter(format!(
            "gamma must be positive, got {gamma}"
        )))
    }
}

/// ‖x − y‖² over two equal-length rows
pub(crate) fn squared_distance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len(), "rows must have the same length");
    x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_bad_gamma() {
        for gamma in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                RBFKernel::new(gamma),
                Err(SVMError::InvalidParameter(_))
            ));
        }
        assert_eq!(RBFKernel::new(0.5).unwrap().gamma(), 0.5);
    }

    #[test]
    fn test_same_player_is_one() {
        let kernel = RBFKernel::new(0.2).unwrap();
        let row = [0.8, -1.1, 0.3, 2.4];
        assert_relative_eq!(kernel.compute(&row, &row), 1.0);
    }

    #[test]
    fn test_known_value() {
        let kernel = RBFKernel::new(0.5).unwrap();
        // distance² = 1 + 4
        assert_relative_eq!(
            kernel.compute(&[1.0, 0.0], &[0.0, 2.0]),
            (-2.5f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_decays_with_distance() {
        let kernel = RBFKernel::new(0.1).unwrap();
        let guard = [1.2, -0.9, 0.4];
        let wing = [0.3, 0.1, -0.2];
        let center = [-1.5, 2.0, -0.8];

        let near = kernel.compute(&guard, &wing);
        let far = kernel.compute(&guard, &center);
        assert_eq!(near, kernel.compute(&wing, &guard));
        assert!(far < near && far > 0.0);
    }

    #[test]
    fn test_squared_distance() {
        assert_eq!(squared_distance(&[1.0, 2.0], &[4.0, 6.0]), 25.0);
    }
}
