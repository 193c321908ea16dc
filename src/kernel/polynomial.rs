//! Polynomial kernel
//!
//! `K(x, y) = (γ·x·y + coef0)^d`. The classifier defaults to `d = 3` and
//! `coef0 = 0`, so odd degrees keep the sign of the dot product.

use crate::core::{Result, SVMError};
use crate::kernel::linear::dot;
use crate::kernel::rbf::check_gamma;
use crate::kernel::traits::Kernel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolynomialKernel {
    pub gamma: f64,
    pub coef0: f64,
    pub degree: u32,
}

impl PolynomialKernel {
    /// Build a polynomial kernel
    ///
    /// # Examples
    /// ```
    /// use posvm::kernel::{Kernel, PolynomialKernel};
    ///
    /// let kernel = PolynomialKernel::new(3, 0.5, 0.0)?;
    /// // (0.5 · 2)³
    /// assert_eq!(kernel.compute(&[1.0, 1.0], &[1.0, 1.0]), 1.0);
    /// # Ok::<(), posvm::core::SVMError>(())
    /// ```
    pub fn new(degree: u32, gamma: f64, coef0: f64) -> Result<Self> {
        if degree == 0 {
            return Err(SVMError::InvalidParameter(
                "Polynomial degree must be positive".to_string(),
            ));
        }
        check_gamma(gamma)?;
        Ok(Self {
            gamma,
            coef0,
            degree,
        })
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (self.gamma * dot(x, y) + self.coef0).powi(self.degree as i32)
    }
}
