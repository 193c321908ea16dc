//! Hyperbolic tangent kernel, `K(x, y) = tanh(γ·x·y + coef0)`
//!
//! Not positive semi-definite in general; the solver clamps non-positive
//! curvature when this kernel is in the grid.

use crate::core::Result;
use crate::kernel::linear::dot;
use crate::kernel::rbf::check_gamma;
use crate::kernel::traits::Kernel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidKernel {
    pub gamma: f64,
    pub coef0: f64,
}

impl SigmoidKernel {
    pub fn new(gamma: f64, coef0: f64) -> Result<Self> {
        check_gamma(gamma)?;
        Ok(Self { gamma, coef0 })
    }
}

impl Kernel for SigmoidKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (self.gamma * dot(x, y) + self.coef0).tanh()
    }
}
