//! Runtime kernel selection
//!
//! Grid search and model files pick kernels by name, so the concrete kernel
//! structs are wrapped in [`KernelType`], which dispatches at runtime.

use crate::core::{Result, SVMError};
use crate::kernel::{Kernel, LinearKernel, PolynomialKernel, RBFKernel, SigmoidKernel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel family, before data-dependent parameters are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    Linear,
    Rbf,
    Poly,
    Sigmoid,
}

impl KernelKind {
    /// All kernel families, in grid-search order
    pub const ALL: [KernelKind; 4] = [
        KernelKind::Linear,
        KernelKind::Rbf,
        KernelKind::Poly,
        KernelKind::Sigmoid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            KernelKind::Linear => "linear",
            KernelKind::Rbf => "rbf",
            KernelKind::Poly => "poly",
            KernelKind::Sigmoid => "sigmoid",
        }
    }

    /// Build the concrete kernel for the given parameters
    ///
    /// `gamma` is ignored by the linear kernel, `degree` by everything but
    /// the polynomial one.
    pub fn resolve(&self, gamma: f64, degree: u32, coef0: f64) -> Result<KernelType> {
        Ok(match self {
            KernelKind::Linear => KernelType::Linear(LinearKernel::new()),
            KernelKind::Rbf => KernelType::Rbf(RBFKernel::new(gamma)?),
            KernelKind::Poly => {
                KernelType::Polynomial(PolynomialKernel::new(degree, gamma, coef0)?)
            }
            KernelKind::Sigmoid => KernelType::Sigmoid(SigmoidKernel::new(gamma, coef0)?),
        })
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelKind {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(KernelKind::Linear),
            "rbf" => Ok(KernelKind::Rbf),
            "poly" | "polynomial" => Ok(KernelKind::Poly),
            "sigmoid" => Ok(KernelKind::Sigmoid),
            other => Err(SVMError::InvalidParameter(format!(
                "Unknown kernel: {other}. Use linear, rbf, poly or sigmoid"
            ))),
        }
    }
}

/// A fully parameterized kernel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelType {
    Linear(LinearKernel),
    Rbf(RBFKernel),
    Polynomial(PolynomialKernel),
    Sigmoid(SigmoidKernel),
}

impl KernelType {
    pub fn kind(&self) -> KernelKind {
        match self {
            KernelType::Linear(_) => KernelKind::Linear,
            KernelType::Rbf(_) => KernelKind::Rbf,
            KernelType::Polynomial(_) => KernelKind::Poly,
            KernelType::Sigmoid(_) => KernelKind::Sigmoid,
        }
    }
}

impl Kernel for KernelType {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            KernelType::Linear(k) => k.compute(x, y),
            KernelType::Rbf(k) => k.compute(x, y),
            KernelType::Polynomial(k) => k.compute(x, y),
            KernelType::Sigmoid(k) => k.compute(x, y),
        }
    }
}
