//! Optimization algorithms for SVM
//!
//! This module ties kernels and the SMO solver together into binary
//! classifiers that can make predictions.

use crate::core::{OptimizerConfig, Prediction, Result, SVMError, SVMModel, Sample};
use crate::kernel::Kernel;
use crate::solver::SMOSolver;
use log::debug;
use std::sync::Arc;

/// High-level SVM optimizer that integrates kernel functions and solving algorithms
pub struct SVMOptimizer<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
}

impl<K: Kernel> SVMOptimizer<K> {
    /// Create a new SVM optimizer with the given kernel and configuration
    pub fn new(kernel: K, config: OptimizerConfig) -> Self {
        Self {
            kernel: Arc::new(kernel),
            config,
        }
    }

    /// Create a new SVM optimizer with default configuration
    pub fn with_kernel(kernel: K) -> Self {
        Self::new(kernel, OptimizerConfig::default())
    }

    /// Train a binary SVM on a slice of samples labelled ±1
    pub fn train_samples(&self, samples: &[Sample]) -> Result<TrainedSVM<K>> {
        let solver = SMOSolver::new(Arc::clone(&self.kernel), self.config.clone());
        let result = solver.solve(samples)?;

        debug!(
            "Binary SVM trained: {} samples, {} support vectors, {} iterations",
            samples.len(),
            result.support_vectors.len(),
            result.iterations
        );

        let support_vectors = result
            .support_vectors
            .iter()
            .map(|&i| samples[i].features.clone())
            .collect();
        let dual_coef = result
            .support_vectors
            .iter()
            .map(|&i| result.alpha[i] * samples[i].label)
            .collect();

        Ok(TrainedSVM {
            kernel: Arc::clone(&self.kernel),
            support_vectors,
            dual_coef,
            bias: result.b,
            support_indices: result.support_vectors,
        })
    }

    /// Get the optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Get the kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

/// A trained binary SVM: f(x) = Σ (αᵢyᵢ) K(svᵢ, x) + b
pub struct TrainedSVM<K: Kernel> {
    kernel: Arc<K>,
    support_vectors: Vec<Vec<f64>>,
    dual_coef: Vec<f64>,
    bias: f64,
    support_indices: Vec<usize>,
}

impl<K: Kernel> TrainedSVM<K> {
    /// Rebuild a model from stored parts (e.g. a model file)
    pub fn from_parts(
        kernel: Arc<K>,
        support_vectors: Vec<Vec<f64>>,
        dual_coef: Vec<f64>,
        bias: f64,
    ) -> Result<Self> {
        if support_vectors.len() != dual_coef.len() {
            return Err(SVMError::DimensionMismatch {
                expected: support_vectors.len(),
                actual: dual_coef.len(),
            });
        }
        let support_indices = (0..support_vectors.len()).collect();
        Ok(Self {
            kernel,
            support_vectors,
            dual_coef,
            bias,
            support_indices,
        })
    }

    /// Get the decision function value for a row
    pub fn decision_function(&self, x: &[f64]) -> f64 {
        self.kernel
            .compute_row(x, &self.support_vectors)
            .iter()
            .zip(&self.dual_coef)
            .map(|(k, coef)| k * coef)
            .sum::<f64>()
            + self.bias
    }

    /// Get the support vectors
    pub fn support_vectors(&self) -> &[Vec<f64>] {
        &self.support_vectors
    }

    /// Get αᵢyᵢ for each support vector
    pub fn dual_coef(&self) -> &[f64] {
        &self.dual_coef
    }

    /// Get the indices of support vectors in the original training set
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_indices
    }
}

impl<K: Kernel> SVMModel for TrainedSVM<K> {
    fn predict(&self, x: &[f64]) -> Prediction {
        let decision_value = self.decision_function(x);
        let label = if decision_value > 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
