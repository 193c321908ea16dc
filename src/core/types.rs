//! Core type definitions for the SVM engine

use serde::{Deserialize, Serialize};

/// Output of one binary machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// +1 when the decision is strictly positive, -1 otherwise
    pub label: f64,
    pub decision_value: f64,
}

impl Prediction {
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }
}

/// Binary training sample with a dense feature row
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Feature values, one per column
    pub features: Vec<f64>,
    /// Class label (+1 or -1)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: Vec<f64>, label: f64) -> Self {
        Self { features, label }
    }

    /// Number of features
    pub fn dim(&self) -> usize {
        self.features.len()
    }
}

/// Result of optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Lagrange multipliers (alpha values)
    pub alpha: Vec<f64>,
    /// Bias term (b), so that f(x) = Σ αᵢyᵢK(xᵢ,x) + b
    pub b: f64,
    /// Indices of support vectors (where alpha > 0)
    pub support_vectors: Vec<usize>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final dual objective value (to be maximized)
    pub objective_value: f64,
    /// Whether the stopping tolerance was reached before the iteration cap
    pub converged: bool,
}

/// Working set selection strategy for SMO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkingSetStrategy {
    /// Pick the pair with the largest KKT violation (first-order information)
    MaximalViolatingPair,
    /// Pick the second index by the largest guaranteed decrease of the objective
    #[default]
    SecondOrder,
}

/// Configuration for optimizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Multiplier applied to C for samples labelled +1
    pub positive_weight: f64,
    /// Multiplier applied to C for samples labelled -1
    pub negative_weight: f64,
    /// Stopping tolerance on the maximal KKT violation
    pub epsilon: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Kernel cache size in bytes
    pub cache_size: usize,
    /// Working set selection strategy
    pub working_set_strategy: WorkingSetStrategy,
}

impl OptimizerConfig {
    /// Upper bound on alpha for a sample with the given label
    pub fn upper_bound(&self, label: f64) -> f64 {
        if label > 0.0 {
            self.c * self.positive_weight
        } else {
            self.c * self.negative_weight
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            positive_weight: 1.0,
            negative_weight: 1.0,
            epsilon: 0.001,
            max_iterations: 1_000_000,
            cache_size: 100_000_000, // 100MB
            working_set_strategy: WorkingSetStrategy::SecondOrder,
        }
    }
}
