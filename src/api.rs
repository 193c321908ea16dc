//! High-level multiclass SVM classifier
//!
//! [`SVC`] is a builder over the binary SMO trainer. Fitting it on integer
//! class codes trains one binary machine per pair of classes and predicts
//! by majority vote.
//!
//! # Quick Start
//!
//! ```rust
//! use posvm::api::{ClassWeight, SVC};
//! use posvm::kernel::KernelKind;
//! use posvm::Classifier;
//!
//! # fn main() -> posvm::core::Result<()> {
//! let x = vec![
//!     vec![0.0, 0.1], vec![0.2, 0.0],
//!     vec![5.0, 5.1], vec![5.2, 4.9],
//!     vec![0.0, 9.8], vec![0.3, 10.1],
//! ];
//! let y = vec![1, 1, 2, 2, 3, 3];
//!
//! let model = SVC::new()
//!     .with_kernel(KernelKind::Linear)
//!     .with_c(10.0)
//!     .with_class_weight(ClassWeight::Balanced)
//!     .fit(&x, &y)?;
//!
//! assert_eq!(model.predict_class(&[5.1, 5.0]), 2);
//! assert_eq!(model.accuracy(&x, &y), 1.0);
//! # Ok(())
//! # }
//! ```

use crate::core::{
    Classifier, OptimizerConfig, Result, SVMError, SVMModel, Sample, WorkingSetStrategy,
};
use crate::kernel::{KernelKind, KernelType};
use crate::optimizer::{SVMOptimizer, TrainedSVM};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kernel coefficient for rbf, poly and sigmoid kernels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gamma {
    /// `1 / (n_features * Var(X))`, or 1.0 when the training matrix has no variance
    #[default]
    Scale,
    Value(f64),
}

impl Gamma {
    /// Resolve against a training matrix
    pub fn resolve(&self, x: &[Vec<f64>]) -> f64 {
        match *self {
            Gamma::Value(gamma) => gamma,
            Gamma::Scale => {
                let n_features = x.first().map_or(0, Vec::len);
                let count = (x.len() * n_features) as f64;
                if count == 0.0 {
                    return 1.0;
                }
                let mean = x.iter().flatten().sum::<f64>() / count;
                let var = x.iter().flatten().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
                if var == 0.0 {
                    1.0
                } else {
                    1.0 / (n_features as f64 * var)
                }
            }
        }
    }
}

/// Per-class scaling of the cost parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    #[default]
    None,
    /// `w_c = n_samples / (n_classes * n_c)`
    Balanced,
}

impl ClassWeight {
    /// Weight for every class present in `y`
    pub fn weights(&self, y: &[u8]) -> BTreeMap<u8, f64> {
        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        for &label in y {
            *counts.entry(label).or_insert(0) += 1;
        }
        let n_classes = counts.len() as f64;
        counts
            .into_iter()
            .map(|(class, count)| {
                let weight = match self {
                    ClassWeight::None => 1.0,
                    ClassWeight::Balanced => y.len() as f64 / (n_classes * count as f64),
                };
                (class, weight)
            })
            .collect()
    }
}

/// Hyperparameters of a support vector classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SVCParams {
    pub kernel: KernelKind,
    pub c: f64,
    pub gamma: Gamma,
    pub degree: u32,
    pub coef0: f64,
    pub class_weight: ClassWeight,
}

impl Default for SVCParams {
    fn default() -> Self {
        Self {
            kernel: KernelKind::Rbf,
            c: 1.0,
            gamma: Gamma::Scale,
            degree: 3,
            coef0: 0.0,
            class_weight: ClassWeight::None,
        }
    }
}

impl fmt::Display for SVCParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SVC(C={}, kernel='{}'", self.c, self.kernel)?;
        if self.class_weight == ClassWeight::Balanced {
            write!(f, ", class_weight='balanced'")?;
        }
        write!(f, ")")
    }
}

/// Support vector classifier builder
#[derive(Debug, Clone, Default)]
pub struct SVC {
    params: SVCParams,
    config: OptimizerConfig,
}

impl SVC {
    /// Create a classifier with an rbf kernel, C = 1 and gamma 'scale'
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier from a full parameter set
    pub fn from_params(params: SVCParams) -> Self {
        Self {
            params,
            config: OptimizerConfig::default(),
        }
    }

    pub fn with_kernel(mut self, kernel: KernelKind) -> Self {
        self.params.kernel = kernel;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = c;
        self
    }

    pub fn with_gamma(mut self, gamma: Gamma) -> Self {
        self.params.gamma = gamma;
        self
    }

    pub fn with_degree(mut self, degree: u32) -> Self {
        self.params.degree = degree;
        self
    }

    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.params.coef0 = coef0;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.params.class_weight = class_weight;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Set maximum number of iterations per binary machine
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    /// Choose how SMO picks its working pair
    pub fn with_working_set_strategy(mut self, strategy: WorkingSetStrategy) -> Self {
        self.config.working_set_strategy = strategy;
        self
    }

    pub fn params(&self) -> &SVCParams {
        &self.params
    }

    /// Train one-vs-one machines on rows `x` with class codes `y`
    pub fn fit(&self, x: &[Vec<f64>], y: &[u8]) -> Result<TrainedModel> {
        if x.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(SVMError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().find(|row| row.len() != n_features) {
            return Err(SVMError::DimensionMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        if !(self.params.c > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive, got {}",
                self.params.c
            )));
        }

        let gamma = self.params.gamma.resolve(x);
        if !(gamma > 0.0) || !gamma.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "gamma must be positive, got {gamma}"
            )));
        }
        let kernel = self
            .params
            .kernel
            .resolve(gamma, self.params.degree, self.params.coef0)?;

        let weights = self.params.class_weight.weights(y);
        let classes: Vec<u8> = weights.keys().copied().collect();
        if classes.len() < 2 {
            return Err(SVMError::InvalidDataset(format!(
                "Need samples of at least two classes, got {}",
                classes.len()
            )));
        }

        let mut machines = Vec::with_capacity(classes.len() * (classes.len() - 1) / 2);
        for (i, &positive) in classes.iter().enumerate() {
            for &negative in &classes[i + 1..] {
                let samples: Vec<Sample> = x
                    .iter()
                    .zip(y)
                    .filter(|(_, label)| **label == positive || **label == negative)
                    .map(|(row, &label)| {
                        Sample::new(row.clone(), if label == positive { 1.0 } else { -1.0 })
                    })
                    .collect();

                let config = OptimizerConfig {
                    c: self.params.c,
                    positive_weight: weights[&positive],
                    negative_weight: weights[&negative],
                    ..self.config.clone()
                };
                let svm = SVMOptimizer::new(kernel, config).train_samples(&samples)?;
                machines.push(BinaryMachine {
                    positive,
                    negative,
                    svm,
                });
            }
        }

        debug!(
            "Fitted {} with {} pairwise machines on {} rows",
            self.params,
            machines.len(),
            x.len()
        );

        Ok(TrainedModel {
            params: self.params,
            kernel,
            classes,
            n_features,
            machines,
        })
    }
}

/// Binary machine separating `positive` (+1) from `negative` (-1)
pub struct BinaryMachine {
    positive: u8,
    negative: u8,
    svm: TrainedSVM<KernelType>,
}

impl BinaryMachine {
    pub fn new(positive: u8, negative: u8, svm: TrainedSVM<KernelType>) -> Self {
        Self {
            positive,
            negative,
            svm,
        }
    }

    pub fn positive(&self) -> u8 {
        self.positive
    }

    pub fn negative(&self) -> u8 {
        self.negative
    }

    pub fn svm(&self) -> &TrainedSVM<KernelType> {
        &self.svm
    }

    /// Class this machine votes for; a zero decision goes to `negative`
    pub fn vote(&self, x: &[f64]) -> u8 {
        if self.svm.predict(x).label > 0.0 {
            self.positive
        } else {
            self.negative
        }
    }
}

/// Trained one-vs-one classifier
pub struct TrainedModel {
    params: SVCParams,
    kernel: KernelType,
    classes: Vec<u8>,
    n_features: usize,
    machines: Vec<BinaryMachine>,
}

impl TrainedModel {
    /// Reassemble a classifier from stored machines
    pub fn from_parts(
        params: SVCParams,
        kernel: KernelType,
        classes: Vec<u8>,
        n_features: usize,
        machines: Vec<BinaryMachine>,
    ) -> Result<Self> {
        let expected = classes.len() * classes.len().saturating_sub(1) / 2;
        if classes.len() < 2 || machines.len() != expected {
            return Err(SVMError::InvalidDataset(format!(
                "{} classes need {} pairwise machines, got {}",
                classes.len(),
                expected,
                machines.len()
            )));
        }
        for machine in &machines {
            for class in [machine.positive, machine.negative] {
                if !classes.contains(&class) {
                    return Err(SVMError::InvalidDataset(format!(
                        "Machine refers to unknown class {class}"
                    )));
                }
            }
            if let Some(sv) = machine
                .svm
                .support_vectors()
                .iter()
                .find(|sv| sv.len() != n_features)
            {
                return Err(SVMError::DimensionMismatch {
                    expected: n_features,
                    actual: sv.len(),
                });
            }
        }

        Ok(Self {
            params,
            kernel,
            classes,
            n_features,
            machines,
        })
    }

    pub fn params(&self) -> &SVCParams {
        &self.params
    }

    /// Kernel with gamma resolved against the training data
    pub fn kernel(&self) -> &KernelType {
        &self.kernel
    }

    /// Sorted class codes seen during training
    pub fn classes(&self) -> &[u8] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn machines(&self) -> &[BinaryMachine] {
        &self.machines
    }

    /// Vote counts per class, aligned with [`TrainedModel::classes`]
    pub fn votes(&self, x: &[f64]) -> Vec<usize> {
        let mut votes = vec![0; self.classes.len()];
        for machine in &self.machines {
            let winner = machine.vote(x);
            if let Some(idx) = self.classes.iter().position(|&c| c == winner) {
                votes[idx] += 1;
            }
        }
        votes
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            params: self.params,
            kernel: self.kernel,
            classes: self.classes.clone(),
            n_features: self.n_features,
            n_machines: self.machines.len(),
            n_support_vectors: self.machines.iter().map(|m| m.svm.n_support_vectors()).sum(),
        }
    }
}

impl Classifier for TrainedModel {
    fn predict_class(&self, x: &[f64]) -> u8 {
        let votes = self.votes(x);
        // First maximum wins, so ties go to the lower class code
        let mut best = 0;
        for (idx, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = idx;
            }
        }
        self.classes[best]
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub params: SVCParams,
    pub kernel: KernelType,
    pub classes: Vec<u8>,
    pub n_features: usize,
    pub n_machines: usize,
    /// Summed over pairwise machines
    pub n_support_vectors: usize,
}
