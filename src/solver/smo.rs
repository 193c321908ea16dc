//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the C-SVC dual
//!
//! ```text
//! min ½ αᵀQα − eᵀα   s.t.  yᵀα = 0,  0 ≤ αᵢ ≤ Cᵢ,   Qᵢⱼ = yᵢyⱼK(xᵢ, xⱼ)
//! ```
//!
//! by repeatedly optimizing a pair of multipliers while maintaining the full
//! gradient `G = Qα − e`. `Cᵢ` is `C` scaled by the weight of sample i's
//! class, which is how class weighting enters the problem.

use crate::cache::KernelCache;
use crate::core::{
    OptimizationResult, OptimizerConfig, Result, SVMError, Sample, WorkingSetStrategy,
};
use crate::kernel::Kernel;
use log::{debug, warn};
use std::sync::Arc;

/// Curvature used when K(i,i) + K(j,j) − 2K(i,j) is not positive
const TAU: f64 = 1e-12;

/// SMO solver for SVM optimization
pub struct SMOSolver<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
}

/// Per-solve state shared by the selection and update steps
struct Problem<'a> {
    samples: &'a [Sample],
    y: Vec<f64>,
    bounds: Vec<f64>,
    diag: Vec<f64>,
    alpha: Vec<f64>,
    gradient: Vec<f64>,
}

impl Problem<'_> {
    fn is_upper_bound(&self, t: usize) -> bool {
        self.alpha[t] >= self.bounds[t]
    }

    fn is_lower_bound(&self, t: usize) -> bool {
        self.alpha[t] <= 0.0
    }

    /// αₜ can move in the direction that increases yₜαₜ
    fn in_up_set(&self, t: usize) -> bool {
        if self.y[t] > 0.0 {
            !self.is_upper_bound(t)
        } else {
            !self.is_lower_bound(t)
        }
    }

    /// αₜ can move in the direction that decreases yₜαₜ
    fn in_low_set(&self, t: usize) -> bool {
        if self.y[t] > 0.0 {
            !self.is_lower_bound(t)
        } else {
            !self.is_upper_bound(t)
        }
    }
}

impl<K: Kernel> SMOSolver<K> {
    /// Create a new SMO solver with the given kernel and configuration
    pub fn new(kernel: Arc<K>, config: OptimizerConfig) -> Self {
        Self { kernel, config }
    }

    /// Solve the SVM optimization problem
    ///
    /// Takes a dataset of training samples and returns the optimized
    /// alpha values, bias term, and other optimization results.
    pub fn solve(&self, samples: &[Sample]) -> Result<OptimizationResult> {
        let mut cache = KernelCache::with_memory_limit(self.config.cache_size, samples.len());
        self.solve_with_cache(samples, &mut cache)
    }

    /// Solve the SVM optimization problem with provided kernel cache
    ///
    /// The cache must have been filled (if at all) for the same samples.
    pub fn solve_with_cache(
        &self,
        samples: &[Sample],
        cache: &mut KernelCache,
    ) -> Result<OptimizationResult> {
        self.validate(samples)?;

        let n = samples.len();
        let y: Vec<f64> = samples.iter().map(|s| s.label).collect();
        let bounds: Vec<f64> = y.iter().map(|&label| self.config.upper_bound(label)).collect();
        let diag: Vec<f64> = samples
            .iter()
            .map(|s| self.kernel.compute(&s.features, &s.features))
            .collect();

        let mut problem = Problem {
            samples,
            y,
            bounds,
            diag,
            alpha: vec![0.0; n],
            // With α = 0 the gradient is −e
            gradient: vec![-1.0; n],
        };

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            let Some((i, j)) = self.select_working_set(&problem, cache) else {
                converged = true;
                break;
            };
            self.update_pair(&mut problem, cache, i, j);
            iterations += 1;
        }

        if !converged {
            warn!(
                "SMO reached the iteration limit ({}) before the KKT tolerance {}; \
                 consider scaling the features",
                self.config.max_iterations, self.config.epsilon
            );
        }

        let b = self.calculate_bias(&problem);
        let support_vectors: Vec<usize> = problem
            .alpha
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| if a > 0.0 { Some(i) } else { None })
            .collect();
        let objective_value = self.calculate_objective(&problem);

        debug!(
            "SMO finished: n={}, iterations={}, support vectors={}, cache hit rate={:.2}",
            n,
            iterations,
            support_vectors.len(),
            cache.hit_rate()
        );

        Ok(OptimizationResult {
            alpha: problem.alpha,
            b,
            support_vectors,
            iterations,
            objective_value,
            converged,
        })
    }

    fn validate(&self, samples: &[Sample]) -> Result<()> {
        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        // Validate labels are binary (-1 or +1)
        for sample in samples {
            if sample.label != 1.0 && sample.label != -1.0 {
                return Err(SVMError::InvalidLabel(sample.label));
            }
        }

        let dim = samples[0].dim();
        if let Some(bad) = samples.iter().find(|s| s.dim() != dim) {
            return Err(SVMError::DimensionMismatch {
                expected: dim,
                actual: bad.dim(),
            });
        }

        let config = &self.config;
        if !(config.c > 0.0) || !(config.positive_weight > 0.0) || !(config.negative_weight > 0.0)
        {
            return Err(SVMError::InvalidParameter(format!(
                "C and class weights must be positive, got C={}, weights=({}, {})",
                config.c, config.positive_weight, config.negative_weight
            )));
        }
        if !(config.epsilon > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "Tolerance must be positive, got: {}",
                config.epsilon
            )));
        }

        Ok(())
    }

    /// Fetch kernel row K(i, ·) through the cache
    fn kernel_row(&self, cache: &mut KernelCache, samples: &[Sample], i: usize) -> Arc<[f64]> {
        cache.row(i, || {
            let x_i = &samples[i].features;
            samples
                .iter()
                .map(|s| self.kernel.compute(x_i, &s.features))
                .collect()
        })
    }

    /// Select the working pair, or `None` when the KKT conditions hold within epsilon
    fn select_working_set(
        &self,
        problem: &Problem<'_>,
        cache: &mut KernelCache,
    ) -> Option<(usize, usize)> {
        let n = problem.samples.len();

        // i maximizes −yₜGₜ over the up set
        let mut g_max = f64::NEG_INFINITY;
        let mut best_i = None;
        for t in 0..n {
            if problem.in_up_set(t) {
                let value = -problem.y[t] * problem.gradient[t];
                if value >= g_max {
                    g_max = value;
                    best_i = Some(t);
                }
            }
        }
        let i = best_i?;

        let k_i = match self.config.working_set_strategy {
            WorkingSetStrategy::SecondOrder => Some(self.kernel_row(cache, problem.samples, i)),
            WorkingSetStrategy::MaximalViolatingPair => None,
        };

        // j minimizes the objective change over the low set
        let mut g_max2 = f64::NEG_INFINITY;
        let mut best_j = None;
        let mut best_objective = f64::INFINITY;
        for t in 0..n {
            if !problem.in_low_set(t) {
                continue;
            }
            let value = problem.y[t] * problem.gradient[t];
            if value >= g_max2 {
                g_max2 = value;
            }
            let grad_diff = g_max + value;
            if grad_diff <= 0.0 {
                continue;
            }
            let objective = match &k_i {
                Some(k_i) => {
                    let curvature = problem.diag[i] + problem.diag[t] - 2.0 * k_i[t];
                    let curvature = if curvature > 0.0 { curvature } else { TAU };
                    -(grad_diff * grad_diff) / curvature
                }
                None => -grad_diff,
            };
            if objective <= best_objective {
                best_objective = objective;
                best_j = Some(t);
            }
        }

        if g_max + g_max2 < self.config.epsilon {
            return None;
        }
        best_j.map(|j| (i, j))
    }

    /// Analytically optimize the pair (i, j) and update the gradient
    fn update_pair(&self, problem: &mut Problem<'_>, cache: &mut KernelCache, i: usize, j: usize) {
        let k_i = self.kernel_row(cache, problem.samples, i);
        let k_j = self.kernel_row(cache, problem.samples, j);

        let (y_i, y_j) = (problem.y[i], problem.y[j]);
        let (c_i, c_j) = (problem.bounds[i], problem.bounds[j]);
        let alpha_i_old = problem.alpha[i];
        let alpha_j_old = problem.alpha[j];
        let g_i = problem.gradient[i];
        let g_j = problem.gradient[j];

        let curvature = problem.diag[i] + problem.diag[j] - 2.0 * k_i[j];
        let curvature = if curvature > 0.0 { curvature } else { TAU };

        let alpha = &mut problem.alpha;
        if y_i != y_j {
            let delta = (-g_i - g_j) / curvature;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;

            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }

            if diff > c_i - c_j {
                if alpha[i] > c_i {
                    alpha[i] = c_i;
                    alpha[j] = c_i - diff;
                }
            } else if alpha[j] > c_j {
                alpha[j] = c_j;
                alpha[i] = c_j + diff;
            }
        } else {
            let delta = (g_i - g_j) / curvature;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;

            if sum > c_i {
                if alpha[i] > c_i {
                    alpha[i] = c_i;
                    alpha[j] = sum - c_i;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }

            if sum > c_j {
                if alpha[j] > c_j {
                    alpha[j] = c_j;
                    alpha[i] = sum - c_j;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let delta_i = alpha[i] - alpha_i_old;
        let delta_j = alpha[j] - alpha_j_old;

        // Gₜ += Qₜᵢ Δαᵢ + Qₜⱼ Δαⱼ
        for t in 0..problem.gradient.len() {
            let y_t = problem.y[t];
            problem.gradient[t] += y_t * y_i * k_i[t] * delta_i + y_t * y_j * k_j[t] * delta_j;
        }
    }

    /// Calculate the bias term b = −ρ
    ///
    /// Averages yᵢGᵢ over free multipliers; without free multipliers the
    /// midpoint of the feasible interval is used.
    fn calculate_bias(&self, problem: &Problem<'_>) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut free_sum = 0.0;
        let mut free_count = 0usize;

        for t in 0..problem.samples.len() {
            let y_g = problem.y[t] * problem.gradient[t];
            let positive = problem.y[t] > 0.0;

            if problem.is_upper_bound(t) {
                if positive {
                    lower = lower.max(y_g);
                } else {
                    upper = upper.min(y_g);
                }
            } else if problem.is_lower_bound(t) {
                if positive {
                    upper = upper.min(y_g);
                } else {
                    lower = lower.max(y_g);
                }
            } else {
                free_count += 1;
                free_sum += y_g;
            }
        }

        let rho = if free_count > 0 {
            free_sum / free_count as f64
        } else {
            match (upper.is_finite(), lower.is_finite()) {
                (true, true) => (upper + lower) / 2.0,
                (true, false) => upper,
                (false, true) => lower,
                (false, false) => 0.0,
            }
        };
        -rho
    }

    /// Dual objective Σα − ½αᵀQα, computed from the maintained gradient
    fn calculate_objective(&self, problem: &Problem<'_>) -> f64 {
        let minimized: f64 = problem
            .alpha
            .iter()
            .zip(&problem.gradient)
            .map(|(&a, &g)| a * (g - 1.0))
            .sum::<f64>()
            / 2.0;
        -minimized
    }
}
