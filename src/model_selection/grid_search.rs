//! Exhaustive hyperparameter search scored by cross-validation

use crate::api::SVCParams;
use crate::core::{Result, SVMError};
use crate::kernel::KernelKind;
use crate::model_selection::{cross_val_score, StratifiedKFold};
use crate::utils::stats::mean;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Cost values searched by default
pub const DEFAULT_C_GRID: [f64; 7] = [0.001, 0.01, 0.1, 1.0, 10.0, 100.0, 1000.0];

/// Search space: every C paired with every kernel, C varying slowest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearch {
    pub c_values: Vec<f64>,
    pub kernels: Vec<KernelKind>,
    /// Folds of the unshuffled stratified split used to score each point
    pub cv: usize,
    /// Settings shared by all points (gamma, degree, coef0, class weight)
    pub base: SVCParams,
}

impl Default for GridSearch {
    fn default() -> Self {
        Self {
            c_values: DEFAULT_C_GRID.to_vec(),
            kernels: KernelKind::ALL.to_vec(),
            cv: 5,
            base: SVCParams::default(),
        }
    }
}

/// Cross-validation outcome of one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub params: SVCParams,
    pub scores: Vec<f64>,
    pub mean_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub points: Vec<GridPoint>,
    pub best_index: usize,
}

impl GridSearchResult {
    pub fn best(&self) -> &GridPoint {
        &self.points[self.best_index]
    }
}

impl GridSearch {
    /// Parameter sets in evaluation order
    pub fn candidates(&self) -> Vec<SVCParams> {
        self.c_values
            .iter()
            .flat_map(|&c| {
                self.kernels.iter().map(move |&kernel| SVCParams {
                    kernel,
                    c,
                    ..self.base
                })
            })
            .collect()
    }

    /// Score every candidate; the first candidate with the highest mean wins ties
    pub fn fit(&self, x: &[Vec<f64>], y: &[u8]) -> Result<GridSearchResult> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(SVMError::InvalidParameter(
                "Grid search needs at least one C value and one kernel".to_string(),
            ));
        }
        let cv = StratifiedKFold::new(self.cv);

        let mut points: Vec<GridPoint> = Vec::with_capacity(candidates.len());
        let mut best_index = 0;
        for params in candidates {
            let scores = cross_val_score(&params, x, y, &cv, false)?;
            let mean_score = mean(scores.iter().copied());
            debug!("{params}: mean CV accuracy {mean_score:.4}");

            if points.is_empty() || mean_score > points[best_index].mean_score {
                best_index = points.len();
            }
            points.push(GridPoint {
                params,
                scores,
                mean_score,
            });
        }

        let result = GridSearchResult { points, best_index };
        info!(
            "Grid search over {} candidates: best {} ({:.4})",
            result.points.len(),
            result.best().params,
            result.best().mean_score
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Vec<Vec<f64>>, Vec<u8>) {
        let x: Vec<Vec<f64>> = (0..30)
            .map(|i| {
                let class = (i % 3) as f64;
                vec![class * 4.0 + (i as f64 * 0.37).sin(), class * -3.0 + (i as f64 * 0.11).cos()]
            })
            .collect();
        let y = (0..30).map(|i| (i % 3) as u8 + 1).collect();
        (x, y)
    }

    #[test]
    fn test_candidate_order() {
        let grid = GridSearch::default();
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 28);
        assert_eq!((candidates[0].c, candidates[0].kernel), (0.001, KernelKind::Linear));
        assert_eq!((candidates[1].c, candidates[1].kernel), (0.001, KernelKind::Rbf));
        assert_eq!((candidates[4].c, candidates[4].kernel), (0.01, KernelKind::Linear));
        assert_eq!((candidates[27].c, candidates[27].kernel), (1000.0, KernelKind::Sigmoid));
    }

    #[test]
    fn test_best_is_first_maximum() {
        let (x, y) = blobs();
        let grid = GridSearch {
            c_values: vec![1.0, 10.0],
            kernels: vec![KernelKind::Linear, KernelKind::Rbf],
            cv: 3,
            base: SVCParams::default(),
        };
        let result = grid.fit(&x, &y).unwrap();

        assert_eq!(result.points.len(), 4);
        let best = result.best().mean_score;
        assert!(result.points.iter().all(|p| p.mean_score <= best));
        assert!(result.points[..result.best_index]
            .iter()
            .all(|p| p.mean_score < best));
        // Separable clusters: the linear kernel at C = 1 is already perfect
        assert_eq!(result.best_index, 0);
        assert_eq!(best, 1.0);
    }

    #[test]
    fn test_empty_grid() {
        let (x, y) = blobs();
        let grid = GridSearch {
            kernels: Vec::new(),
            ..GridSearch::default()
        };
        assert!(grid.fit(&x, &y).is_err());
    }
}
