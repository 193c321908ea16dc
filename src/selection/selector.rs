//! Threshold filter over mutual-information scores

use crate::core::{Result, SVMError};
use crate::data::{FeatureMatrix, LabelVector};
use crate::selection::{MiScores, MutualInfo};
use log::{debug, info};

/// Keeps the columns whose score is strictly greater than `threshold`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSelector {
    pub threshold: f64,
    pub estimator: MutualInfo,
}

impl Default for FeatureSelector {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            estimator: MutualInfo::default(),
        }
    }
}

/// Scores and the reduced matrix
#[derive(Debug, Clone)]
pub struct Selection {
    pub scores: MiScores,
    pub features: FeatureMatrix,
}

impl FeatureSelector {
    pub fn new(threshold: f64, estimator: MutualInfo) -> Self {
        Self {
            threshold,
            estimator,
        }
    }

    /// Score all columns of `x`
    pub fn score(&self, x: &FeatureMatrix, y: &LabelVector) -> Result<MiScores> {
        let scores = self.estimator.estimate(x.rows(), x.discrete(), &y.codes())?;
        Ok(MiScores::new(x.columns(), &scores))
    }

    /// Score and drop uninformative columns; kept columns stay in their original order
    pub fn select(&self, x: &FeatureMatrix, y: &LabelVector) -> Result<Selection> {
        let scores = self.score(x, y)?;
        for (name, score) in scores.entries() {
            debug!("MI {name}: {score:.4}");
        }

        let keep: Vec<usize> = x
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| scores.get(name).is_some_and(|s| s > self.threshold))
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            return Err(SVMError::InvalidDataset(format!(
                "No feature has mutual information above {}",
                self.threshold
            )));
        }

        let features = x.select_columns(&keep);
        info!(
            "Selected {} of {} features: {}",
            features.n_cols(),
            x.n_cols(),
            features.columns().join(", ")
        );
        Ok(Selection { scores, features })
    }
}
