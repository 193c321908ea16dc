//! Stratified k-fold cross-validation

use crate::api::{SVCParams, SVC};
use crate::core::{Classifier, Result, SVMError};
use crate::model_selection::take;
use crate::utils::scaling::StandardScaler;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

/// One train/test fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// K-fold splitter that keeps class proportions in every fold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    /// Shuffle each class's fold assignment with this seed
    pub shuffle: Option<u64>,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: None,
        }
    }

    pub fn shuffled(n_splits: usize, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle: Some(seed),
        }
    }

    /// Assign every sample to a test fold
    ///
    /// Classes are numbered by first appearance in `y`. Sorting those
    /// numbers and dealing them round-robin decides how many members of each
    /// class land in each fold; each class then fills its fold slots in
    /// sample order (or a seeded shuffle of it).
    pub fn split(&self, y: &[u8]) -> Result<Vec<Fold>> {
        let n = y.len();
        if self.n_splits < 2 {
            return Err(SVMError::InvalidParameter(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }
        if self.n_splits > n {
            return Err(SVMError::InvalidParameter(format!(
                "Cannot have n_splits={} greater than the number of samples {}",
                self.n_splits, n
            )));
        }

        // members[c] lists the samples of the c-th class to appear
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut encoded = Vec::with_capacity(n);
        let mut seen: HashMap<u8, usize> = HashMap::new();
        for (i, &label) in y.iter().enumerate() {
            let class = *seen.entry(label).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            members[class].push(i);
            encoded.push(class);
        }
        let smallest = members.iter().map(Vec::len).min().unwrap_or(0);
        if members.iter().all(|m| m.len() < self.n_splits) {
            return Err(SVMError::InvalidDataset(format!(
                "n_splits={} cannot be greater than the number of members in each class",
                self.n_splits
            )));
        }
        if smallest < self.n_splits {
            warn!(
                "The least populated class has only {} members, which is less than n_splits={}",
                smallest, self.n_splits
            );
        }

        encoded.sort_unstable();
        // allocation[fold][class]
        let mut allocation = vec![vec![0usize; members.len()]; self.n_splits];
        for (pos, &class) in encoded.iter().enumerate() {
            allocation[pos % self.n_splits][class] += 1;
        }

        let mut rng = self.shuffle.map(StdRng::seed_from_u64);
        let mut test_fold = vec![0usize; n];
        for (class, indices) in members.iter().enumerate() {
            let mut slots: Vec<usize> = (0..self.n_splits)
                .flat_map(|fold| std::iter::repeat(fold).take(allocation[fold][class]))
                .collect();
            if let Some(rng) = rng.as_mut() {
                slots.shuffle(rng);
            }
            for (&i, fold) in indices.iter().zip(slots) {
                test_fold[i] = fold;
            }
        }

        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..n).partition(|&i| test_fold[i] == fold);
                Fold { train, test }
            })
            .collect())
    }
}

/// Accuracy of `params` on every fold
///
/// With `scale` set, a [`StandardScaler`] is fitted on each training fold
/// and applied to both sides of that fold.
pub fn cross_val_score(
    params: &SVCParams,
    x: &[Vec<f64>],
    y: &[u8],
    cv: &StratifiedKFold,
    scale: bool,
) -> Result<Vec<f64>> {
    if x.len() != y.len() {
        return Err(SVMError::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    let svc = SVC::from_params(*params);

    cv.split(y)?
        .iter()
        .enumerate()
        .map(|(k, fold)| {
            let mut x_train = take(x, &fold.train);
            let mut x_test = take(x, &fold.test);
            if scale {
                let scaler = StandardScaler::fit(&x_train)?;
                x_train = scaler.transform(&x_train)?;
                x_test = scaler.transform(&x_test)?;
            }
            let model = svc.fit(&x_train, &take(y, &fold.train))?;
            let score = model.accuracy(&x_test, &take(y, &fold.test));
            debug!("{params} fold {k}: {score:.4}");
            Ok(score)
        })
        .collect()
}
