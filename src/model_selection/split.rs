//! Seeded train/test split

use crate::core::{Result, SVMError};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and cut it into `floor(train_size * n)` training rows
/// followed by the remaining test rows
pub fn train_test_split(n: usize, train_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(train_size > 0.0 && train_size < 1.0) {
        return Err(SVMError::InvalidParameter(format!(
            "train_size must be between 0 and 1, got {train_size}"
        )));
    }
    let n_train = (n as f64 * train_size).floor() as usize;
    if n_train == 0 || n_train == n {
        return Err(SVMError::InvalidDataset(format!(
            "Cannot split {n} samples with train_size {train_size}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let test = indices.split_off(n_train);

    info!("Split {} samples: train={}, test={}", n, indices.len(), test.len());
    Ok(TrainTestSplit {
        train: indices,
        test,
    })
}

/// Gather `items` at `indices`
pub fn take<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}
