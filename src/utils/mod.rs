//! Utility functions shared by the pipeline stages

/// Feature scaling utilities
pub mod scaling {
    use crate::core::{Result, SVMError};
    use serde::{Deserialize, Serialize};

    /// Per-column standardization: `(x - mean) / std`
    ///
    /// Uses the population standard deviation. Constant columns get a scale
    /// of 1 so they map to zero instead of NaN.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct StandardScaler {
        mean: Vec<f64>,
        scale: Vec<f64>,
    }

    impl StandardScaler {
        /// Compute scaling parameters from training rows
        pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
            let n_features = rows.first().map(Vec::len).ok_or(SVMError::EmptyDataset)?;
            if let Some(row) = rows.iter().find(|r| r.len() != n_features) {
                return Err(SVMError::DimensionMismatch {
                    expected: n_features,
                    actual: row.len(),
                });
            }

            let mean: Vec<f64> = (0..n_features)
                .map(|j| super::stats::mean(rows.iter().map(|r| r[j])))
                .collect();
            let scale = (0..n_features)
                .map(|j| {
                    let std = super::stats::population_std(rows.iter().map(|r| r[j]), mean[j]);
                    if std == 0.0 {
                        1.0
                    } else {
                        std
                    }
                })
                .collect();

            Ok(Self { mean, scale })
        }

        /// Scale rows with the fitted parameters
        pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
            rows.iter().map(|row| self.transform_row(row)).collect()
        }

        pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
            if row.len() != self.mean.len() {
                return Err(SVMError::DimensionMismatch {
                    expected: self.mean.len(),
                    actual: row.len(),
                });
            }
            Ok(row
                .iter()
                .zip(self.mean.iter().zip(&self.scale))
                .map(|(x, (mean, scale))| (x - mean) / scale)
                .collect())
        }

        /// Fit on `rows` and return them scaled
        pub fn fit_transform(rows: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>)> {
            let scaler = Self::fit(rows)?;
            let scaled = scaler.transform(rows)?;
            Ok((scaler, scaled))
        }

        pub fn mean(&self) -> &[f64] {
            &self.mean
        }

        pub fn scale(&self) -> &[f64] {
            &self.scale
        }

        pub fn n_features(&self) -> usize {
            self.mean.len()
        }
    }
}

/// Statistical helpers
pub mod stats {
    /// Arithmetic mean; 0 for an empty sequence
    pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
        let (sum, count) = values
            .into_iter()
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Population standard deviation around a known mean
    pub fn population_std<I: IntoIterator<Item = f64>>(values: I, mean: f64) -> f64 {
        let (sq, count) = values
            .into_iter()
            .fold((0.0, 0usize), |(s, c), v| (s + (v - mean).powi(2), c + 1));
        if count == 0 {
            0.0
        } else {
            (sq / count as f64).sqrt()
        }
    }

    /// Digamma function ψ(x) for x > 0
    ///
    /// Shifts x above 10 with ψ(x) = ψ(x + 1) - 1/x, then applies the
    /// asymptotic expansion.
    pub fn digamma(x: f64) -> f64 {
        if x <= 0.0 {
            return f64::NAN;
        }
        let mut x = x;
        let mut result = 0.0;
        while x < 10.0 {
            result -= 1.0 / x;
            x += 1.0;
        }
        let inv = 1.0 / x;
        let inv2 = inv * inv;
        result + x.ln() - 0.5 * inv
            - inv2
                * (1.0 / 12.0
                    - inv2 * (1.0 / 120.0 - inv2 * (1.0 / 252.0 - inv2 * (1.0 / 240.0 - inv2 / 132.0))))
    }
}
