//! Mutual information between features and a discrete label
//!
//! Continuous features use the nearest-neighbour estimator of Ross (2014),
//! "Mutual Information between Discrete and Continuous Data Sets".
//! Discrete features use the plug-in estimate from the contingency table.
//! All scores are in nats and never negative.

use crate::core::{Result, SVMError};
use crate::utils::stats::{digamma, mean, population_std};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use std::collections::BTreeMap;

/// Neighbours used by the continuous estimator
pub const DEFAULT_NEIGHBORS: usize = 3;

/// Relative size of the jitter added to continuous features
const NOISE_SCALE: f64 = 1e-10;

/// Estimator settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutualInfo {
    pub n_neighbors: usize,
    pub seed: u64,
}

impl Default for MutualInfo {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_NEIGHBORS,
            seed: 0,
        }
    }
}

impl MutualInfo {
    pub fn new(n_neighbors: usize, seed: u64) -> Self {
        Self { n_neighbors, seed }
    }

    /// Score every column of `rows` against `labels`
    ///
    /// Continuous columns are divided by their standard deviation and
    /// jittered with seeded Gaussian noise before estimation, which breaks
    /// ties between identical values.
    pub fn estimate(&self, rows: &[Vec<f64>], discrete: &[bool], labels: &[u8]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if rows.len() != labels.len() {
            return Err(SVMError::DimensionMismatch {
                expected: rows.len(),
                actual: labels.len(),
            });
        }
        let n_features = discrete.len();
        if let Some(row) = rows.iter().find(|r| r.len() != n_features) {
            return Err(SVMError::DimensionMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        if self.n_neighbors == 0 {
            return Err(SVMError::InvalidParameter(
                "n_neighbors must be positive".to_string(),
            ));
        }

        let mut columns: Vec<Vec<f64>> = (0..n_features)
            .map(|j| rows.iter().map(|r| r[j]).collect())
            .collect();

        let continuous: Vec<usize> = (0..n_features).filter(|&j| !discrete[j]).collect();
        if !continuous.is_empty() {
            let mut amplitude = Vec::with_capacity(continuous.len());
            for &j in &continuous {
                let column = &mut columns[j];
                let m = mean(column.iter().copied());
                let std = population_std(column.iter().copied(), m);
                let std = if std == 0.0 { 1.0 } else { std };
                column.iter_mut().for_each(|v| *v /= std);
                amplitude.push(mean(column.iter().map(|v| v.abs())).max(1.0));
            }

            // Row-major draw order
            let mut rng = StdRng::seed_from_u64(self.seed);
            for i in 0..rows.len() {
                for (slot, &j) in continuous.iter().enumerate() {
                    let noise: f64 = StandardNormal.sample(&mut rng);
                    columns[j][i] += NOISE_SCALE * amplitude[slot] * noise;
                }
            }
        }

        Ok(columns
            .iter()
            .zip(discrete)
            .map(|(column, &is_discrete)| {
                if is_discrete {
                    discrete_mi(column, labels)
                } else {
                    continuous_mi(column, labels, self.n_neighbors)
                }
            })
            .collect())
    }
}

/// Largest float strictly closer to zero than `r` (`r` itself when zero)
fn toward_zero(r: f64) -> f64 {
    if r > 0.0 {
        f64::from_bits(r.to_bits() - 1)
    } else {
        r
    }
}

/// Ross estimator for one continuous column
///
/// Points whose label occurs only once carry no neighbourhood information
/// and are left out.
pub fn continuous_mi(values: &[f64], labels: &[u8], n_neighbors: usize) -> f64 {
    let mut by_label: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(i);
    }

    // (value, radius, k, label count) for each kept point
    let mut points: Vec<(f64, f64, usize, usize)> = Vec::with_capacity(values.len());
    for members in by_label.values() {
        let count = members.len();
        if count < 2 {
            continue;
        }
        let k = n_neighbors.min(count - 1);
        for &i in members {
            let mut distances: Vec<f64> = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (values[i] - values[j]).abs())
                .collect();
            distances.sort_by(|a, b| a.total_cmp(b));
            points.push((values[i], toward_zero(distances[k - 1]), k, count));
        }
    }

    let n = points.len();
    if n == 0 {
        return 0.0;
    }

    let mut sum_k = 0.0;
    let mut sum_counts = 0.0;
    let mut sum_m = 0.0;
    for &(value, radius, k, count) in &points {
        let m = points
            .iter()
            .filter(|(other, ..)| (value - other).abs() <= radius)
            .count();
        sum_k += digamma(k as f64);
        sum_counts += digamma(count as f64);
        sum_m += digamma(m as f64);
    }
    let n_f = n as f64;
    let mi = digamma(n_f) + sum_k / n_f - sum_counts / n_f - sum_m / n_f;
    mi.max(0.0)
}

/// Plug-in mutual information of two discrete variables
pub fn discrete_mi(values: &[f64], labels: &[u8]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }

    let mut joint: BTreeMap<(u64, u8), usize> = BTreeMap::new();
    let mut value_counts: BTreeMap<u64, usize> = BTreeMap::new();
    let mut label_counts: BTreeMap<u8, usize> = BTreeMap::new();
    for (&v, &label) in values.iter().zip(labels) {
        let key = v.to_bits();
        *joint.entry((key, label)).or_insert(0) += 1;
        *value_counts.entry(key).or_insert(0) += 1;
        *label_counts.entry(label).or_insert(0) += 1;
    }
    if value_counts.len() == 1 || label_counts.len() == 1 {
        return 0.0;
    }

    let n_f = n as f64;
    let mi: f64 = joint
        .iter()
        .map(|(&(v, label), &nij)| {
            let nij = nij as f64;
            let a = value_counts[&v] as f64;
            let b = label_counts[&label] as f64;
            nij / n_f * (n_f * nij / (a * b)).ln()
        })
        .sum();
    let mi = mi.max(0.0);
    debug!("Discrete MI over {} cells: {:.4}", joint.len(), mi);
    mi
}

/// Feature name → score, sorted by descending score
#[derive(Debug, Clone, PartialEq)]
pub struct MiScores {
    entries: Vec<(String, f64)>,
}

impl MiScores {
    /// Pair names with scores and sort, highest first; equal scores keep column order
    pub fn new(names: &[String], scores: &[f64]) -> Self {
        let mut entries: Vec<(String, f64)> = names.iter().cloned().zip(scores.iter().copied()).collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_discrete_mi_perfect_dependence() {
        // Two balanced classes fully determined by the value: MI = ln 2
        let values = [0.0, 0.0, 1.0, 1.0];
        let labels = [1, 1, 2, 2];
        assert_relative_eq!(discrete_mi(&values, &labels), 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_discrete_mi_independent() {
        let values = [0.0, 1.0, 0.0, 1.0];
        let labels = [1, 1, 2, 2];
        assert_relative_eq!(discrete_mi(&values, &labels), 0.0, epsilon = 1e-12);

        let constant = [3.0, 3.0, 3.0, 3.0];
        assert_eq!(discrete_mi(&constant, &labels), 0.0);
    }

    #[test]
    fn test_continuous_mi_separated_classes() {
        // Two well separated clusters without distance ties. The radius sits
        // just inside the k-th neighbour, so m counts the point itself plus
        // k - 1 neighbours: m = k and MI = ψ(n) - ψ(n_c)
        let spread = |i: usize| i as f64 * 0.1 + 0.013 * (i * i) as f64;
        let values: Vec<f64> = (0..10)
            .map(spread)
            .chain((0..10).map(|i| 100.0 + spread(i)))
            .collect();
        let labels: Vec<u8> = std::iter::repeat(1).take(10).chain(std::iter::repeat(2).take(10)).collect();

        let mi = continuous_mi(&values, &labels, 3);
        assert_relative_eq!(mi, digamma(20.0) - digamma(10.0), epsilon = 1e-9);
    }

    #[test]
    fn test_continuous_mi_ignores_singleton_classes() {
        let values = [0.0, 0.4, 1.0, 7.0];
        let with_singleton = [1, 1, 1, 2];
        let without: Vec<f64> = values[..3].to_vec();
        assert_eq!(
            continuous_mi(&values, &with_singleton, 3),
            continuous_mi(&without, &[1, 1, 1], 3)
        );
        // A single class carries no information
        assert_eq!(continuous_mi(&without, &[1, 1, 1], 3), 0.0);
    }

    #[test]
    fn test_estimate_is_seeded() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i % 3) as f64, i as f64 * 0.7, ((i * 7) % 11) as f64 * 0.3])
            .collect();
        let labels: Vec<u8> = (0..30).map(|i| (i % 3) as u8 + 1).collect();
        let discrete = [true, false, false];

        let a = MutualInfo::default().estimate(&rows, &discrete, &labels).unwrap();
        let b = MutualInfo::default().estimate(&rows, &discrete, &labels).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&s| s >= 0.0));
        // Column 0 equals the label
        assert_relative_eq!(a[0], 3f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_estimate_validates_shapes() {
        let mi = MutualInfo::default();
        assert!(mi.estimate(&[], &[], &[]).is_err());
        assert!(mi.estimate(&[vec![1.0]], &[false], &[1, 2]).is_err());
        assert!(mi.estimate(&[vec![1.0, 2.0]], &[false], &[1]).is_err());
    }

    #[test]
    fn test_scores_sorted_descending() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let scores = MiScores::new(&names, &[0.2, 0.9, 0.05]);
        let order: Vec<&str> = scores.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(scores.get("c"), Some(0.05));
        assert_eq!(scores.get("z"), None);
    }

    #[test]
    fn test_toward_zero() {
        assert!(toward_zero(1.0) < 1.0);
        assert_eq!(toward_zero(0.0), 0.0);
    }
}
