//! Kernel trait definition

/// Kernel function trait
///
/// A kernel function K(x, y) computes an inner product in some feature space.
/// Rows are dense and must have the same length.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;

    /// Compute K(x, xᵢ) against every row, in order
    fn compute_row(&self, x: &[f64], rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.compute(x, row)).collect()
    }
}
