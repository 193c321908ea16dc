//! Core traits shared by the binary and multiclass models

use crate::core::Prediction;

/// Trained binary SVM, one per class pair
pub trait SVMModel: Send + Sync {
    /// Predict a single feature row
    fn predict(&self, x: &[f64]) -> Prediction;

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}

/// Anything that maps a feature row to an integer class code
pub trait Classifier {
    /// Predict the class code of a single row
    fn predict_class(&self, x: &[f64]) -> u8;

    /// Predict class codes for many rows
    fn predict_classes(&self, rows: &[Vec<f64>]) -> Vec<u8> {
        rows.iter().map(|x| self.predict_class(x)).collect()
    }

    /// Fraction of rows whose prediction equals the given label
    fn accuracy(&self, rows: &[Vec<f64>], labels: &[u8]) -> f64 {
        crate::evaluation::accuracy_score(labels, &self.predict_classes(rows))
    }
}
