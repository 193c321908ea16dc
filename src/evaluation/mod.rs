//! Accuracy and confusion matrix

use crate::data::Position;
use std::fmt;

/// Fraction of positions where `predicted` equals `truth`; 0 for empty input
pub fn accuracy_score(truth: &[u8], predicted: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}

/// 5×5 counts of (true position, predicted position) in order PG, SG, SF, PF, C
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: [[usize; 5]; 5],
}

impl ConfusionMatrix {
    /// Tally class codes; codes outside 1..=5 are ignored
    pub fn from_codes(truth: &[u8], predicted: &[u8]) -> Self {
        let mut counts = [[0; 5]; 5];
        for (&t, &p) in truth.iter().zip(predicted) {
            if let (Some(t), Some(p)) = (Position::from_code(t), Position::from_code(p)) {
                counts[usize::from(t.code() - 1)][usize::from(p.code() - 1)] += 1;
            }
        }
        Self { counts }
    }

    pub fn get(&self, truth: Position, predicted: Position) -> usize {
        self.counts[usize::from(truth.code() - 1)][usize::from(predicted.code() - 1)]
    }

    pub fn counts(&self) -> &[[usize; 5]; 5] {
        &self.counts
    }

    /// Row sums: how many samples of each true position
    pub fn row_totals(&self) -> [usize; 5] {
        self.counts.map(|row| row.iter().sum())
    }

    /// Column sums: how many predictions of each position
    pub fn column_totals(&self) -> [usize; 5] {
        let mut totals = [0; 5];
        for row in &self.counts {
            for (total, count) in totals.iter_mut().zip(row) {
                *total += count;
            }
        }
        totals
    }

    pub fn total(&self) -> usize {
        self.row_totals().iter().sum()
    }

    /// Diagonal over total
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (0..5).map(|i| self.counts[i][i]).sum::<usize>() as f64 / total as f64
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Table with an `All` column of row totals and an `All` row of column totals
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total().to_string().len().max(3) + 2;
        write!(f, "{:<4}", "")?;
        for position in Position::ALL {
            write!(f, "{:>width$}", position.label())?;
        }
        writeln!(f, "{:>width$}", "All")?;

        let row_totals = self.row_totals();
        for (i, position) in Position::ALL.iter().enumerate() {
            write!(f, "{:<4}", position.label())?;
            for count in &self.counts[i] {
                write!(f, "{count:>width$}")?;
            }
            writeln!(f, "{:>width$}", row_totals[i])?;
        }

        write!(f, "{:<4}", "All")?;
        for total in self.column_totals() {
            write!(f, "{total:>width$}")?;
        }
        write!(f, "{:>width$}", self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_score() {
        assert_eq!(accuracy_score(&[1, 2, 3, 4], &[1, 2, 3, 5]), 0.75);
        assert_eq!(accuracy_score(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let truth = [1, 1, 2, 3, 5, 5, 4];
        let predicted = [1, 2, 2, 3, 5, 4, 4];
        let matrix = ConfusionMatrix::from_codes(&truth, &predicted);

        assert_eq!(matrix.get(Position::PG, Position::PG), 1);
        assert_eq!(matrix.get(Position::PG, Position::SG), 1);
        assert_eq!(matrix.get(Position::C, Position::PF), 1);
        assert_eq!(matrix.total(), truth.len());
        assert!((matrix.accuracy() - accuracy_score(&truth, &predicted)).abs() < 1e-12);
    }

    #[test]
    fn test_confusion_matrix_totals_agree() {
        let truth = [1, 2, 2, 3, 3, 3, 4, 5, 5];
        let predicted = [2, 2, 3, 3, 3, 1, 4, 5, 4];
        let matrix = ConfusionMatrix::from_codes(&truth, &predicted);

        assert_eq!(matrix.row_totals(), [1, 2, 3, 1, 2]);
        assert_eq!(matrix.column_totals(), [1, 2, 3, 2, 1]);
        assert_eq!(
            matrix.row_totals().iter().sum::<usize>(),
            matrix.column_totals().iter().sum::<usize>()
        );
    }

    #[test]
    fn test_confusion_matrix_display() {
        let matrix = ConfusionMatrix::from_codes(&[1, 5], &[1, 4]);
        let text = matrix.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 7);
        assert!(lines[0].contains("PG") && lines[0].trim_end().ends_with("All"));
        assert!(lines[6].starts_with("All"));
        assert!(lines[6].trim_end().ends_with('2'));
        let c_row: Vec<&str> = lines[5].split_whitespace().collect();
        assert_eq!(c_row, vec!["C", "0", "0", "0", "1", "0", "1"]);
    }
}
