//! Feature engineering: row filter, column drop, ratio features, labels

use crate::core::{Result, SVMError};
use crate::data::{Dataset, Position};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Ratio features appended after the kept statistics: (name, numerator, denominator)
pub const RATIO_FEATURES: [(&str, &str, &str); 3] = [
    ("AST/PTS", "AST", "PTS"),
    ("TRB/AST", "TRB", "AST"),
    ("STL/BLK", "STL", "BLK"),
];

/// Feature engineering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rows with fewer minutes per game are dropped
    pub min_minutes: f64,
    /// Columns removed before modeling
    pub drop_columns: Vec<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_minutes: 15.0,
            drop_columns: vec!["Player".into(), "Age".into(), "Tm".into()],
        }
    }
}

/// Named numeric columns stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    discrete: Vec<bool>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, discrete: Vec<bool>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if discrete.len() != columns.len() {
            return Err(SVMError::DimensionMismatch {
                expected: columns.len(),
                actual: discrete.len(),
            });
        }
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(SVMError::DimensionMismatch {
                expected: columns.len(),
                actual: row.len(),
            });
        }
        Ok(Self {
            columns,
            discrete,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Discrete flag per column
    pub fn discrete(&self) -> &[bool] {
        &self.discrete
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Keep only the given columns, in the given order
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            discrete: indices.iter().map(|&i| self.discrete[i]).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
        }
    }

    /// Keep only columns with the given names, in this matrix's order
    pub fn select_named(&self, names: &[String]) -> Result<Self> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .column_index(name)
                .ok_or_else(|| SVMError::MissingColumn(name.clone()))?;
            indices.push(idx);
        }
        indices.sort_unstable();
        Ok(self.select_columns(&indices))
    }
}

/// Positions aligned with feature rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVector {
    positions: Vec<Position>,
}

impl LabelVector {
    pub fn new(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Integer codes, PG=1 through C=5
    pub fn codes(&self) -> Vec<u8> {
        self.positions.iter().map(Position::code).collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Build the model inputs from a loaded dataset
///
/// Keeps rows with `MP >= min_minutes`, drops the configured columns,
/// appends the ratio features and encodes `Pos`. Text columns never
/// reach the matrix.
pub fn engineer(dataset: &Dataset, config: &FeatureConfig) -> Result<(FeatureMatrix, LabelVector)> {
    let index = |name: &str| {
        dataset
            .column_index(name)
            .ok_or_else(|| SVMError::MissingColumn(name.to_string()))
    };
    let mp = index("MP")?;
    let ratios = RATIO_FEATURES
        .iter()
        .map(|&(name, num, den)| Ok((name, index(num)?, index(den)?)))
        .collect::<Result<Vec<_>>>()?;

    let kept: Vec<usize> = (0..dataset.numeric_columns().len())
        .filter(|&i| !config.drop_columns.contains(&dataset.numeric_columns()[i]))
        .collect();

    let mut columns: Vec<String> = kept
        .iter()
        .map(|&i| dataset.numeric_columns()[i].clone())
        .collect();
    let mut discrete: Vec<bool> = kept.iter().map(|&i| dataset.is_integral(i)).collect();
    for (name, _, _) in &ratios {
        columns.push(name.to_string());
        discrete.push(false);
    }

    let mut rows = Vec::new();
    let mut positions = Vec::new();
    for record in dataset.records() {
        if record.stats[mp] < config.min_minutes {
            continue;
        }
        let position: Position = record.position.parse()?;

        let mut row: Vec<f64> = kept.iter().map(|&i| record.stats[i]).collect();
        row.extend(
            ratios
                .iter()
                .map(|&(_, num, den)| ratio(record.stats[num], record.stats[den])),
        );
        rows.push(row);
        positions.push(position);
    }

    if rows.is_empty() {
        return Err(SVMError::InvalidDataset(format!(
            "No records with MP >= {}",
            config.min_minutes
        )));
    }

    info!(
        "Feature engineering kept {} of {} records, {} features",
        rows.len(),
        dataset.len(),
        columns.len()
    );
    debug!("Features: {}", columns.join(", "));

    Ok((
        FeatureMatrix::new(columns, discrete, rows)?,
        LabelVector::new(positions),
    ))
}
