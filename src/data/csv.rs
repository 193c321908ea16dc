//! Player-season CSV loader
//!
//! Supports loading per-game statistics tables where:
//! - The first row is a header
//! - `Player`, `Tm` and `Pos` are text columns
//! - Every other column is a numeric statistic

use crate::core::{Result, SVMError};
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every input file must provide
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "Player", "Age", "Tm", "MP", "PTS", "AST", "TRB", "STL", "BLK", "Pos",
];

/// Columns kept as text instead of parsed as numbers
pub const TEXT_COLUMNS: [&str; 3] = ["Player", "Tm", "Pos"];

/// One player-season row
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub player: String,
    pub team: String,
    pub position: String,
    /// Numeric statistics, aligned with [`Dataset::numeric_columns`]
    pub stats: Vec<f64>,
}

/// Immutable table of player-season records
#[derive(Debug, Clone)]
pub struct Dataset {
    numeric_columns: Vec<String>,
    integral: Vec<bool>,
    records: Vec<Record>,
}

impl Dataset {
    /// Load a dataset from a CSV file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let dataset = Self::from_reader(file)?;
        debug!(
            "Loaded {} records with {} numeric columns from {}",
            dataset.len(),
            dataset.numeric_columns.len(),
            path.as_ref().display()
        );
        Ok(dataset)
    }

    /// Load a dataset from any reader producing CSV with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SVMError::MissingColumn(name.to_string()))
        };
        for name in REQUIRED_COLUMNS {
            find(name)?;
        }
        let player_idx = find("Player")?;
        let team_idx = find("Tm")?;
        let pos_idx = find("Pos")?;

        let numeric: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !TEXT_COLUMNS.contains(h))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut integral = vec![true; numeric.len()];
        let mut records = Vec::new();

        for row in reader.records() {
            let row = row?;
            let line = row.position().map_or(0, |p| p.line());
            let field = |idx: usize| row.get(idx).unwrap_or("");

            let mut stats = Vec::with_capacity(numeric.len());
            for (slot, (idx, name)) in numeric.iter().enumerate() {
                let raw = field(*idx);
                let value = if raw.is_empty() {
                    integral[slot] = false;
                    0.0
                } else if let Ok(v) = raw.parse::<i64>() {
                    v as f64
                } else {
                    integral[slot] = false;
                    raw.parse::<f64>().map_err(|_| {
                        SVMError::ParseError(format!(
                            "line {line}: column {name} has non-numeric value '{raw}'"
                        ))
                    })?
                };
                stats.push(value);
            }

            records.push(Record {
                player: field(player_idx).to_string(),
                team: field(team_idx).to_string(),
                position: field(pos_idx).to_string(),
                stats,
            });
        }

        if records.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(Self {
            numeric_columns: numeric.into_iter().map(|(_, name)| name).collect(),
            integral,
            records,
        })
    }

    /// Names of the numeric columns, in file order
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    /// Index of a numeric column within [`Record::stats`]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.numeric_columns.iter().position(|c| c == name)
    }

    /// Whether every cell of the column is an integer literal
    pub fn is_integral(&self, column: usize) -> bool {
        self.integral.get(column).copied().unwrap_or(false)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
