//! Player positions and their fixed integer encoding

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five positions, encoded PG=1 through C=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    PG,
    SG,
    SF,
    PF,
    C,
}

impl Position {
    /// All positions in encoding order
    pub const ALL: [Position; 5] = [
        Position::PG,
        Position::SG,
        Position::SF,
        Position::PF,
        Position::C,
    ];

    pub fn code(&self) -> u8 {
        match self {
            Position::PG => 1,
            Position::SG => 2,
            Position::SF => 3,
            Position::PF => 4,
            Position::C => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Position::PG => "PG",
            Position::SG => "SG",
            Position::SF => "SF",
            Position::PF => "PF",
            Position::C => "C",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Position {
    type Err = SVMError;

    /// Exact, case-sensitive match; hybrid positions such as `SG-PG` are rejected
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PG" => Ok(Position::PG),
            "SG" => Ok(Position::SG),
            "SF" => Ok(Position::SF),
            "PF" => Ok(Position::PF),
            "C" => Ok(Position::C),
            other => Err(SVMError::UnknownPosition(other.to_string())),
        }
    }
}
