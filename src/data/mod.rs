//! Data loading and feature engineering
//!
//! This module turns the raw player-season CSV into the numeric matrix and
//! label vector the classifier is trained on.

pub mod csv;
pub mod features;
pub mod position;

pub use self::csv::*;
pub use self::features::*;
pub use self::position::*;
