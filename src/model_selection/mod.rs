//! Data splitting, cross-validation and hyperparameter search

pub mod cross_validation;
pub mod grid_search;
pub mod split;

pub use self::cross_validation::*;
pub use self::grid_search::*;
pub use self::split::*;
