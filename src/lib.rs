//! Basketball position classification with a pure Rust support vector machine
//!
//! The pipeline loads per-game player statistics, engineers ratio features,
//! keeps the features with enough mutual information with the position,
//! tunes and fits a one-vs-one kernel SVM trained by SMO, and reports
//! accuracy, cross-validation scores and a confusion matrix.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod evaluation;
pub mod kernel;
pub mod model_selection;
pub mod optimizer;
pub mod persistence;
pub mod pipeline;
pub mod selection;
pub mod solver;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{ClassWeight, Gamma, ModelInfo, SVCParams, TrainedModel, SVC};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::error::{Result, SVMError};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::{Dataset, FeatureMatrix, LabelVector, Position};
pub use crate::evaluation::{accuracy_score, ConfusionMatrix};
pub use crate::kernel::{Kernel, KernelKind, KernelType, LinearKernel};
pub use crate::optimizer::{SVMOptimizer, TrainedSVM};
pub use crate::pipeline::{run, PipelineConfig, PipelineReport};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
