//! SVM solver implementations
//!
//! This module implements Sequential Minimal Optimization (SMO) for the
//! C-SVC dual problem with per-sample box constraints.

pub mod smo;

pub use self::smo::*;
