//! Feature selection by mutual information

pub mod mutual_info;
pub mod selector;

pub use self::mutual_info::*;
pub use self::selector::*;
