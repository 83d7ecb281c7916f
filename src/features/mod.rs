//! Feature engineering.
//!
//! - raw player JSON → `FeatureRecord` (`extract`)
//! - team map → de-duplicated `Dataset` (`assemble`)
//! - dataset → model input table (`select`)

pub mod assemble;
pub mod extract;
pub mod select;

pub use assemble::*;
pub use extract::*;
pub use select::*;
