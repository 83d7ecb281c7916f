//! Input/output helpers.
//!
//! - raw team stats JSON (`raw`)
//! - processed dataset CSV (`dataset`)
//! - model bundle JSON (`bundle`)

pub mod bundle;
pub mod dataset;
pub mod raw;

pub use bundle::*;
pub use dataset::*;
pub use raw::*;
