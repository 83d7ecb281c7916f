//! Mathematical utilities: column statistics and error metrics.

pub mod stats;

pub use stats::*;
