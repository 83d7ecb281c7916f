//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the flat player feature row (`FeatureRecord`) and the `Dataset` built from it
//! - the numeric `FeatureTable` handed to the ML processor
//! - metrics, importances, and per-command configuration

pub mod types;

pub use types::*;
