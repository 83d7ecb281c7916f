//! `nhl-ml` library crate.
//!
//! The binary (`nhl`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or hitting the network
//! - each stage (fetch, process, train, predict) is reusable on its own

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod logging;
pub mod math;
pub mod ml;
pub mod plot;
pub mod report;
