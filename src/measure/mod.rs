//! Image pull measurement
//!
//! Drives the cleanup and probe DaemonSets through a `ClusterApi` and turns
//! the `Pulling`/`Pulled` events of every probe pod into measurements.

pub mod events;
pub mod nodes;
mod runner;
pub mod suite;

pub use runner::{MeasureOptions, Measurer};
pub use suite::{run_suite, SuiteOptions};
