//! Pull Benchmark Library
//!
//! Measures how long Kubernetes nodes take to pull container images and
//! compares runs with each other. The pieces are:
//! - `generate`: builds synthetic images of random layers
//! - `measure`: drives probe DaemonSets and reads pull times from pod events
//! - `store`: persists results and suites as JSON
//! - `analyze`: renders comparison and timeline charts

pub mod analyze;
pub mod cli;
pub mod config;
pub mod error;
pub mod generate;
pub mod k8s;
pub mod measure;
pub mod models;
pub mod store;
