//! # Extraction engine
//!
//! Turns URLs or known records into index-aligned batch results under
//! bounded parallelism.
//! - `batch_runner`: fetch and parse phases, jitter, per-batch pools
//! - `orchestrator`: `lookup` and `update` on top of the runner

pub mod batch_runner;
pub mod orchestrator;

pub use batch_runner::{BatchRunner, Jitter};
pub use orchestrator::ExtractionOrchestrator;
