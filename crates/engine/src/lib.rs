//! # Differential Engine
//!
//! Wires the two oracles, the margin calculator and the ranker into a single
//! `perform_differential_analysis` call.

pub mod error;
mod orchestrator;

pub use error::EngineError;
pub use orchestrator::DifferentialEngine;
