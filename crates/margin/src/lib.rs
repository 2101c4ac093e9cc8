//! # Differential Margin Calculator
//!
//! Turns a market snapshot, a (possibly partial) signal set and a rate set into
//! per-asset profit margins.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** A pure logic crate. No I/O, no async, no knowledge of where
//!   signals or rates come from. It depends only on `core-types`.
//! - **Stateless Calculation:** `MarginCalculator` holds no state. The same inputs
//!   always produce the same `MarginBatch`, byte for byte.
//! - **Local Failures:** A problem with one asset becomes an entry in
//!   `MarginBatch::errors`; it never prevents the other assets from being computed.

pub mod batch;
pub mod calculator;

pub use batch::MarginBatch;
pub use calculator::{MarginCalculator, MarginFigures};
