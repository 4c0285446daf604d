//! hg-sizing: flow classification and diameter selection.
//!
//! Maps an edge's aggregated flow to a pipe category, computes the minimum
//! hydraulically admissible diameter, snaps it to the standard catalog and
//! evaluates/prices the resulting pipe.

pub mod classify;
pub mod engine;
pub mod error;

pub use classify::classify_flow;
pub use engine::{
    price, required_diameter, select_standard_diameter, PipeEvaluation, PipeSizingEngine,
    SizedPipe, SizingWarning,
};
pub use error::{SizingError, SizingResult};
