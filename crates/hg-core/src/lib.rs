//! hg-core: stable foundation for heatgrid.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (tolerances + float helpers)
//! - ids (stable compact IDs for network objects)
//! - error (shared error type)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{HgError, HgResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
