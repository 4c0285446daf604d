//! hg-design: the design orchestrator.
//!
//! Ties the pipeline together: build the network, size every pipe, solve
//! the hydraulics, validate against standards and, when hard violations
//! remain, step the offending diameters up through the catalog until the
//! design complies or the iteration budget runs out.

pub mod batch;
pub mod controller;
pub mod error;
pub mod report;
pub mod run;

pub use batch::{run_batch, BatchOutcome, Scenario};
pub use controller::{AutoResizeController, TerminalStatus};
pub use error::{DesignError, DesignResult};
pub use report::{DesignReport, NodeReport, PipeReport};
pub use run::{EdgeWarning, SizingRun};
