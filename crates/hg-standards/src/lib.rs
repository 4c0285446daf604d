//! hg-standards: checks a solved network against the applicable design
//! standards and reports violations.
//!
//! Validation is pure: it never mutates the network or the hydraulic
//! state, and validating the same inputs twice yields identical results.
//! Resizing decisions belong to the design controller, which consumes the
//! violation list produced here.

pub mod validator;

pub use validator::{validate, ComplianceResult, Severity, Violation, ViolationKind};
