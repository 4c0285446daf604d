//! Flow-to-category classification.

use hg_config::{DesignConfig, PipeCategory};
use hg_core::units::MassRate;

/// Map an aggregated flow to its pipe category via the configured
/// thresholds. Deterministic, no side effects.
pub fn classify_flow(flow: MassRate, config: &DesignConfig) -> PipeCategory {
    let f = flow.value;
    if f >= config.main_flow_threshold_kg_s {
        PipeCategory::Main
    } else if f >= config.distribution_flow_threshold_kg_s {
        PipeCategory::Distribution
    } else {
        PipeCategory::Service
    }
}
