//! Error types for network construction.

use hg_core::{BuildingId, StreetNodeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Invalid demand for building {building}: {value} kW (must be positive)")]
    InvalidDemand { building: BuildingId, value: f64 },

    #[error("Invalid temperature spread: supply {supply_c} °C must exceed return {return_c} °C")]
    InvalidSpread { supply_c: f64, return_c: f64 },

    #[error("Street topology is not a tree: {what}")]
    CyclicTopology { what: String },

    #[error("Building {building} cannot reach the plant through the street graph")]
    DisconnectedBuilding { building: BuildingId },

    #[error(
        "Building {building} is {distance_m:.1} m from the nearest street, \
         exceeding the {max_m:.1} m service limit"
    )]
    ServiceTooFar {
        building: BuildingId,
        distance_m: f64,
        max_m: f64,
    },

    #[error("Unknown street node {node}")]
    UnknownNode { node: StreetNodeId },

    #[error("Building {building} has no service connection")]
    MissingServiceConnection { building: BuildingId },

    #[error("Hydraulic calculation failed: {0}")]
    Hydraulics(#[from] hg_hydraulics::HydraulicsError),
}

pub type NetResult<T> = Result<T, NetError>;
