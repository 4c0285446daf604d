//! hg-net: street topology, demand-to-flow aggregation and network assembly.
//!
//! The crate owns the immutable input structures (street graph, buildings,
//! service connections), the flow aggregator that turns building demand
//! into per-edge mass flows, and the builder that assembles the dual-pipe
//! (supply/return) network the solver operates on.

pub mod aggregate;
pub mod builder;
pub mod error;
pub mod network;
pub mod street;

pub use aggregate::{aggregate_edge_flows, derive_building_flow, TreeEdge};
pub use builder::NetworkGraphBuilder;
pub use error::{NetError, NetResult};
pub use network::{Network, NetworkEdge, NetworkNode, NodeKind, PipeMaterial, PipeRole};
pub use street::{Building, Point, ServiceConnection, StreetGraph};
