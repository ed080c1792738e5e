//! Planet registry, routes, and wormholes for the Paradox simulation.
//!
//! This crate models the fixed part of a match: planets as nodes with a
//! size and position, routes as undirected edges between them, and the
//! wormholes some routes carry. Everything here is immutable once a match
//! starts and shared by every universe.
//!
//! # Modules
//!
//! - [`error`] -- Error types for topology assembly.
//! - [`planet`] -- Planet records, radius and growth derived from size.
//! - [`route`] -- Plain and wormhole routes, window arithmetic, universe
//!   pairing for crossing wormholes.
//! - [`topology`] -- The validated graph with precomputed transit distances.
//! - [`starting_world`] -- Default eight-planet demo map.

pub mod error;
pub mod planet;
pub mod route;
pub mod starting_world;
pub mod topology;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use planet::{Planet, Position, SIZE_PER_RADIUS};
pub use route::{Route, Wormhole, WormholeExit, WormholeMouth};
pub use starting_world::{StartingPlanetIds, create_starting_world};
pub use topology::{Topology, TopologyBuilder};
