//! Shared type definitions for the Paradox simulation.
//!
//! This crate is the single source of truth for the values that cross
//! crate boundaries: identifiers, flights, world-state snapshots, commands,
//! turnovers, and match notifications. Types are exported to `TypeScript`
//! via `ts-rs` for the renderer.
//!
//! # Modules
//!
//! - [`ids`] -- Index newtypes for planets, players, universes, commands
//! - [`enums`] -- [`FlightKind`]
//! - [`structs`] -- Flights, snapshots, commands, turnovers, flags
//! - [`events`] -- [`MatchEvent`] notifications

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::FlightKind;
pub use events::MatchEvent;
pub use ids::{CommandId, PlanetId, PlayerId, UniverseId};
pub use structs::{
    CommandRef, CommandRequest, FlagEvent, Flight, PlayerCommand, ShipTally, Turnover, WorldState,
};
