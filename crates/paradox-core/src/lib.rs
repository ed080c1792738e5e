//! History reconstruction and cross-universe relaxation for the Paradox
//! simulation.
//!
//! This crate owns the rules: how a universe's committed commands and
//! inbound wormhole arrivals replay into key states, and how all universes
//! are rebuilt together until the traffic between them is consistent.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `paradox-config.yaml` into
//!   strongly-typed structs.
//! - [`history`] -- Key-state storage and linear growth extrapolation.
//! - [`transit`] -- Command validation and flight launch, including
//!   wormhole departures.
//! - [`universe`] -- The per-universe discrete-event rebuild, readiness,
//!   and survivor queries.
//! - [`relaxation`] -- Round-based fixed-point iteration across universes.
//! - [`turnover`] -- Ownership changes and the durable [`FlagTable`].
//! - [`conservation`] -- Ship conservation audit over snapshots.
//! - [`game`] -- The [`Match`] facade: submissions, scoring, win condition.
//!
//! [`FlagTable`]: turnover::FlagTable
//! [`Match`]: game::Match

pub mod config;
pub mod conservation;
pub mod game;
pub mod history;
pub mod relaxation;
pub mod transit;
pub mod turnover;
pub mod universe;

pub use config::{ConfigError, MatchConfig};
pub use game::{Match, MatchError, Submission};
pub use relaxation::RelaxationError;
