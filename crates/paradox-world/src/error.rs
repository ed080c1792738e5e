//! Error types for the `paradox-world` crate.
//!
//! Every variant describes a topology misconfiguration. The topology is
//! supplied by an external generator, so these errors are reported upward
//! and never retried.

use paradox_types::PlanetId;

/// Errors that can occur while assembling a [`Topology`].
///
/// [`Topology`]: crate::topology::Topology
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A planet referenced by a route or distance is not in the registry.
    #[error("planet not found: {0}")]
    PlanetNotFound(PlanetId),

    /// Planet ids must equal their registry position.
    #[error("planet id {found} registered at position {expected}")]
    NonSequentialPlanet {
        /// Registry position the planet was added at.
        expected: usize,
        /// Id the planet carried.
        found: PlanetId,
    },

    /// Planet sizes must be finite and strictly positive.
    #[error("planet {planet} has invalid size {size}")]
    InvalidPlanetSize {
        /// The offending planet.
        planet: PlanetId,
        /// The rejected size.
        size: f64,
    },

    /// A route cannot connect a planet to itself.
    #[error("route from planet {0} to itself")]
    SelfRoute(PlanetId),

    /// Only one route may exist per unordered planet pair.
    #[error("duplicate route between {a} and {b}")]
    DuplicateRoute {
        /// One endpoint.
        a: PlanetId,
        /// Other endpoint.
        b: PlanetId,
    },

    /// A wormhole window is malformed.
    #[error("invalid wormhole between {a} and {b}: {reason}")]
    InvalidWormhole {
        /// One endpoint.
        a: PlanetId,
        /// Other endpoint.
        b: PlanetId,
        /// What is wrong with the windows.
        reason: String,
    },

    /// An explicit transit distance is negative or not finite.
    #[error("invalid distance {distance} between {a} and {b}")]
    InvalidDistance {
        /// One endpoint.
        a: PlanetId,
        /// Other endpoint.
        b: PlanetId,
        /// The rejected distance.
        distance: f64,
    },

    /// The registry cannot address more planets than `PlanetId` holds.
    #[error("too many planets: {0}")]
    TooManyPlanets(usize),
}
