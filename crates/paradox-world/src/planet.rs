//! Planets: the fixed nodes of the conquest graph.
//!
//! A planet's size drives both its radius (which shortens transit
//! distances) and its growth rate while owned. Planets never change after
//! setup; population and ownership over time live in per-universe
//! snapshots.

use paradox_types::{PlanetId, PlayerId};
use serde::{Deserialize, Serialize};

/// Ratio between a planet's size and its radius.
pub const SIZE_PER_RADIUS: f64 = 2.5;

/// A point on the map plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two positions.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A node of the conquest graph as supplied at match setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Registry index.
    pub id: PlanetId,
    /// Size, strictly positive.
    pub size: f64,
    /// Center on the map plane.
    pub position: Position,
    /// Population at time 0.
    pub initial_pop: u32,
    /// Owner at time 0, before per-universe rotation.
    pub initial_owner: Option<PlayerId>,
}

impl Planet {
    /// Radius derived from size.
    pub fn radius(&self) -> f64 {
        self.size / SIZE_PER_RADIUS
    }

    /// Ships grown per time unit under the given owner.
    ///
    /// Neutral planets do not grow.
    pub fn growth_rate(&self, owner: Option<PlayerId>, growth_per_size: f64) -> f64 {
        if owner.is_some() {
            self.size * growth_per_size
        } else {
            0.0
        }
    }

    /// Surface-to-surface distance to another planet, never negative.
    pub fn surface_distance_to(&self, other: &Self) -> f64 {
        (self.position.distance_to(other.position) - self.radius() - other.radius()).max(0.0)
    }
}
