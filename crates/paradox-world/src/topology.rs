//! The immutable conquest graph: planet registry plus route table.
//!
//! A [`Topology`] is assembled once per match through a
//! [`TopologyBuilder`], validated, and then shared read-only by every
//! universe. Transit distances are precomputed for every planet pair from
//! planet positions and radii; a supplier may override individual pairs.

use std::collections::BTreeMap;

use paradox_types::{PlanetId, PlayerId};
use tracing::debug;

use crate::error::WorldError;
use crate::planet::{Planet, Position};
use crate::route::{Route, Wormhole};

/// Normalize an unordered planet pair into a map key.
const fn pair_key(a: PlanetId, b: PlanetId) -> (PlanetId, PlanetId) {
    if a.0 <= b.0 { (a, b) } else { (b, a) }
}

/// Planets, routes, and pairwise transit distances.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Planets indexed by id.
    planets: Vec<Planet>,
    /// Row-major `n * n` surface distances.
    distances: Vec<f64>,
    /// Routes keyed by normalized planet pair.
    routes: BTreeMap<(PlanetId, PlanetId), Route>,
}

impl Topology {
    /// Number of planets.
    pub fn planet_count(&self) -> usize {
        self.planets.len()
    }

    /// All planets in id order.
    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    /// Look up a planet.
    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(id.index())
    }

    /// Whether `id` names a planet in the registry.
    pub fn contains(&self, id: PlanetId) -> bool {
        id.index() < self.planets.len()
    }

    /// Route between two planets, in either direction.
    pub fn route(&self, a: PlanetId, b: PlanetId) -> Option<&Route> {
        self.routes.get(&pair_key(a, b))
    }

    /// Iterate over all routes with their normalized endpoints.
    pub fn routes(&self) -> impl Iterator<Item = (&(PlanetId, PlanetId), &Route)> {
        self.routes.iter()
    }

    /// Number of routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Transit distance between two planets.
    pub fn distance(&self, a: PlanetId, b: PlanetId) -> Option<f64> {
        let n = self.planets.len();
        if a.index() >= n || b.index() >= n {
            return None;
        }
        let slot = a.index().checked_mul(n)?.checked_add(b.index())?;
        self.distances.get(slot).copied()
    }

    /// Growth rate of a planet under the given owner.
    pub fn growth_rate(&self, planet: PlanetId, owner: Option<PlayerId>, growth_per_size: f64) -> f64 {
        self.planet(planet)
            .map_or(0.0, |p| p.growth_rate(owner, growth_per_size))
    }
}

/// Incremental constructor for a [`Topology`].
///
/// Validation is deferred to [`TopologyBuilder::build`] so the first
/// misconfiguration is reported with full context.
#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    planets: Vec<Planet>,
    routes: Vec<(PlanetId, PlanetId, Route)>,
    distance_overrides: Vec<(PlanetId, PlanetId, f64)>,
}

impl TopologyBuilder {
    /// Start an empty topology.
    pub const fn new() -> Self {
        Self {
            planets: Vec::new(),
            routes: Vec::new(),
            distance_overrides: Vec::new(),
        }
    }

    /// Register a planet with the next free id and return that id.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TooManyPlanets`] if the id space is exhausted.
    pub fn add_planet(
        &mut self,
        size: f64,
        position: Position,
        initial_pop: u32,
        initial_owner: Option<PlayerId>,
    ) -> Result<PlanetId, WorldError> {
        let id = PlanetId::from_index(self.planets.len())
            .ok_or(WorldError::TooManyPlanets(self.planets.len()))?;
        self.planets.push(Planet {
            id,
            size,
            position,
            initial_pop,
            initial_owner,
        });
        Ok(id)
    }

    /// Register a fully specified planet. Its id must match its position.
    pub fn planet(mut self, planet: Planet) -> Self {
        self.planets.push(planet);
        self
    }

    /// Connect two planets with a plain route.
    pub fn plain_route(mut self, a: PlanetId, b: PlanetId) -> Self {
        self.routes.push((a, b, Route::Plain));
        self
    }

    /// Connect two planets with a wormhole route.
    pub fn wormhole_route(mut self, a: PlanetId, b: PlanetId, wormhole: Wormhole) -> Self {
        self.routes.push((a, b, Route::Wormhole(wormhole)));
        self
    }

    /// Connect two planets with the given route (mutable form).
    pub fn connect(&mut self, a: PlanetId, b: PlanetId, route: Route) {
        self.routes.push((a, b, route));
    }

    /// Override the transit distance between two planets.
    pub fn distance(mut self, a: PlanetId, b: PlanetId, distance: f64) -> Self {
        self.distance_overrides.push((a, b, distance));
        self
    }

    /// Validate and assemble the topology.
    ///
    /// # Errors
    ///
    /// Returns the first [`WorldError`] found: out-of-order planet ids,
    /// non-positive sizes, routes or distances naming unknown planets,
    /// self-routes, duplicate routes, or malformed wormholes.
    pub fn build(self) -> Result<Topology, WorldError> {
        for (expected, planet) in self.planets.iter().enumerate() {
            if planet.id.index() != expected {
                return Err(WorldError::NonSequentialPlanet {
                    expected,
                    found: planet.id,
                });
            }
            if !planet.size.is_finite() || planet.size <= 0.0 {
                return Err(WorldError::InvalidPlanetSize {
                    planet: planet.id,
                    size: planet.size,
                });
            }
        }

        let n = self.planets.len();
        let known = |id: PlanetId| -> Result<(), WorldError> {
            if id.index() < n {
                Ok(())
            } else {
                Err(WorldError::PlanetNotFound(id))
            }
        };

        let mut routes = BTreeMap::new();
        for (a, b, route) in self.routes {
            known(a)?;
            known(b)?;
            if a == b {
                return Err(WorldError::SelfRoute(a));
            }
            if let Route::Wormhole(w) = &route {
                validate_wormhole(a, b, w)?;
            }
            if routes.insert(pair_key(a, b), route).is_some() {
                return Err(WorldError::DuplicateRoute { a, b });
            }
        }

        let cells = n.checked_mul(n).ok_or(WorldError::TooManyPlanets(n))?;
        let mut distances = Vec::with_capacity(cells);
        for from in &self.planets {
            for to in &self.planets {
                if from.id == to.id {
                    distances.push(0.0);
                } else {
                    distances.push(from.surface_distance_to(to));
                }
            }
        }
        for (a, b, distance) in self.distance_overrides {
            known(a)?;
            known(b)?;
            if !distance.is_finite() || distance < 0.0 {
                return Err(WorldError::InvalidDistance { a, b, distance });
            }
            for (row, col) in [(a.index(), b.index()), (b.index(), a.index())] {
                let slot = row.checked_mul(n).and_then(|r| r.checked_add(col));
                if let Some(cell) = slot.and_then(|s| distances.get_mut(s)) {
                    *cell = distance;
                }
            }
        }

        debug!(planets = n, routes = routes.len(), "Topology assembled");

        Ok(Topology {
            planets: self.planets,
            distances,
            routes,
        })
    }
}

fn validate_wormhole(a: PlanetId, b: PlanetId, w: &Wormhole) -> Result<(), WorldError> {
    let reason = if !w.head_time.is_finite() || !w.tail_time.is_finite() {
        Some("window times must be finite")
    } else if w.head_time < 0.0 || w.tail_time < 0.0 {
        Some("window times must be non-negative")
    } else if w.head_time.total_cmp(&w.tail_time).is_eq() {
        Some("head and tail windows coincide")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(WorldError::InvalidWormhole {
            a,
            b,
            reason: reason.to_owned(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_line_world() -> (TopologyBuilder, PlanetId, PlanetId, PlanetId) {
        let mut builder = TopologyBuilder::new();
        let a = builder
            .add_planet(2.5, Position::new(0.0, 0.0), 10, Some(PlayerId::new(0)))
            .unwrap();
        let b = builder
            .add_planet(2.5, Position::new(10.0, 0.0), 3, None)
            .unwrap();
        let c = builder
            .add_planet(2.5, Position::new(20.0, 0.0), 3, Some(PlayerId::new(1)))
            .unwrap();
        (builder, a, b, c)
    }

    #[test]
    fn routes_are_unordered() {
        let (builder, a, b, c) = make_line_world();
        let topology = builder.plain_route(a, b).build().unwrap();
        assert_eq!(topology.route(b, a), Some(&Route::Plain));
        assert_eq!(topology.route(a, c), None);
        assert_eq!(topology.route_count(), 1);
    }

    #[test]
    fn distances_are_surface_to_surface() {
        let (builder, a, b, c) = make_line_world();
        let topology = builder.build().unwrap();
        // centers 10 apart, radii 1.0 each
        assert_eq!(topology.distance(a, b), Some(8.0));
        assert_eq!(topology.distance(c, a), Some(18.0));
        assert_eq!(topology.distance(a, a), Some(0.0));
        assert_eq!(topology.distance(a, PlanetId::new(7)), None);
    }

    #[test]
    fn distance_override_applies_both_ways() {
        let (builder, a, b, _) = make_line_world();
        let topology = builder.distance(a, b, 3.0).build().unwrap();
        assert_eq!(topology.distance(a, b), Some(3.0));
        assert_eq!(topology.distance(b, a), Some(3.0));
    }

    #[test]
    fn negative_distance_rejected() {
        let (builder, a, b, _) = make_line_world();
        let result = builder.distance(a, b, -1.0).build();
        assert!(matches!(result, Err(WorldError::InvalidDistance { .. })));
    }

    #[test]
    fn duplicate_route_rejected() {
        let (builder, a, b, _) = make_line_world();
        let result = builder.plain_route(a, b).plain_route(b, a).build();
        assert!(matches!(result, Err(WorldError::DuplicateRoute { .. })));
    }

    #[test]
    fn self_route_rejected() {
        let (builder, a, _, _) = make_line_world();
        let result = builder.plain_route(a, a).build();
        assert!(matches!(result, Err(WorldError::SelfRoute(_))));
    }

    #[test]
    fn unknown_endpoint_rejected() {
        let (builder, a, _, _) = make_line_world();
        let result = builder.plain_route(a, PlanetId::new(9)).build();
        assert!(matches!(result, Err(WorldError::PlanetNotFound(_))));
    }

    #[test]
    fn non_positive_size_rejected() {
        let result = TopologyBuilder::new()
            .planet(Planet {
                id: PlanetId::new(0),
                size: 0.0,
                position: Position::default(),
                initial_pop: 0,
                initial_owner: None,
            })
            .build();
        assert!(matches!(result, Err(WorldError::InvalidPlanetSize { .. })));
    }

    #[test]
    fn out_of_order_planet_rejected() {
        let result = TopologyBuilder::new()
            .planet(Planet {
                id: PlanetId::new(4),
                size: 1.0,
                position: Position::default(),
                initial_pop: 0,
                initial_owner: None,
            })
            .build();
        assert!(matches!(result, Err(WorldError::NonSequentialPlanet { .. })));
    }

    #[test]
    fn coinciding_wormhole_windows_rejected() {
        let (builder, a, b, _) = make_line_world();
        let result = builder
            .wormhole_route(
                a,
                b,
                Wormhole {
                    head_time: 20.0,
                    tail_time: 20.0,
                    crosses_universe: false,
                },
            )
            .build();
        assert!(matches!(result, Err(WorldError::InvalidWormhole { .. })));
    }
}
