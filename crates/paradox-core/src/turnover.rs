//! Ownership changes and the durable flag table.
//!
//! Turnovers are derived fresh from each universe's key states after every
//! relaxation. Flags are not: once a player has owned a planet in a
//! universe, the flag stays planted for the rest of the match even if a
//! later command rewrites that history.

use paradox_types::{FlagEvent, PlanetId, PlayerId, Turnover, UniverseId, WorldState};

/// Compare each key state's owners with the preceding key state's,
/// starting from `origin`, and list every change.
pub fn find_turnovers(origin: &WorldState, key_states: &[WorldState]) -> Vec<Turnover> {
    let mut turnovers = Vec::new();
    let mut last = origin;
    for state in key_states {
        for (index, (old, new)) in last
            .planet_owners
            .iter()
            .zip(state.planet_owners.iter())
            .enumerate()
        {
            if old == new {
                continue;
            }
            let Some(planet) = PlanetId::from_index(index) else {
                continue;
            };
            turnovers.push(Turnover {
                time: state.time,
                planet,
                old_owner: *old,
                new_owner: *new,
                new_pop: state.pop(planet).unwrap_or(0),
            });
        }
        last = state;
    }
    turnovers
}

/// Per-player, per-universe, per-planet flags with running counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagTable {
    universes: usize,
    planets: usize,
    flags: Vec<bool>,
    counts: Vec<u32>,
}

impl FlagTable {
    /// An empty table for the given dimensions.
    pub fn new(players: usize, universes: usize, planets: usize) -> Self {
        let cells = players
            .saturating_mul(universes)
            .saturating_mul(planets);
        Self {
            universes,
            planets,
            flags: vec![false; cells],
            counts: vec![0; players],
        }
    }

    fn slot(&self, player: PlayerId, universe: UniverseId, planet: PlanetId) -> Option<usize> {
        if universe.index() >= self.universes || planet.index() >= self.planets {
            return None;
        }
        player
            .index()
            .checked_mul(self.universes)?
            .checked_add(universe.index())?
            .checked_mul(self.planets)?
            .checked_add(planet.index())
    }

    /// Whether the flag is planted.
    pub fn has(&self, player: PlayerId, universe: UniverseId, planet: PlanetId) -> bool {
        self.slot(player, universe, planet)
            .and_then(|s| self.flags.get(s))
            .copied()
            .unwrap_or(false)
    }

    /// Plant a flag. Returns the event only the first time; unknown
    /// coordinates are ignored.
    pub fn mark(
        &mut self,
        player: PlayerId,
        universe: UniverseId,
        planet: PlanetId,
        time: f64,
    ) -> Option<FlagEvent> {
        let slot = self.slot(player, universe, planet)?;
        let flag = self.flags.get_mut(slot)?;
        if *flag {
            return None;
        }
        *flag = true;
        if let Some(count) = self.counts.get_mut(player.index()) {
            *count = count.saturating_add(1);
        }
        Some(FlagEvent {
            player,
            universe,
            planet,
            time,
        })
    }

    /// Plant a flag for every turnover's new owner in `universe`.
    pub fn mark_turnovers(&mut self, universe: UniverseId, turnovers: &[Turnover]) -> Vec<FlagEvent> {
        turnovers
            .iter()
            .filter_map(|t| {
                t.new_owner
                    .and_then(|player| self.mark(player, universe, t.planet, t.time))
            })
            .collect()
    }

    /// Flags planted by `player` across all universes.
    pub fn count(&self, player: PlayerId) -> u32 {
        self.counts.get(player.index()).copied().unwrap_or(0)
    }

    /// Flag counts indexed by player.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use paradox_types::ShipTally;

    fn make_state(time: f64, owners: Vec<Option<u32>>, pops: Vec<u32>) -> WorldState {
        WorldState {
            time,
            planet_pops: pops,
            planet_owners: owners.into_iter().map(|o| o.map(PlayerId::new)).collect(),
            flights: Vec::new(),
            tally: ShipTally::default(),
        }
    }

    #[test]
    fn turnovers_compare_consecutive_key_states() {
        let origin = make_state(0.0, vec![Some(0), None], vec![10, 0]);
        let states = vec![
            origin.clone(),
            make_state(10.0, vec![Some(0), Some(0)], vec![15, 5]),
            make_state(20.0, vec![Some(0), Some(1)], vec![25, 2]),
        ];
        let turnovers = find_turnovers(&origin, &states);
        assert_eq!(turnovers.len(), 2);
        let first = turnovers.first().unwrap();
        assert_eq!(first.planet, PlanetId::new(1));
        assert_eq!(first.old_owner, None);
        assert_eq!(first.new_owner, Some(PlayerId::new(0)));
        assert_eq!(first.new_pop, 5);
        let second = turnovers.get(1).unwrap();
        assert_eq!(second.old_owner, Some(PlayerId::new(0)));
        assert!((second.time - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_changes_no_turnovers() {
        let origin = make_state(0.0, vec![Some(0), None], vec![10, 0]);
        let states = vec![origin.clone(), make_state(5.0, vec![Some(0), None], vec![15, 0])];
        assert!(find_turnovers(&origin, &states).is_empty());
    }

    #[test]
    fn flags_set_once() {
        let mut table = FlagTable::new(2, 2, 3);
        let p = PlayerId::new(1);
        let u = UniverseId::new(1);
        let k = PlanetId::new(2);
        assert!(table.mark(p, u, k, 4.0).is_some());
        assert!(table.mark(p, u, k, 9.0).is_none());
        assert!(table.has(p, u, k));
        assert!(!table.has(PlayerId::new(0), u, k));
        assert_eq!(table.count(p), 1);
    }

    #[test]
    fn flags_are_per_universe() {
        let mut table = FlagTable::new(2, 2, 3);
        let p = PlayerId::new(0);
        let k = PlanetId::new(0);
        table.mark(p, UniverseId::new(0), k, 0.0);
        table.mark(p, UniverseId::new(1), k, 0.0);
        assert_eq!(table.count(p), 2);
    }

    #[test]
    fn out_of_range_marks_ignored() {
        let mut table = FlagTable::new(1, 1, 1);
        assert!(table.mark(PlayerId::new(3), UniverseId::new(0), PlanetId::new(0), 0.0).is_none());
        assert!(table.mark(PlayerId::new(0), UniverseId::new(2), PlanetId::new(0), 0.0).is_none());
        assert_eq!(table.counts(), &[0]);
    }

    #[test]
    fn turnovers_to_neutral_plant_nothing() {
        let mut table = FlagTable::new(2, 1, 2);
        let turnovers = vec![
            Turnover {
                time: 3.0,
                planet: PlanetId::new(0),
                old_owner: Some(PlayerId::new(0)),
                new_owner: None,
                new_pop: 0,
            },
            Turnover {
                time: 5.0,
                planet: PlanetId::new(1),
                old_owner: None,
                new_owner: Some(PlayerId::new(1)),
                new_pop: 2,
            },
        ];
        let events = table.mark_turnovers(UniverseId::new(0), &turnovers);
        assert_eq!(events.len(), 1);
        assert_eq!(events.first().unwrap().player, PlayerId::new(1));
    }
}
