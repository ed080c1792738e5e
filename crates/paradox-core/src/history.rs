//! Key-state storage and state extrapolation for one universe.
//!
//! A [`History`] is the ordered list of snapshots saved while rebuilding a
//! universe. Any instant between two key states is answered by copying the
//! earlier one and growing each owned planet linearly from there.

use paradox_types::{PlanetId, WorldState};
use paradox_world::Topology;

/// Key states of one universe, ordered by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    states: Vec<WorldState>,
}

impl History {
    /// An empty history.
    pub const fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Drop every key state and start over from `origin`.
    pub fn reset(&mut self, origin: WorldState) {
        self.states.clear();
        self.states.push(origin);
    }

    /// All key states in time order.
    pub fn key_states(&self) -> &[WorldState] {
        &self.states
    }

    /// Number of key states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no key state has been saved.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Position of the latest key state at or before `time`.
    fn most_recent_index(&self, time: f64) -> Option<usize> {
        let after = self.states.partition_point(|s| s.time <= time);
        after.checked_sub(1)
    }

    /// The latest key state at or before `time`.
    pub fn most_recent(&self, time: f64) -> Option<&WorldState> {
        self.most_recent_index(time)
            .and_then(|i| self.states.get(i))
    }

    /// Save a key state.
    ///
    /// A state at the same instant as the most recent one replaces it;
    /// otherwise it is inserted right after the most recent state.
    pub fn save(&mut self, state: WorldState) {
        match self.most_recent_index(state.time) {
            None => self.states.insert(0, state),
            Some(i) => {
                if let Some(slot) = self.states.get_mut(i) {
                    if slot.time.total_cmp(&state.time).is_eq() {
                        *slot = state;
                        return;
                    }
                }
                let at = i.saturating_add(1).min(self.states.len());
                self.states.insert(at, state);
            }
        }
    }

    /// World state at `time`, extrapolated from the latest key state.
    ///
    /// Returns `None` only when the history is empty or `time` precedes
    /// every key state.
    pub fn state_at(&self, time: f64, topology: &Topology, growth_per_size: f64) -> Option<WorldState> {
        self.most_recent(time)
            .map(|base| extrapolate(base, time, topology, growth_per_size))
    }
}

/// Copy `base` forward to `time`, growing each planet by
/// `floor(rate * elapsed)`. Flights are carried unchanged.
pub fn extrapolate(base: &WorldState, time: f64, topology: &Topology, growth_per_size: f64) -> WorldState {
    let mut state = base.clone();
    state.time = time;
    let elapsed = time - base.time;
    if elapsed <= 0.0 {
        return state;
    }

    let mut grown_total: u64 = 0;
    for (index, (pop, owner)) in state
        .planet_pops
        .iter_mut()
        .zip(state.planet_owners.iter())
        .enumerate()
    {
        let Some(planet) = PlanetId::from_index(index) else {
            continue;
        };
        let rate = topology.growth_rate(planet, *owner, growth_per_size);
        let growth = whole_ships(rate * elapsed);
        *pop = pop.saturating_add(growth);
        grown_total = grown_total.saturating_add(u64::from(growth));
    }
    state.tally.grown = state.tally.grown.saturating_add(grown_total);
    state
}

/// Floor a non-negative ship amount into a count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_ships(amount: f64) -> u32 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    // Saturating float-to-int conversion after flooring.
    amount.floor().min(f64::from(u32::MAX)) as u32
}
