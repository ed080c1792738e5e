//! Ship conservation audit for universe snapshots.
//!
//! Ships enter a universe through growth and wormhole arrivals and leave
//! through attack losses and wormhole departures. For every snapshot:
//!
//! ```text
//! planets + in_flight == initial + grown + arrived - departed - destroyed
//! ```
//!
//! The simulator maintains the right-hand side in each snapshot's
//! [`ShipTally`]; a mismatch means the rebuild dropped or duplicated ships.
//!
//! [`ShipTally`]: paradox_types::ShipTally

use paradox_types::WorldState;

/// A snapshot whose ship totals do not balance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConservationViolation {
    /// Time of the offending snapshot.
    pub time: f64,
    /// Ships the tally says should exist.
    pub expected: i128,
    /// Ships actually on planets and in flight.
    pub actual: i128,
}

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq)]
pub enum ConservationResult {
    /// Every checked snapshot balances.
    Balanced,
    /// The first snapshot that does not balance.
    Violation(ConservationViolation),
}

impl ConservationResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Check a single snapshot.
pub fn audit_state(state: &WorldState) -> ConservationResult {
    let tally = state.tally;
    let expected = i128::from(tally.initial)
        .saturating_add(i128::from(tally.grown))
        .saturating_add(i128::from(tally.arrived))
        .saturating_sub(i128::from(tally.departed))
        .saturating_sub(i128::from(tally.destroyed));
    let actual = i128::from(state.planet_ships()).saturating_add(i128::from(state.in_flight_ships()));
    if expected == actual {
        ConservationResult::Balanced
    } else {
        ConservationResult::Violation(ConservationViolation {
            time: state.time,
            expected,
            actual,
        })
    }
}

/// Check every snapshot in order, stopping at the first violation.
pub fn audit_history(states: &[WorldState]) -> ConservationResult {
    states
        .iter()
        .map(audit_state)
        .find(|r| !r.is_balanced())
        .unwrap_or(ConservationResult::Balanced)
}
