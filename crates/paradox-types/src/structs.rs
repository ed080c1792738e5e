//! Core value types: flights, world-state snapshots, commands, turnovers.
//!
//! These are the types that flow out of the simulation core to renderers
//! and scoring UIs. All of them are plain data; the rules that produce and
//! mutate them live in `paradox-core`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::FlightKind;
use crate::ids::{CommandId, PlanetId, PlayerId, UniverseId};

// ---------------------------------------------------------------------------
// Flights
// ---------------------------------------------------------------------------

/// The command that launched a flight: its universe and per-universe id.
///
/// Each command launches exactly one flight in its own universe, plus at
/// most one wormhole arrival elsewhere, so `(origin, kind)` identifies a
/// flight within a universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CommandRef {
    /// Universe the command was issued in.
    pub universe: UniverseId,
    /// Command id within that universe.
    pub command: CommandId,
}

/// Ships in transit between two planets over a time interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Flight {
    /// Player the ships belong to.
    pub owner: PlayerId,
    /// Ship count. Zero marks a ghost flight recording a rejected command.
    pub ships: u32,
    /// Planet the flight left from.
    pub start_planet: PlanetId,
    /// Planet the flight resolves against.
    pub end_planet: PlanetId,
    /// Launch time (or wormhole exit time for arrivals).
    pub start_time: f64,
    /// Arrival time.
    pub end_time: f64,
    /// Relation to the wormhole network.
    pub kind: FlightKind,
    /// Universe this flight travels in.
    pub universe: UniverseId,
    /// Command that produced this flight.
    pub origin: CommandRef,
}

impl Flight {
    /// Whether this flight records a rejected command.
    pub const fn is_ghost(&self) -> bool {
        self.ships == 0
    }

    /// Transit duration.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Fraction of the journey completed at `time`.
    ///
    /// Zero-length flights report `1.0` once launched.
    pub fn progress(&self, time: f64) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 1.0;
        }
        (time - self.start_time) / duration
    }
}

// ---------------------------------------------------------------------------
// World state
// ---------------------------------------------------------------------------

/// Cumulative ship accounting carried by every snapshot.
///
/// Growth and wormhole arrivals are the only sources of ships; attacks and
/// wormhole departures are the only sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShipTally {
    /// Sum of planet populations in the universe's time-0 snapshot.
    pub initial: u64,
    /// Ships grown on owned planets since time 0.
    pub grown: u64,
    /// Ships injected by wormhole arrivals.
    pub arrived: u64,
    /// Ships that left through a wormhole.
    pub departed: u64,
    /// Ships and defenders destroyed in attacks.
    pub destroyed: u64,
}

/// Population, ownership, and flights of one universe at one instant.
///
/// Snapshots are immutable once saved as key states; queries hand out
/// copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldState {
    /// Instant this snapshot describes.
    pub time: f64,
    /// Population per planet, indexed by [`PlanetId`].
    pub planet_pops: Vec<u32>,
    /// Owner per planet, `None` for neutral.
    pub planet_owners: Vec<Option<PlayerId>>,
    /// Flights in transit.
    pub flights: Vec<Flight>,
    /// Ship accounting up to `time`.
    pub tally: ShipTally,
}

impl WorldState {
    /// Number of planets described.
    pub fn planet_count(&self) -> usize {
        self.planet_pops.len()
    }

    /// Population of a planet, if it exists.
    pub fn pop(&self, planet: PlanetId) -> Option<u32> {
        self.planet_pops.get(planet.index()).copied()
    }

    /// Owner of a planet. `None` for neutral or unknown planets.
    pub fn owner(&self, planet: PlanetId) -> Option<PlayerId> {
        self.planet_owners.get(planet.index()).copied().flatten()
    }

    /// Total population across all planets.
    pub fn planet_ships(&self) -> u64 {
        self.planet_pops.iter().map(|&p| u64::from(p)).sum()
    }

    /// Total ships aboard flights.
    pub fn in_flight_ships(&self) -> u64 {
        self.flights.iter().map(|f| u64::from(f.ships)).sum()
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A player's request to send ships, before admission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CommandRequest {
    /// Time at which the ships launch.
    pub time: f64,
    /// Issuing player.
    pub player: PlayerId,
    /// Planet the ships leave from.
    pub source_planet: PlanetId,
    /// Planet the ships are sent to.
    pub target_planet: PlanetId,
}

/// A committed command in a universe's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerCommand {
    /// Per-universe id, monotonically increasing in admission order.
    pub id: CommandId,
    /// Launch time.
    pub time: f64,
    /// Issuing player.
    pub player: PlayerId,
    /// Planet the ships leave from.
    pub source_planet: PlanetId,
    /// Planet the ships are sent to.
    pub target_planet: PlanetId,
    /// Whether the command could be carried out in the latest history.
    pub valid: bool,
    /// Time of the first conquest of a player-held planet this command
    /// caused. Latched once, never reset.
    pub score_time: Option<f64>,
}

impl PlayerCommand {
    /// Admit a request under the given id. Validity is decided on rebuild.
    pub const fn admit(id: CommandId, request: CommandRequest) -> Self {
        Self {
            id,
            time: request.time,
            player: request.player,
            source_planet: request.source_planet,
            target_planet: request.target_planet,
            valid: false,
            score_time: None,
        }
    }

    /// Whether this command has earned its conquest point.
    pub const fn scored(&self) -> bool {
        self.score_time.is_some()
    }

    /// Latch the conquest point. Returns `true` only the first time.
    pub fn latch_score(&mut self, time: f64) -> bool {
        if self.score_time.is_some() {
            return false;
        }
        self.score_time = Some(time);
        true
    }
}

// ---------------------------------------------------------------------------
// Turnovers and flags
// ---------------------------------------------------------------------------

/// An ownership change between two consecutive key states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Turnover {
    /// Time of the key state where the new owner first appears.
    pub time: f64,
    /// Planet that changed hands.
    pub planet: PlanetId,
    /// Owner before the change.
    pub old_owner: Option<PlayerId>,
    /// Owner after the change.
    pub new_owner: Option<PlayerId>,
    /// Population right after the change.
    pub new_pop: u32,
}

impl Turnover {
    /// Whether `other` describes the same conquest, ignoring population
    /// and previous owner (which can differ between relaxation passes).
    pub fn is_same_event_as(&self, other: &Self) -> bool {
        self.new_owner == other.new_owner
            && self.planet == other.planet
            && self.time.total_cmp(&other.time).is_eq()
    }
}

/// A flag newly planted: first ownership of a planet in a universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FlagEvent {
    /// Player who earned the flag.
    pub player: PlayerId,
    /// Universe the planet was taken in.
    pub universe: UniverseId,
    /// Planet the flag is planted on.
    pub planet: PlanetId,
    /// Time of the turnover that earned it.
    pub time: f64,
}
