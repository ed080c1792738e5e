//! One timeline: committed commands, inbound wormhole arrivals, and the
//! discrete-event rebuild that turns them into key states.
//!
//! # Rebuild
//!
//! Every rebuild starts from the universe's fixed time-0 snapshot and
//! replays a time-ordered queue of [`TimelineEvent`]s. Events at the same
//! instant run in the order they were enqueued: inbound arrivals first,
//! then commands in admission order, then flight ends scheduled while
//! replaying. Each processed event saves a key state.
//!
//! A rebuild never reads another universe. Flights leaving through a
//! wormhole are returned to the caller, which hands them to the exit
//! universe for its next round.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use paradox_types::{
    CommandId, CommandRef, CommandRequest, Flight, PlanetId, PlayerCommand, PlayerId,
    ShipTally, Turnover, UniverseId, WorldState,
};
use paradox_world::Topology;
use tracing::debug;

use crate::config::MatchConfig;
use crate::history::History;
use crate::transit;
use crate::turnover;

// ---------------------------------------------------------------------------
// Event queue
// ---------------------------------------------------------------------------

/// Something that happens at an instant of a universe's history.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// A committed command, by position in the command list.
    Command(usize),
    /// A wormhole arrival entering this universe.
    FlightStart(Flight),
    /// A flight reaching its target.
    FlightEnd(Flight),
}

/// Queue key: event time, then enqueue order.
#[derive(Debug, Clone, Copy)]
struct QueueKey {
    time: f64,
    seq: u64,
}

impl PartialEq for QueueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for QueueKey {}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Time-ordered event queue, first-in first-out among equal times.
#[derive(Debug, Default)]
struct EventQueue {
    events: BTreeMap<QueueKey, TimelineEvent>,
    next_seq: u64,
}

impl EventQueue {
    fn push(&mut self, time: f64, event: TimelineEvent) {
        let key = QueueKey {
            time,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.saturating_add(1);
        self.events.insert(key, event);
    }

    fn pop(&mut self) -> Option<TimelineEvent> {
        self.events.pop_first().map(|(_, event)| event)
    }
}

// ---------------------------------------------------------------------------
// Rebuild output
// ---------------------------------------------------------------------------

/// A conquest of a player-held planet, credited to the command whose
/// flight made it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreClaim {
    /// Command that launched the conquering flight.
    pub origin: CommandRef,
    /// Player credited.
    pub player: PlayerId,
    /// Universe the conquest happened in.
    pub universe: UniverseId,
    /// Time of the conquest.
    pub time: f64,
}

/// What one rebuild sends outward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildOutput {
    /// Wormhole arrivals for other universes' next round. Each flight's
    /// `universe` names its destination.
    pub outgoing: Vec<Flight>,
    /// Conquests of player-held planets in this rebuild.
    pub claims: Vec<ScoreClaim>,
}

// ---------------------------------------------------------------------------
// Universe
// ---------------------------------------------------------------------------

/// One parallel timeline.
#[derive(Debug, Clone)]
pub struct Universe {
    id: UniverseId,
    origin: WorldState,
    history: History,
    commands: Vec<PlayerCommand>,
    next_command_id: u64,
    incoming: Vec<Flight>,
    turnovers: Vec<Turnover>,
}

impl Universe {
    /// Create a universe whose time-0 state is taken from the topology,
    /// with every initial owner rotated by the universe index.
    pub fn new(id: UniverseId, topology: &Topology, config: &MatchConfig) -> Self {
        let players = config.rules.player_count;
        let planet_pops: Vec<u32> = topology.planets().iter().map(|p| p.initial_pop).collect();
        let planet_owners = topology
            .planets()
            .iter()
            .map(|p| {
                p.initial_owner.and_then(|owner| {
                    owner
                        .0
                        .checked_add(id.0)
                        .and_then(|o| o.checked_rem(players))
                        .map(PlayerId::new)
                })
            })
            .collect();
        let initial = planet_pops.iter().map(|&p| u64::from(p)).sum();
        let origin = WorldState {
            time: 0.0,
            planet_pops,
            planet_owners,
            flights: Vec::new(),
            tally: ShipTally {
                initial,
                ..ShipTally::default()
            },
        };
        let mut history = History::new();
        history.reset(origin.clone());
        Self {
            id,
            origin,
            history,
            commands: Vec::new(),
            next_command_id: 0,
            incoming: Vec::new(),
            turnovers: Vec::new(),
        }
    }

    /// This universe's index.
    pub const fn id(&self) -> UniverseId {
        self.id
    }

    /// The fixed time-0 snapshot.
    pub const fn origin_state(&self) -> &WorldState {
        &self.origin
    }

    /// Key states from the latest rebuild.
    pub fn key_states(&self) -> &[WorldState] {
        self.history.key_states()
    }

    /// Committed commands, ordered by time then admission.
    pub fn commands(&self) -> &[PlayerCommand] {
        &self.commands
    }

    /// Look up a committed command by id.
    pub fn command(&self, id: CommandId) -> Option<&PlayerCommand> {
        self.commands.iter().find(|c| c.id == id)
    }

    /// Mutable access to a committed command by id.
    pub fn command_mut(&mut self, id: CommandId) -> Option<&mut PlayerCommand> {
        self.commands.iter_mut().find(|c| c.id == id)
    }

    /// Commands the latest rebuild could not carry out.
    pub fn invalid_commands(&self) -> impl Iterator<Item = &PlayerCommand> {
        self.commands.iter().filter(|c| !c.valid)
    }

    /// Wormhole arrivals consumed by the latest rebuild.
    pub fn incoming(&self) -> &[Flight] {
        &self.incoming
    }

    /// Replace the arrivals consumed by the next rebuild.
    pub fn set_incoming(&mut self, incoming: Vec<Flight>) {
        self.incoming = incoming;
    }

    /// Ownership changes found in the current key states.
    pub fn turnovers(&self) -> &[Turnover] {
        &self.turnovers
    }

    /// Recompute [`Universe::turnovers`] from the current key states.
    pub fn refresh_turnovers(&mut self) {
        self.turnovers = turnover::find_turnovers(&self.origin, self.history.key_states());
    }

    /// Admit a command, assigning the next id. It is placed after every
    /// command at or before its time.
    pub fn admit(&mut self, request: CommandRequest) -> PlayerCommand {
        let id = CommandId::new(self.next_command_id);
        self.next_command_id = self.next_command_id.saturating_add(1);
        let command = PlayerCommand::admit(id, request);
        let at = self.commands.partition_point(|c| c.time <= command.time);
        self.commands.insert(at, command.clone());
        command
    }

    /// World state at `time`, extrapolated from the latest key state.
    /// Times before zero answer with the time-0 snapshot.
    pub fn state_at(&self, time: f64, topology: &Topology, config: &MatchConfig) -> WorldState {
        self.history
            .state_at(time, topology, config.physics.growth_per_size)
            .unwrap_or_else(|| self.origin.clone())
    }

    /// Which planets can be commanded at `time`.
    ///
    /// A planet is ready when owned, unless its owner already commanded it
    /// within the cooldown window around `time`.
    pub fn planets_ready(&self, time: f64, topology: &Topology, config: &MatchConfig) -> Vec<bool> {
        let state = self.state_at(time, topology, config);
        let mut ready: Vec<bool> = state.planet_owners.iter().map(Option::is_some).collect();
        let cooldown = config.timeline.command_cooldown;
        for command in &self.commands {
            if (command.time - state.time).abs() < cooldown
                && state.owner(command.source_planet) == Some(command.player)
            {
                if let Some(slot) = ready.get_mut(command.source_planet.index()) {
                    *slot = false;
                }
            }
        }
        ready
    }

    /// The only player owning planets at `time`, if exactly one does.
    pub fn surviving_owner(&self, time: f64, topology: &Topology, config: &MatchConfig) -> Option<PlayerId> {
        let state = self.state_at(time, topology, config);
        let mut owners = state.planet_owners.iter().flatten();
        let first = *owners.next()?;
        owners.all(|&o| o == first).then_some(first)
    }

    /// Replay the whole history from time 0 using the current commands and
    /// inbound arrivals.
    pub fn rebuild(&mut self, topology: &Topology, config: &MatchConfig) -> RebuildOutput {
        let horizon = config.timeline.horizon;
        let growth = config.physics.growth_per_size;
        let mut output = RebuildOutput::default();

        self.history.reset(self.origin.clone());

        let mut queue = EventQueue::default();
        for flight in &self.incoming {
            queue.push(flight.start_time, TimelineEvent::FlightStart(flight.clone()));
        }
        for (index, command) in self.commands.iter().enumerate() {
            queue.push(command.time, TimelineEvent::Command(index));
        }

        while let Some(event) = queue.pop() {
            match event {
                TimelineEvent::Command(index) => {
                    let Some(command) = self.commands.get(index) else {
                        continue;
                    };
                    let time = command.time;
                    let mut state = self.state_at_time(time, topology, growth);
                    let launch = transit::launch(command, self.id, &mut state, topology, config);
                    if let Some(slot) = self.commands.get_mut(index) {
                        slot.valid = launch.valid;
                    }
                    if let Some(arrival) = launch.arrival {
                        output.outgoing.push(arrival);
                    }
                    queue.push(launch.flight.end_time, TimelineEvent::FlightEnd(launch.flight));
                    self.history.save(state);
                }
                TimelineEvent::FlightStart(flight) => {
                    if flight.start_time > horizon {
                        continue;
                    }
                    let mut state = self.state_at_time(flight.start_time, topology, growth);
                    state.tally.arrived = state.tally.arrived.saturating_add(u64::from(flight.ships));
                    state.flights.push(flight.clone());
                    queue.push(flight.end_time, TimelineEvent::FlightEnd(flight));
                    self.history.save(state);
                }
                TimelineEvent::FlightEnd(flight) => {
                    if flight.end_time > horizon {
                        continue;
                    }
                    let mut state = self.state_at_time(flight.end_time, topology, growth);
                    if let Some(conquered_from) = resolve_arrival(&mut state, &flight) {
                        if conquered_from.is_some() {
                            output.claims.push(ScoreClaim {
                                origin: flight.origin,
                                player: flight.owner,
                                universe: self.id,
                                time: flight.end_time,
                            });
                        }
                    }
                    self.history.save(state);
                }
            }
        }

        debug!(
            universe = %self.id,
            key_states = self.history.len(),
            commands = self.commands.len(),
            incoming = self.incoming.len(),
            outgoing = output.outgoing.len(),
            "Universe rebuilt"
        );

        output
    }

    fn state_at_time(&self, time: f64, topology: &Topology, growth_per_size: f64) -> WorldState {
        self.history
            .state_at(time, topology, growth_per_size)
            .unwrap_or_else(|| self.origin.clone())
    }
}

/// Remove `flight` from `state` and apply its effect on the target planet.
///
/// Returns `Some(previous_owner)` when the flight conquered the planet.
fn resolve_arrival(state: &mut WorldState, flight: &Flight) -> Option<Option<PlayerId>> {
    state
        .flights
        .retain(|f| !(f.origin == flight.origin && f.kind == flight.kind));

    if flight.is_ghost() {
        return None;
    }
    if !flight.kind.lands() {
        state.tally.departed = state.tally.departed.saturating_add(u64::from(flight.ships));
        return None;
    }

    let target = flight.end_planet.index();
    let owner = state.planet_owners.get(target).copied().flatten();
    let pop = state.planet_pops.get(target).copied().unwrap_or(0);

    if owner == Some(flight.owner) {
        set_pop(state, flight.end_planet, pop.saturating_add(flight.ships));
        return None;
    }

    if flight.ships <= pop {
        set_pop(state, flight.end_planet, pop.saturating_sub(flight.ships));
        state.tally.destroyed = state
            .tally
            .destroyed
            .saturating_add(u64::from(flight.ships).saturating_mul(2));
        return None;
    }

    set_pop(state, flight.end_planet, flight.ships.saturating_sub(pop));
    if let Some(slot) = state.planet_owners.get_mut(target) {
        *slot = Some(flight.owner);
    }
    state.tally.destroyed = state
        .tally
        .destroyed
        .saturating_add(u64::from(pop).saturating_mul(2));
    Some(owner)
}

fn set_pop(state: &mut WorldState, planet: PlanetId, pop: u32) {
    if let Some(slot) = state.planet_pops.get_mut(planet.index()) {
        *slot = pop;
    }
}
