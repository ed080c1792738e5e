//! The match facade: universes, flags, scores, and the win condition.
//!
//! [`Match`] owns every universe and serializes changes to them. Each
//! submitted command triggers one full relaxation; observers only ever see
//! settled histories. If relaxation does not settle, the match is restored
//! to its state before the submission and the command is rejected.
//!
//! # Scoring
//!
//! Two independent counters exist per player:
//!
//! - **Flags**: first ownership of a planet in a universe, durable for the
//!   match. Flag count drives the win condition.
//! - **Conquest points**: one per command whose flight conquered a
//!   player-held planet, latched on the command.

use std::sync::Arc;

use paradox_types::{
    CommandRequest, MatchEvent, PlanetId, PlayerCommand, PlayerId, Turnover, UniverseId,
    WorldState,
};
use paradox_world::Topology;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, MatchConfig};
use crate::conservation::{self, ConservationResult};
use crate::relaxation::{self, RelaxationError, Trigger};
use crate::turnover::FlagTable;
use crate::universe::Universe;

/// Errors returned by [`Match`] operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The configuration is out of range.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Relaxation did not settle; the submission was rolled back.
    #[error("relaxation error: {source}")]
    Relaxation {
        /// The underlying relaxation error.
        #[from]
        source: RelaxationError,
    },

    /// No universe with this index exists.
    #[error("unknown universe: {0}")]
    UnknownUniverse(UniverseId),

    /// No player with this index takes part.
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// No planet with this index exists.
    #[error("unknown planet: {0}")]
    UnknownPlanet(PlanetId),

    /// A command time falls outside the timeline.
    #[error("command time {time} outside [0, {horizon}]")]
    TimeOutOfRange {
        /// The rejected time.
        time: f64,
        /// Last valid time.
        horizon: f64,
    },
}

/// Outcome of an accepted command.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The command as admitted and validated by the settled history.
    pub command: PlayerCommand,
    /// Relaxation rounds needed to settle.
    pub rounds: u32,
    /// Notifications produced by the settle, in order.
    pub events: Vec<MatchEvent>,
}

/// A running match.
#[derive(Debug, Clone)]
pub struct Match {
    config: MatchConfig,
    topology: Arc<Topology>,
    universes: Vec<Universe>,
    flags: FlagTable,
    conquest_points: Vec<u32>,
    winner: Option<PlayerId>,
}

impl Match {
    /// Set up a match: one universe per configured index, each started from
    /// the topology with rotated owners, then settled once. Initial owners
    /// receive their flags at time 0.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Config`] for out-of-range configuration or a
    /// flag threshold the starting planets already meet,
    /// [`MatchError::UnknownPlayer`] if the topology assigns a planet to a
    /// player beyond the configured count, or [`MatchError::Relaxation`] if
    /// the empty match cannot settle.
    pub fn new(config: MatchConfig, topology: Topology) -> Result<Self, MatchError> {
        config.validate()?;
        let players = config.rules.player_count;
        for planet in topology.planets() {
            if let Some(owner) = planet.initial_owner {
                if owner.0 >= players {
                    return Err(MatchError::UnknownPlayer(owner));
                }
            }
        }

        let universes: Vec<Universe> = (0..config.rules.universe_count)
            .map(|u| Universe::new(UniverseId::new(u), &topology, &config))
            .collect();
        let player_slots = usize::try_from(players).unwrap_or(usize::MAX);
        let flags = FlagTable::new(player_slots, universes.len(), topology.planet_count());

        let mut game = Self {
            config,
            topology: Arc::new(topology),
            universes,
            flags,
            conquest_points: vec![0; player_slots],
            winner: None,
        };

        let mut initial_flags = Vec::new();
        for universe in &game.universes {
            let origin = universe.origin_state();
            for (index, owner) in origin.planet_owners.iter().enumerate() {
                if let (Some(player), Some(planet)) = (owner, PlanetId::from_index(index)) {
                    initial_flags.push((*player, universe.id(), planet));
                }
            }
        }
        for (player, universe, planet) in initial_flags {
            game.flags.mark(player, universe, planet, 0.0);
        }
        let threshold = game.config.rules.flags_to_win;
        if let Some(count) = game.flags.counts().iter().copied().find(|c| *c >= threshold) {
            return Err(ConfigError::Invalid {
                field: "rules.flags_to_win",
                reason: format!("{threshold} is already met by {count} starting flags"),
            }
            .into());
        }

        game.settle(None)?;

        info!(
            players,
            universes = game.universes.len(),
            planets = game.topology.planet_count(),
            routes = game.topology.route_count(),
            "Match created"
        );
        Ok(game)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Admit a command into `universe` and relax every universe.
    ///
    /// Invalid commands (wrong owner, no ships, unreachable target) are
    /// accepted and recorded as ghost flights; only malformed requests and
    /// relaxations that do not settle are errors.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`], [`MatchError::UnknownPlayer`],
    /// [`MatchError::UnknownPlanet`], or [`MatchError::TimeOutOfRange`] for
    /// malformed requests, and [`MatchError::Relaxation`] if relaxation
    /// did not settle. On error the match is unchanged.
    pub fn submit_command(
        &mut self,
        universe: UniverseId,
        request: CommandRequest,
    ) -> Result<Submission, MatchError> {
        self.check_request(universe, &request)?;

        let snapshot = self.universes.clone();
        let admitted = self
            .universes
            .get_mut(universe.index())
            .ok_or(MatchError::UnknownUniverse(universe))?
            .admit(request);

        debug!(
            universe = %universe,
            command = %admitted.id,
            player = %request.player,
            time = request.time,
            "Command admitted"
        );

        let trigger = Trigger {
            universe,
            time: request.time,
        };
        let (rounds, events) = match self.settle(Some(trigger)) {
            Ok(settled) => settled,
            Err(e) => {
                warn!(universe = %universe, error = %e, "Command rejected, history restored");
                self.universes = snapshot;
                return Err(e);
            }
        };

        let command = self
            .universes
            .get(universe.index())
            .and_then(|u| u.command(admitted.id))
            .cloned()
            .unwrap_or(admitted);

        Ok(Submission {
            command,
            rounds,
            events,
        })
    }

    /// Relax every universe without new commands. A settled match stays
    /// unchanged and produces no events.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Relaxation`] if relaxation did not settle; the
    /// match is then unchanged.
    pub fn resettle(&mut self) -> Result<Vec<MatchEvent>, MatchError> {
        let snapshot = self.universes.clone();
        match self.settle(None) {
            Ok((_, events)) => Ok(events),
            Err(e) => {
                self.universes = snapshot;
                Err(e)
            }
        }
    }

    fn check_request(&self, universe: UniverseId, request: &CommandRequest) -> Result<(), MatchError> {
        if universe.index() >= self.universes.len() {
            return Err(MatchError::UnknownUniverse(universe));
        }
        if request.player.0 >= self.config.rules.player_count {
            return Err(MatchError::UnknownPlayer(request.player));
        }
        for planet in [request.source_planet, request.target_planet] {
            if !self.topology.contains(planet) {
                return Err(MatchError::UnknownPlanet(planet));
            }
        }
        let horizon = self.config.timeline.horizon;
        if !request.time.is_finite() || request.time < 0.0 || request.time > horizon {
            return Err(MatchError::TimeOutOfRange {
                time: request.time,
                horizon,
            });
        }
        Ok(())
    }

    /// Relax, then fold the settled histories into events, scores, flags,
    /// and the winner.
    fn settle(&mut self, trigger: Option<Trigger>) -> Result<(u32, Vec<MatchEvent>), MatchError> {
        let settlement = relaxation::relax(&mut self.universes, &self.topology, &self.config, trigger)?;
        let horizon = self.config.timeline.horizon;

        let mut events: Vec<MatchEvent> = settlement
            .changed(horizon)
            .map(|(universe, earliest)| MatchEvent::HistoryChanged { universe, earliest })
            .collect();

        for claim in &settlement.claims {
            let latched = self
                .universes
                .get_mut(claim.origin.universe.index())
                .and_then(|u| u.command_mut(claim.origin.command))
                .is_some_and(|c| c.latch_score(claim.time));
            if !latched {
                continue;
            }
            if let Some(points) = self.conquest_points.get_mut(claim.player.index()) {
                *points = points.saturating_add(1);
            }
            events.push(MatchEvent::ScorePoint {
                player: claim.player,
                universe: claim.origin.universe,
                command: claim.origin.command,
                time: claim.time,
            });
        }

        for universe in &self.universes {
            for flag in self.flags.mark_turnovers(universe.id(), universe.turnovers()) {
                debug!(
                    player = %flag.player,
                    universe = %flag.universe,
                    planet = %flag.planet,
                    "Flag planted"
                );
                events.push(MatchEvent::FlagSet(flag));
            }
        }

        if let Some(player) = self.latch_winner() {
            info!(player = %player, "Victory");
            events.push(MatchEvent::Victory { player });
        }

        Ok((settlement.rounds, events))
    }

    /// Latch the winner if none is set and someone reached the threshold.
    /// Returns the player only when newly latched.
    fn latch_winner(&mut self) -> Option<PlayerId> {
        if self.winner.is_some() {
            return None;
        }
        let threshold = self.config.rules.flags_to_win;
        let best = self
            .flags
            .counts()
            .iter()
            .enumerate()
            .filter(|(_, count)| **count >= threshold)
            .max_by(|(ia, ca), (ib, cb)| ca.cmp(cb).then(ib.cmp(ia)))
            .and_then(|(i, _)| PlayerId::from_index(i))?;
        self.winner = Some(best);
        Some(best)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn universe(&self, universe: UniverseId) -> Result<&Universe, MatchError> {
        self.universes
            .get(universe.index())
            .ok_or(MatchError::UnknownUniverse(universe))
    }

    /// World state of `universe` at `time`, clamped to `[0, horizon]`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`] for an unknown universe.
    pub fn state_at(&self, universe: UniverseId, time: f64) -> Result<WorldState, MatchError> {
        let time = self.clamp_time(time);
        Ok(self.universe(universe)?.state_at(time, &self.topology, &self.config))
    }

    /// Key states of `universe` from the last settle.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`] for an unknown universe.
    pub fn key_states(&self, universe: UniverseId) -> Result<&[WorldState], MatchError> {
        Ok(self.universe(universe)?.key_states())
    }

    /// Committed commands of `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`] for an unknown universe.
    pub fn commands(&self, universe: UniverseId) -> Result<&[PlayerCommand], MatchError> {
        Ok(self.universe(universe)?.commands())
    }

    /// Commands of `universe` the settled history could not carry out.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`] for an unknown universe.
    pub fn invalid_commands(&self, universe: UniverseId) -> Result<Vec<PlayerCommand>, MatchError> {
        Ok(self.universe(universe)?.invalid_commands().cloned().collect())
    }

    /// Ownership changes in `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`] for an unknown universe.
    pub fn turnovers(&self, universe: UniverseId) -> Result<&[Turnover], MatchError> {
        Ok(self.universe(universe)?.turnovers())
    }

    /// Per-planet readiness in `universe` at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`] for an unknown universe.
    pub fn planets_ready(&self, universe: UniverseId, time: f64) -> Result<Vec<bool>, MatchError> {
        let time = self.clamp_time(time);
        Ok(self
            .universe(universe)?
            .planets_ready(time, &self.topology, &self.config))
    }

    /// The only player owning planets in `universe` at `time`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`] for an unknown universe.
    pub fn surviving_owner(&self, universe: UniverseId, time: f64) -> Result<Option<PlayerId>, MatchError> {
        let time = self.clamp_time(time);
        Ok(self
            .universe(universe)?
            .surviving_owner(time, &self.topology, &self.config))
    }

    /// Audit ship conservation over every key state of `universe`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownUniverse`] for an unknown universe.
    pub fn audit(&self, universe: UniverseId) -> Result<ConservationResult, MatchError> {
        Ok(conservation::audit_history(self.universe(universe)?.key_states()))
    }

    /// Whether `player` has planted a flag on `planet` in `universe`.
    pub fn has_flag(&self, player: PlayerId, universe: UniverseId, planet: PlanetId) -> bool {
        self.flags.has(player, universe, planet)
    }

    /// Flags planted by `player` across all universes.
    pub fn flag_count(&self, player: PlayerId) -> u32 {
        self.flags.count(player)
    }

    /// Conquest points earned by `player`.
    pub fn conquest_points(&self, player: PlayerId) -> u32 {
        self.conquest_points
            .get(player.index())
            .copied()
            .unwrap_or(0)
    }

    /// The latched winner, if any.
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Match configuration.
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Shared topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Number of universes.
    pub fn universe_count(&self) -> usize {
        self.universes.len()
    }

    fn clamp_time(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.config.timeline.horizon)
    }
}
