//! Cross-universe relaxation: rebuild every universe until the wormhole
//! traffic between them stops changing.
//!
//! Each round rebuilds all universes from the arrivals the previous round
//! produced. A universe is settled when the arrivals it is about to receive
//! match, position by position, the arrivals it just consumed: same start
//! time, same ship count. When every universe is settled in the same
//! round, the histories are mutually consistent.
//!
//! A command set can in principle feed back on itself forever. Relaxation
//! gives up after a configured number of rounds and reports which
//! universes were still moving; nothing is published in that case.

use paradox_types::{Flight, UniverseId};
use paradox_world::Topology;
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::universe::{ScoreClaim, Universe};

/// Errors surfaced by the relaxation engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelaxationError {
    /// The round limit was reached with some universes still changing.
    #[error("relaxation did not settle after {rounds} rounds; unsettled universes: {unsettled:?}")]
    Unsettled {
        /// Rounds run before giving up.
        rounds: u32,
        /// Universes whose inbound arrivals were still changing.
        unsettled: Vec<UniverseId>,
    },
}

/// Where a relaxation was triggered from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    /// Universe whose command list changed.
    pub universe: UniverseId,
    /// Time of the new command.
    pub time: f64,
}

/// Result of a settled relaxation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// Rounds needed to settle.
    pub rounds: u32,
    /// Earliest changed time per universe. Values above the horizon mean
    /// the universe's history did not change.
    pub earliest_change: Vec<f64>,
    /// Conquests of player-held planets in the settled histories.
    pub claims: Vec<ScoreClaim>,
}

impl Settlement {
    /// Universes whose history changed, with the earliest affected time.
    pub fn changed(&self, horizon: f64) -> impl Iterator<Item = (UniverseId, f64)> + '_ {
        self.earliest_change
            .iter()
            .enumerate()
            .filter(move |(_, t)| **t <= horizon)
            .filter_map(|(i, t)| UniverseId::from_index(i).map(|u| (u, *t)))
    }
}

/// Compare the arrivals a universe consumed with the ones it will consume
/// next. Returns the earliest time at which they differ, if any.
pub fn first_discrepancy(consumed: &[Flight], produced: &[Flight]) -> Option<f64> {
    let mut previous = consumed.iter();
    let mut next = produced.iter();
    loop {
        match (previous.next(), next.next()) {
            (None, None) => return None,
            (Some(old), None) => return Some(old.start_time),
            (None, Some(new)) => return Some(new.start_time),
            (Some(old), Some(new)) => {
                if old.start_time.total_cmp(&new.start_time).is_ne() {
                    return Some(old.start_time.min(new.start_time));
                }
                if old.ships != new.ships {
                    return Some(old.start_time);
                }
            }
        }
    }
}

/// Rebuild every universe until all are settled.
///
/// `trigger` names the universe and time of the command that started the
/// relaxation; with no trigger (a resettle) every universe starts with
/// nothing changed. Turnovers are refreshed on success.
///
/// # Errors
///
/// Returns [`RelaxationError::Unsettled`] after
/// `config.relaxation.max_rounds` rounds without settling. Universes are
/// left mid-relaxation; callers must restore them.
pub fn relax(
    universes: &mut [Universe],
    topology: &Topology,
    config: &MatchConfig,
    trigger: Option<Trigger>,
) -> Result<Settlement, RelaxationError> {
    let horizon = config.timeline.horizon;
    let untouched = horizon + 1.0;
    let mut earliest_change: Vec<f64> = universes
        .iter()
        .map(|u| match trigger {
            Some(t) if t.universe == u.id() => t.time,
            _ => untouched,
        })
        .collect();

    let max_rounds = config.relaxation.max_rounds;
    let mut round: u32 = 0;
    loop {
        round = round.saturating_add(1);

        let mut next_incoming: Vec<Vec<Flight>> = vec![Vec::new(); universes.len()];
        let mut claims = Vec::new();
        for universe in universes.iter_mut() {
            let output = universe.rebuild(topology, config);
            for flight in output.outgoing {
                if let Some(bucket) = next_incoming.get_mut(flight.universe.index()) {
                    bucket.push(flight);
                }
            }
            claims.extend(output.claims);
        }

        let mut unsettled = Vec::new();
        for ((universe, mut produced), earliest) in universes
            .iter_mut()
            .zip(next_incoming)
            .zip(earliest_change.iter_mut())
        {
            produced.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
            if let Some(time) = first_discrepancy(universe.incoming(), &produced) {
                *earliest = earliest.min(time);
                unsettled.push(universe.id());
            }
            universe.set_incoming(produced);
        }

        debug!(round, unsettled = unsettled.len(), "Relaxation round complete");

        if unsettled.is_empty() {
            for universe in universes.iter_mut() {
                universe.refresh_turnovers();
            }
            info!(rounds = round, universes = universes.len(), "Relaxation settled");
            return Ok(Settlement {
                rounds: round,
                earliest_change,
                claims,
            });
        }

        if round >= max_rounds {
            warn!(
                rounds = round,
                unsettled = ?unsettled,
                "Relaxation abandoned before settling"
            );
            return Err(RelaxationError::Unsettled {
                rounds: round,
                unsettled,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use paradox_types::{CommandId, CommandRef, CommandRequest, FlightKind, PlanetId, PlayerId};
    use paradox_world::{Position, TopologyBuilder, Wormhole};

    fn make_flight(start: f64, ships: u32) -> Flight {
        Flight {
            owner: PlayerId::new(0),
            ships,
            start_planet: PlanetId::new(0),
            end_planet: PlanetId::new(1),
            start_time: start,
            end_time: start + 10.0,
            kind: FlightKind::ArriveViaWormhole,
            universe: UniverseId::new(0),
            origin: CommandRef {
                universe: UniverseId::new(1),
                command: CommandId::new(0),
            },
        }
    }

    #[test]
    fn identical_sets_are_settled() {
        let a = vec![make_flight(5.0, 3), make_flight(8.0, 1)];
        assert_eq!(first_discrepancy(&a, &a.clone()), None);
        assert_eq!(first_discrepancy(&[], &[]), None);
    }

    #[test]
    fn discrepancies_report_earliest_time() {
        let old = vec![make_flight(5.0, 3), make_flight(8.0, 1)];
        assert_eq!(first_discrepancy(&old, &[make_flight(5.0, 3)]), Some(8.0));
        assert_eq!(first_discrepancy(&[], &old), Some(5.0));
        assert_eq!(
            first_discrepancy(&old, &[make_flight(4.0, 3), make_flight(8.0, 1)]),
            Some(4.0)
        );
        assert_eq!(
            first_discrepancy(&old, &[make_flight(5.0, 2), make_flight(8.0, 1)]),
            Some(5.0)
        );
    }

    fn make_config() -> MatchConfig {
        let mut config = MatchConfig::default();
        config.physics.growth_per_size = 1.0;
        config.physics.flight_speed = 1.0;
        config
    }

    fn make_wormhole_topology(crosses_universe: bool) -> Topology {
        let mut builder = TopologyBuilder::new();
        let a = builder
            .add_planet(1.0, Position::new(0.0, 0.0), 10, Some(PlayerId::new(0)))
            .unwrap();
        let b = builder
            .add_planet(1.0, Position::new(10.0, 0.0), 2, None)
            .unwrap();
        builder
            .wormhole_route(
                a,
                b,
                Wormhole {
                    head_time: 10.0,
                    tail_time: 50.0,
                    crosses_universe,
                },
            )
            .distance(a, b, 10.0)
            .build()
            .unwrap()
    }

    #[test]
    fn no_commands_settle_in_one_round() {
        let topology = make_wormhole_topology(false);
        let config = make_config();
        let mut universes = vec![Universe::new(UniverseId::new(0), &topology, &config)];
        let settlement = relax(&mut universes, &topology, &config, None).unwrap();
        assert_eq!(settlement.rounds, 1);
        assert_eq!(settlement.changed(config.timeline.horizon).count(), 0);
    }

    #[test]
    fn wormhole_send_needs_a_second_round() {
        let topology = make_wormhole_topology(false);
        let config = make_config();
        let mut universes = vec![Universe::new(UniverseId::new(0), &topology, &config)];
        universes.first_mut().unwrap().admit(CommandRequest {
            time: 10.0,
            player: PlayerId::new(0),
            source_planet: PlanetId::new(0),
            target_planet: PlanetId::new(1),
        });
        let trigger = Trigger {
            universe: UniverseId::new(0),
            time: 10.0,
        };
        let settlement = relax(&mut universes, &topology, &config, Some(trigger)).unwrap();
        assert_eq!(settlement.rounds, 2);
        let changed: Vec<_> = settlement.changed(config.timeline.horizon).collect();
        assert_eq!(changed, vec![(UniverseId::new(0), 10.0)]);

        let universe = universes.first().unwrap();
        let state = universe.state_at(60.0, &topology, &config);
        assert_eq!(state.owner(PlanetId::new(1)), Some(PlayerId::new(0)));
    }

    #[test]
    fn crossing_wormhole_reaches_neighbor() {
        let topology = make_wormhole_topology(true);
        let config = make_config();
        let mut universes = vec![
            Universe::new(UniverseId::new(0), &topology, &config),
            Universe::new(UniverseId::new(1), &topology, &config),
        ];
        universes.first_mut().unwrap().admit(CommandRequest {
            time: 12.0,
            player: PlayerId::new(0),
            source_planet: PlanetId::new(0),
            target_planet: PlanetId::new(1),
        });
        let trigger = Trigger {
            universe: UniverseId::new(0),
            time: 12.0,
        };
        let settlement = relax(&mut universes, &topology, &config, Some(trigger)).unwrap();
        let changed: Vec<_> = settlement.changed(config.timeline.horizon).collect();
        assert_eq!(
            changed,
            vec![(UniverseId::new(0), 12.0), (UniverseId::new(1), 52.0)]
        );
        let other = universes.get(1).unwrap();
        assert_eq!(other.incoming().len(), 1);
        let state = other.state_at(62.0, &topology, &config);
        assert_eq!(state.owner(PlanetId::new(1)), Some(PlayerId::new(0)));
    }

    /// `x` reaches `y` back in time through a wormhole; `y` feeds `u` by a
    /// plain route; `x` and `u` are unrouted, so `x -> u` only carries ships
    /// while `u` shares `x`'s owner.
    fn make_feedback_topology(y_pop: u32) -> Topology {
        let mut builder = TopologyBuilder::new();
        let x = builder
            .add_planet(1.0, Position::new(0.0, 0.0), 10, Some(PlayerId::new(0)))
            .unwrap();
        let y = builder
            .add_planet(1.0, Position::new(10.0, 0.0), y_pop, None)
            .unwrap();
        let u = builder
            .add_planet(1.0, Position::new(10.0, 10.0), 0, None)
            .unwrap();
        builder
            .wormhole_route(
                x,
                y,
                Wormhole {
                    head_time: 10.0,
                    tail_time: 50.0,
                    crosses_universe: false,
                },
            )
            .plain_route(y, u)
            .distance(x, y, 10.0)
            .distance(y, u, 10.0)
            .distance(x, u, 10.0)
            .build()
            .unwrap()
    }

    fn admit_feedback_commands(universe: &mut Universe) {
        for (time, source, target) in [(25.0, 1, 2), (40.0, 0, 2), (50.0, 0, 1)] {
            universe.admit(CommandRequest {
                time,
                player: PlayerId::new(0),
                source_planet: PlanetId::new(source),
                target_planet: PlanetId::new(target),
            });
        }
    }

    #[test]
    fn backward_feedback_settles_in_three_rounds() {
        // Round 1 sends 30 ships back to t=10. They take `y` at t=20, which
        // enables the `y -> u` and `x -> u` commands; the latter halves `x`,
        // so round 2 sends only 18. Round 3 sees 18 again: `y` still falls.
        let topology = make_feedback_topology(10);
        let config = make_config();
        let mut universes = vec![Universe::new(UniverseId::new(0), &topology, &config)];
        admit_feedback_commands(universes.first_mut().unwrap());

        let settlement = relax(&mut universes, &topology, &config, None).unwrap();
        assert_eq!(settlement.rounds, 3);
        assert!(settlement.rounds < config.relaxation.max_rounds);

        let universe = universes.first().unwrap();
        assert!(universe.commands().iter().all(|c| c.valid));
        assert_eq!(universe.incoming().len(), 1);
        assert_eq!(universe.incoming().first().unwrap().ships, 18);
        let state = universe.state_at(20.0, &topology, &config);
        assert_eq!(state.owner(PlanetId::new(1)), Some(PlayerId::new(0)));
        assert_eq!(state.pop(PlanetId::new(1)), Some(8));
    }

    #[test]
    fn self_defeating_send_never_settles() {
        // 30 ships take `y` (20 defenders), which drains `x` to an 18-ship
        // send that cannot; without `y` the drain stops and 30 go again.
        let topology = make_feedback_topology(20);
        let config = make_config();
        let mut universes = vec![Universe::new(UniverseId::new(0), &topology, &config)];
        admit_feedback_commands(universes.first_mut().unwrap());

        let result = relax(&mut universes, &topology, &config, None);
        assert_eq!(
            result,
            Err(RelaxationError::Unsettled {
                rounds: config.relaxation.max_rounds,
                unsettled: vec![UniverseId::new(0)],
            })
        );
    }

    #[test]
    fn round_limit_reports_unsettled() {
        let topology = make_wormhole_topology(false);
        let mut config = make_config();
        config.relaxation.max_rounds = 1;
        let mut universes = vec![Universe::new(UniverseId::new(0), &topology, &config)];
        universes.first_mut().unwrap().admit(CommandRequest {
            time: 10.0,
            player: PlayerId::new(0),
            source_planet: PlanetId::new(0),
            target_planet: PlanetId::new(1),
        });
        let result = relax(&mut universes, &topology, &config, None);
        assert_eq!(
            result,
            Err(RelaxationError::Unsettled {
                rounds: 1,
                unsettled: vec![UniverseId::new(0)],
            })
        );
    }
}
