//! Launching flights: command validation, ship debit, wormhole routing.
//!
//! A command that cannot be carried out still produces a flight, with zero
//! ships, so rejected attempts stay visible without affecting anything.

use paradox_types::{CommandRef, Flight, FlightKind, PlayerCommand, UniverseId, WorldState};
use paradox_world::Topology;

use crate::config::MatchConfig;

/// Result of carrying out a command against a world state.
#[derive(Debug, Clone, PartialEq)]
pub struct Launch {
    /// Whether the command was carried out.
    pub valid: bool,
    /// Flight added to the launching state (a ghost if invalid).
    pub flight: Flight,
    /// Arrival half of a wormhole flight, destined for the exit universe's
    /// next relaxation round.
    pub arrival: Option<Flight>,
}

/// Ships sent by a command from a planet holding `pop`: half, rounded up.
pub const fn ships_to_send(pop: u32) -> u32 {
    pop.div_ceil(2)
}

/// Transit duration between two planets, or `None` if either is unknown.
pub fn transit_duration(topology: &Topology, command: &PlayerCommand, flight_speed: f64) -> Option<f64> {
    topology
        .distance(command.source_planet, command.target_planet)
        .map(|d| d / flight_speed)
}

/// Carry out `command` against `state`, which must be the world state at the
/// command's time.
///
/// The command is valid when the source planet belongs to the issuer, at
/// least one ship would be sent, and the target is reachable: a route
/// exists or both planets share an owner. Valid commands debit the source
/// planet. The flight is added to `state` either way.
pub fn launch(
    command: &PlayerCommand,
    universe: UniverseId,
    state: &mut WorldState,
    topology: &Topology,
    config: &MatchConfig,
) -> Launch {
    let source = command.source_planet;
    let target = command.target_planet;
    let route = topology.route(source, target);
    let source_owner = state.owner(source);
    let pop = state.pop(source).unwrap_or(0);
    let ships = ships_to_send(pop);

    let owned_by_issuer = source_owner == Some(command.player);
    let transfer = source_owner == state.owner(target);
    let valid = owned_by_issuer && ships >= 1 && (route.is_some() || transfer);

    let duration = transit_duration(topology, command, config.physics.flight_speed).unwrap_or(0.0);
    let open_duration = config.timeline.wormhole_open_duration;
    let through_wormhole = route.is_some_and(|r| r.is_time_route_at(command.time, open_duration));

    let mut flight = Flight {
        owner: command.player,
        ships: 0,
        start_planet: source,
        end_planet: target,
        start_time: command.time,
        end_time: command.time + duration,
        kind: if through_wormhole {
            FlightKind::DepartViaWormhole
        } else {
            FlightKind::Normal
        },
        universe,
        origin: CommandRef {
            universe,
            command: command.id,
        },
    };

    if valid {
        flight.ships = ships;
        if let Some(slot) = state.planet_pops.get_mut(source.index()) {
            *slot = slot.saturating_sub(ships);
        }
    }

    let arrival = if through_wormhole {
        route
            .and_then(|r| r.wormhole())
            .and_then(|w| {
                w.exit(
                    universe,
                    command.time,
                    open_duration,
                    config.rules.universe_count,
                )
            })
            .map(|exit| Flight {
                start_time: exit.time,
                end_time: exit.time + duration,
                kind: FlightKind::ArriveViaWormhole,
                universe: exit.universe,
                ..flight.clone()
            })
    } else {
        None
    };

    state.flights.push(flight.clone());

    Launch {
        valid,
        flight,
        arrival,
    }
}
