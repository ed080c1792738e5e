//! End-to-end scenarios for the Paradox match: conquest, rejected
//! commands, time travel, and cross-universe causality.
//!
//! Each scenario builds a small hand-made topology with round numbers
//! (unit growth, unit flight speed, explicit distances) so expected
//! populations can be computed by hand.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

use paradox_core::{Match, MatchConfig};
use paradox_types::{
    CommandRequest, FlightKind, MatchEvent, PlanetId, PlayerId, UniverseId,
};
use paradox_world::{Position, Topology, TopologyBuilder, Wormhole};

const P0: PlayerId = PlayerId::new(0);
const P1: PlayerId = PlayerId::new(1);
const U0: UniverseId = UniverseId::new(0);
const U1: UniverseId = UniverseId::new(1);

fn unit_config(players: u32, universes: u32) -> MatchConfig {
    let mut config = MatchConfig::default();
    config.rules.player_count = players;
    config.rules.universe_count = universes;
    config.physics.growth_per_size = 1.0;
    config.physics.flight_speed = 1.0;
    config
}

fn request(time: f64, player: PlayerId, source: PlanetId, target: PlanetId) -> CommandRequest {
    CommandRequest {
        time,
        player,
        source_planet: source,
        target_planet: target,
    }
}

// ---------------------------------------------------------------------------
// Scenario A: single universe conquest of a neutral planet
// ---------------------------------------------------------------------------

fn two_planet_topology() -> (Topology, PlanetId, PlanetId) {
    let mut builder = TopologyBuilder::new();
    let a = builder.add_planet(1.0, Position::new(0.0, 0.0), 10, Some(P0)).unwrap();
    let b = builder.add_planet(1.0, Position::new(10.0, 0.0), 0, None).unwrap();
    let topology = builder.plain_route(a, b).distance(a, b, 10.0).build().unwrap();
    (topology, a, b)
}

#[test]
fn scenario_a_neutral_conquest() {
    let (topology, a, b) = two_planet_topology();
    let mut game = Match::new(unit_config(2, 1), topology).unwrap();
    assert_eq!(game.flag_count(P0), 1);

    let submission = game.submit_command(U0, request(0.0, P0, a, b)).unwrap();
    assert!(submission.command.valid);

    let state = game.state_at(U0, 10.0).unwrap();
    assert_eq!(state.owner(b), Some(P0));
    assert_eq!(state.pop(b), Some(5));
    assert_eq!(state.pop(a), Some(15));

    let flags: Vec<_> = submission
        .events
        .iter()
        .filter(|e| matches!(e, MatchEvent::FlagSet(_)))
        .collect();
    assert_eq!(flags.len(), 1);
    assert!(game.has_flag(P0, U0, b));
    assert_eq!(game.flag_count(P0), 2);

    let turnovers = game.turnovers(U0).unwrap();
    assert_eq!(turnovers.len(), 1);
    assert_eq!(turnovers[0].time, 10.0);
    assert_eq!(turnovers[0].new_pop, 5);

    let json = serde_json::to_value(&submission.events).unwrap();
    let flag = json
        .as_array()
        .unwrap()
        .iter()
        .find_map(|e| e.get("FlagSet"))
        .unwrap();
    assert_eq!(flag["planet"], 1);
    assert_eq!(flag["player"], 0);
}

#[test]
fn scenario_a_before_arrival_planet_is_neutral() {
    let (topology, a, b) = two_planet_topology();
    let mut game = Match::new(unit_config(2, 1), topology).unwrap();
    game.submit_command(U0, request(0.0, P0, a, b)).unwrap();

    let state = game.state_at(U0, 9.5).unwrap();
    assert_eq!(state.owner(b), None);
    assert_eq!(state.flights.len(), 1);
    assert!((state.flights[0].progress(9.5) - 0.95).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Scenario B: unreachable target
// ---------------------------------------------------------------------------

#[test]
fn scenario_b_unrouted_attack_is_a_ghost() {
    let mut builder = TopologyBuilder::new();
    let a = builder.add_planet(1.0, Position::new(0.0, 0.0), 10, Some(P0)).unwrap();
    let b = builder.add_planet(1.0, Position::new(10.0, 0.0), 0, None).unwrap();
    let c = builder.add_planet(1.0, Position::new(0.0, 10.0), 3, None).unwrap();
    // Explicit distance keeps the ghost's landing on a whole time unit.
    let topology = builder.plain_route(a, b).distance(a, c, 10.0).build().unwrap();

    let mut game = Match::new(unit_config(2, 1), topology).unwrap();
    let before: Vec<_> = [5.0, 20.0, 60.0]
        .iter()
        .map(|t| game.state_at(U0, *t).unwrap())
        .collect();

    let submission = game.submit_command(U0, request(5.0, P0, a, c)).unwrap();
    assert!(!submission.command.valid);
    assert_eq!(game.invalid_commands(U0).unwrap().len(), 1);

    let at_launch = game.state_at(U0, 5.0).unwrap();
    assert_eq!(at_launch.flights.len(), 1);
    assert!(at_launch.flights[0].is_ghost());

    for (t, old) in [5.0, 20.0, 60.0].iter().zip(before) {
        let new = game.state_at(U0, *t).unwrap();
        assert_eq!(new.planet_pops, old.planet_pops);
        assert_eq!(new.planet_owners, old.planet_owners);
    }
    assert!(!game.has_flag(P0, U0, c));
}

// ---------------------------------------------------------------------------
// Scenario C: same-universe wormhole
// ---------------------------------------------------------------------------

#[test]
fn scenario_c_wormhole_shifts_arrival() {
    let mut builder = TopologyBuilder::new();
    let a = builder.add_planet(1.0, Position::new(0.0, 0.0), 10, Some(P0)).unwrap();
    let b = builder.add_planet(1.0, Position::new(10.0, 0.0), 0, None).unwrap();
    let topology = builder
        .wormhole_route(
            a,
            b,
            Wormhole {
                head_time: 10.0,
                tail_time: 50.0,
                crosses_universe: false,
            },
        )
        .distance(a, b, 10.0)
        .build()
        .unwrap();

    let mut game = Match::new(unit_config(2, 1), topology).unwrap();
    // A holds 20 at t=10 and sends 10 into the head window.
    let submission = game.submit_command(U0, request(10.0, P0, a, b)).unwrap();
    assert!(submission.command.valid);
    assert_eq!(submission.rounds, 2);

    // No arrival at launch + duration.
    let at_20 = game.state_at(U0, 20.0).unwrap();
    assert_eq!(at_20.owner(b), None);
    assert!(at_20.flights.iter().all(|f| f.kind == FlightKind::DepartViaWormhole));

    let at_55 = game.state_at(U0, 55.0).unwrap();
    let arrival = at_55
        .flights
        .iter()
        .find(|f| f.kind == FlightKind::ArriveViaWormhole)
        .unwrap();
    assert_eq!(arrival.start_time, 50.0);
    assert_eq!(arrival.end_time, 60.0);
    assert_eq!(arrival.ships, 10);

    let at_60 = game.state_at(U0, 60.0).unwrap();
    assert_eq!(at_60.owner(b), Some(P0));
    assert_eq!(at_60.pop(b), Some(10));
}

// ---------------------------------------------------------------------------
// Scenario D: cross-universe causality
// ---------------------------------------------------------------------------

/// `A` (home) connects to `B` by a crossing wormhole; `B` connects to `T`
/// by a plain route. One player, so both universes start identical.
fn causal_topology() -> (Topology, PlanetId, PlanetId, PlanetId) {
    let mut builder = TopologyBuilder::new();
    let a = builder.add_planet(1.0, Position::new(0.0, 0.0), 10, Some(P0)).unwrap();
    let b = builder.add_planet(1.0, Position::new(10.0, 0.0), 0, None).unwrap();
    let t = builder.add_planet(1.0, Position::new(20.0, 0.0), 15, None).unwrap();
    let topology = builder
        .wormhole_route(
            a,
            b,
            Wormhole {
                head_time: 10.0,
                tail_time: 50.0,
                crosses_universe: true,
            },
        )
        .plain_route(b, t)
        .distance(a, b, 10.0)
        .distance(b, t, 10.0)
        .build()
        .unwrap();
    (topology, a, b, t)
}

#[test]
fn scenario_d_command_validated_by_another_universe() {
    let (topology, a, b, t) = causal_topology();
    let mut game = Match::new(unit_config(1, 2), topology).unwrap();

    // In universe 0, B is not owned at t=30: the command is a ghost.
    let first = game.submit_command(U0, request(30.0, P0, b, t)).unwrap();
    assert!(!first.command.valid);

    // From universe 1 at t=50, ships enter the tail window and reappear in
    // universe 0 at t=10, landing on B at t=20.
    let second = game.submit_command(U1, request(50.0, P0, a, b)).unwrap();
    assert!(second.rounds >= 2);
    assert!(second.rounds < game.config().relaxation.max_rounds);
    assert!(second.events.contains(&MatchEvent::HistoryChanged {
        universe: U0,
        earliest: 10.0,
    }));

    // A at t=50 holds 60, sends 30.
    let landed = game.state_at(U0, 20.0).unwrap();
    assert_eq!(landed.owner(b), Some(P0));
    assert_eq!(landed.pop(b), Some(30));

    // The earlier ghost is now a real launch: B holds 40 at t=30, sends 20
    // against T's 15.
    let commands = game.commands(U0).unwrap();
    assert!(commands[0].valid);
    let conquered = game.state_at(U0, 40.0).unwrap();
    assert_eq!(conquered.owner(t), Some(P0));
    assert_eq!(conquered.pop(t), Some(5));
    assert!(game.has_flag(P0, U0, t));

    // Universe 1 lost the ships to the wormhole and never sees them land.
    let origin = game.state_at(U1, 70.0).unwrap();
    assert_eq!(origin.owner(b), None);
    assert_eq!(origin.tally.departed, 30);
}

#[test]
fn scenario_d_resettle_is_stable() {
    let (topology, a, b, t) = causal_topology();
    let mut game = Match::new(unit_config(1, 2), topology).unwrap();
    game.submit_command(U0, request(30.0, P0, b, t)).unwrap();
    game.submit_command(U1, request(50.0, P0, a, b)).unwrap();

    let before_u0 = game.key_states(U0).unwrap().to_vec();
    let before_u1 = game.key_states(U1).unwrap().to_vec();
    let events = game.resettle().unwrap();
    assert!(events.is_empty());
    assert_eq!(game.key_states(U0).unwrap(), before_u0.as_slice());
    assert_eq!(game.key_states(U1).unwrap(), before_u1.as_slice());
}

// ---------------------------------------------------------------------------
// Conquest scoring across players
// ---------------------------------------------------------------------------

#[test]
fn conquest_of_enemy_planet_scores_and_flags() {
    let mut builder = TopologyBuilder::new();
    let a = builder.add_planet(1.0, Position::new(0.0, 0.0), 40, Some(P0)).unwrap();
    let c = builder.add_planet(1.0, Position::new(10.0, 0.0), 4, Some(P1)).unwrap();
    let topology = builder.plain_route(a, c).distance(a, c, 10.0).build().unwrap();

    let mut game = Match::new(unit_config(2, 1), topology).unwrap();
    let submission = game.submit_command(U0, request(0.0, P0, a, c)).unwrap();

    // 20 ships against 4 + 10 growth.
    let state = game.state_at(U0, 10.0).unwrap();
    assert_eq!(state.owner(c), Some(P0));
    assert_eq!(state.pop(c), Some(6));
    assert_eq!(game.conquest_points(P0), 1);
    assert!(submission.events.iter().any(|e| matches!(
        e,
        MatchEvent::ScorePoint { player, time, .. } if *player == P0 && *time == 10.0
    )));
    assert_eq!(game.commands(U0).unwrap()[0].score_time, Some(10.0));
    assert_eq!(game.surviving_owner(U0, 10.0).unwrap(), Some(P0));
    assert_eq!(game.surviving_owner(U0, 5.0).unwrap(), None);
}
