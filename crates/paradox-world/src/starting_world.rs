//! Default demo map for the Paradox simulation.
//!
//! Eight planets arranged in two mirrored halves around a neutral core,
//! with two home worlds, one same-universe wormhole, and one
//! cross-universe wormhole. Used by the engine binary when no external
//! map generator is wired in.

use paradox_types::{PlanetId, PlayerId};

use crate::error::WorldError;
use crate::planet::Position;
use crate::route::Wormhole;
use crate::topology::{Topology, TopologyBuilder};

/// Identifiers for the starting planets, returned alongside the topology so
/// callers can script commands against known planets.
#[derive(Debug, Clone, Copy)]
pub struct StartingPlanetIds {
    /// Home world of player 0 (in universe 0).
    pub west_home: PlanetId,
    /// Home world of player 1 (in universe 0).
    pub east_home: PlanetId,
    /// Small neutral planet next to the west home.
    pub west_outpost: PlanetId,
    /// Small neutral planet next to the east home.
    pub east_outpost: PlanetId,
    /// Large neutral planet at the north of the core.
    pub north_core: PlanetId,
    /// Large neutral planet at the south of the core.
    pub south_core: PlanetId,
    /// Planet at the west end of the same-universe wormhole.
    pub west_gate: PlanetId,
    /// Planet at the east end of the cross-universe wormhole.
    pub east_gate: PlanetId,
}

/// Build the default eight-planet map.
///
/// # Errors
///
/// Returns [`WorldError`] if the map fails validation, which indicates a
/// bug in this function.
pub fn create_starting_world() -> Result<(Topology, StartingPlanetIds), WorldError> {
    let p0 = Some(PlayerId::new(0));
    let p1 = Some(PlayerId::new(1));

    let mut b = TopologyBuilder::new();
    let west_home = b.add_planet(5.0, Position::new(0.0, 50.0), 20, p0)?;
    let east_home = b.add_planet(5.0, Position::new(100.0, 50.0), 20, p1)?;
    let west_outpost = b.add_planet(2.0, Position::new(20.0, 30.0), 4, None)?;
    let east_outpost = b.add_planet(2.0, Position::new(80.0, 70.0), 4, None)?;
    let north_core = b.add_planet(4.0, Position::new(50.0, 20.0), 12, None)?;
    let south_core = b.add_planet(4.0, Position::new(50.0, 80.0), 12, None)?;
    let west_gate = b.add_planet(3.0, Position::new(25.0, 75.0), 6, None)?;
    let east_gate = b.add_planet(3.0, Position::new(75.0, 25.0), 6, None)?;

    let b = b
        .plain_route(west_home, west_outpost)
        .plain_route(west_home, west_gate)
        .plain_route(east_home, east_outpost)
        .plain_route(east_home, east_gate)
        .plain_route(west_outpost, north_core)
        .plain_route(east_outpost, south_core)
        .plain_route(north_core, east_gate)
        .plain_route(south_core, west_gate)
        .plain_route(north_core, south_core)
        .wormhole_route(
            west_gate,
            south_core,
            Wormhole {
                head_time: 30.0,
                tail_time: 10.0,
                crosses_universe: false,
            },
        )
        .wormhole_route(
            east_gate,
            west_outpost,
            Wormhole {
                head_time: 40.0,
                tail_time: 20.0,
                crosses_universe: true,
            },
        );

    let topology = b.build()?;
    Ok((
        topology,
        StartingPlanetIds {
            west_home,
            east_home,
            west_outpost,
            east_outpost,
            north_core,
            south_core,
            west_gate,
            east_gate,
        },
    ))
}
