//! Command script for a headless match run.
//!
//! The engine has no interactive surface; it plays a fixed list of
//! commands read from the `script` section of `paradox-config.yaml`.
//! Without one, a demo script over the starting world is used.

use std::path::Path;

use paradox_types::{CommandRequest, PlanetId, PlayerId, UniverseId};
use paradox_world::StartingPlanetIds;
use serde::Deserialize;

use crate::error::EngineError;

/// One scripted command, addressed to a universe.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScriptedCommand {
    /// Universe the command is issued in.
    pub universe: UniverseId,
    /// Launch time.
    pub time: f64,
    /// Issuing player.
    pub player: PlayerId,
    /// Planet the ships leave from.
    pub source: PlanetId,
    /// Planet the ships are sent to.
    pub target: PlanetId,
}

impl ScriptedCommand {
    /// The request submitted to the match.
    pub const fn request(&self) -> CommandRequest {
        CommandRequest {
            time: self.time,
            player: self.player,
            source_planet: self.source,
            target_planet: self.target,
        }
    }
}

/// Load the command script from the `script` key of `path`.
///
/// Falls back to [`demo_script`] if the file does not exist or has no
/// `script` key.
///
/// # Errors
///
/// Returns [`EngineError::Script`] if the file exists but cannot be read
/// or the `script` section does not parse.
pub fn load_script(path: &Path, ids: &StartingPlanetIds) -> Result<Vec<ScriptedCommand>, EngineError> {
    if !path.exists() {
        return Ok(demo_script(ids));
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Script {
        message: format!("failed to read config file: {e}"),
    })?;
    parse_script(&contents, ids)
}

/// Parse the `script` section out of a full config document.
///
/// # Errors
///
/// Returns [`EngineError::Script`] if the YAML or the section is malformed.
pub fn parse_script(yaml: &str, ids: &StartingPlanetIds) -> Result<Vec<ScriptedCommand>, EngineError> {
    let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| EngineError::Script {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("script") {
        Some(value) => serde_yml::from_value(value.clone()).map_err(|e| EngineError::Script {
            message: format!("failed to parse script: {e}"),
        }),
        None => Ok(demo_script(ids)),
    }
}

/// A short opening over the starting world.
///
/// Both players expand to their outposts in universe 0, player 0 pushes
/// through the same-universe wormhole, and a later command in universe 1
/// sends ships back through the crossing wormhole.
pub fn demo_script(ids: &StartingPlanetIds) -> Vec<ScriptedCommand> {
    const P0: PlayerId = PlayerId::new(0);
    const P1: PlayerId = PlayerId::new(1);
    const U0: UniverseId = UniverseId::new(0);
    const U1: UniverseId = UniverseId::new(1);

    let step = |universe, time, player, source, target| ScriptedCommand {
        universe,
        time,
        player,
        source,
        target,
    };
    vec![
        step(U0, 0.0, P0, ids.west_home, ids.west_outpost),
        step(U0, 0.0, P1, ids.east_home, ids.east_outpost),
        step(U0, 8.0, P0, ids.west_home, ids.west_gate),
        step(U1, 0.0, P0, ids.east_home, ids.east_gate),
        step(U1, 3.0, P1, ids.west_home, ids.west_outpost),
        step(U0, 31.0, P0, ids.west_gate, ids.south_core),
        step(U1, 41.0, P0, ids.east_gate, ids.west_outpost),
        step(U0, 50.0, P0, ids.west_outpost, ids.north_core),
        step(U1, 60.0, P1, ids.west_home, ids.west_gate),
    ]
}
