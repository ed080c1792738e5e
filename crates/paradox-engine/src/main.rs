//! Match engine binary for the Paradox simulation.
//!
//! Wires the starting world, the match, and the coordinator task together
//! and plays a command script through them headlessly.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `paradox-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the starting world (8 planets, 2 wormholes)
//! 4. Create the match and settle its initial history
//! 5. Spawn the coordinator
//! 6. Submit the command script
//! 7. Log the final summary as JSON

mod coordinator;
mod error;
mod event_log;
mod script;

use std::path::Path;

use paradox_core::{Match, MatchConfig};
use paradox_types::{PlayerId, UniverseId};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::event_log::EventLogCallback;

/// Config file read from the working directory.
const CONFIG_PATH: &str = "paradox-config.yaml";

/// Bound on queued submissions.
const SUBMISSION_CAPACITY: usize = 64;

/// Application entry point for the match engine.
///
/// # Errors
///
/// Returns an error if any initialization step or a submission fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so failures surface
    //    through the returned error.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!(
        players = config.rules.player_count,
        universes = config.rules.universe_count,
        horizon = config.timeline.horizon,
        flags_to_win = config.rules.flags_to_win,
        "paradox-engine starting"
    );

    // 3. Create the starting world.
    let (topology, ids) = paradox_world::create_starting_world()?;
    info!(
        planet_count = topology.planet_count(),
        route_count = topology.route_count(),
        first_home = %ids.west_home,
        "Starting world created"
    );

    // 4. Create the match.
    let game = Match::new(config, topology)?;
    info!(universes = game.universe_count(), "Match initialized");

    // 5. Spawn the coordinator.
    let (handle, task) = coordinator::spawn(game, SUBMISSION_CAPACITY, EventLogCallback::new());
    let mut snapshots = handle.subscribe();
    let watcher = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let latest = std::sync::Arc::clone(&snapshots.borrow_and_update());
            debug!(
                p0_flags = latest.flag_count(PlayerId::new(0)),
                p1_flags = latest.flag_count(PlayerId::new(1)),
                winner = ?latest.winner(),
                "Snapshot received"
            );
        }
    });

    // 6. Submit the script.
    let commands = script::load_script(Path::new(CONFIG_PATH), &ids)?;
    info!(commands = commands.len(), "Command script loaded");
    for scripted in &commands {
        match handle.submit(scripted.universe, scripted.request()).await {
            Ok(_) => {}
            Err(EngineError::Match { source }) => {
                warn!(
                    universe = %scripted.universe,
                    time = scripted.time,
                    error = %source,
                    "Scripted command rejected"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    // 7. Shut down and log the result.
    drop(handle);
    let (game, callback) = task.await.map_err(EngineError::from)?;
    watcher.await.map_err(EngineError::from)?;
    let totals = callback.totals();
    info!(
        submissions = totals.submissions,
        ghosts = totals.ghosts,
        history_changes = totals.history_changes,
        flags = totals.flags,
        points = totals.points,
        "Event totals"
    );
    let summary = MatchSummary::from_match(&game)?;
    info!(
        summary = %serde_json::to_string(&summary)?,
        "paradox-engine shutdown complete"
    );

    Ok(())
}

/// Load the match configuration from `paradox-config.yaml`.
///
/// Looks for the config file relative to the current working directory
/// and falls back to defaults if it is missing.
fn load_config() -> Result<MatchConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(MatchConfig::from_file(config_path)?)
    } else {
        Ok(MatchConfig::default())
    }
}

/// End-of-run report.
#[derive(Debug, Serialize)]
struct MatchSummary {
    winner: Option<PlayerId>,
    players: Vec<PlayerSummary>,
    universes: Vec<UniverseSummary>,
}

/// Per-player totals.
#[derive(Debug, Serialize)]
struct PlayerSummary {
    player: PlayerId,
    flags: u32,
    conquest_points: u32,
}

/// Per-universe totals.
#[derive(Debug, Serialize)]
struct UniverseSummary {
    universe: UniverseId,
    commands: usize,
    ghosts: usize,
    turnovers: usize,
    balanced: bool,
}

impl MatchSummary {
    fn from_match(game: &Match) -> Result<Self, EngineError> {
        let players = (0..game.config().rules.player_count)
            .map(PlayerId::new)
            .map(|player| PlayerSummary {
                player,
                flags: game.flag_count(player),
                conquest_points: game.conquest_points(player),
            })
            .collect();

        let mut universes = Vec::with_capacity(game.universe_count());
        for index in 0..game.universe_count() {
            let Some(universe) = UniverseId::from_index(index) else {
                continue;
            };
            universes.push(UniverseSummary {
                universe,
                commands: game.commands(universe)?.len(),
                ghosts: game.invalid_commands(universe)?.len(),
                turnovers: game.turnovers(universe)?.len(),
                balanced: game.audit(universe)?.is_balanced(),
            });
        }

        Ok(Self {
            winner: game.winner(),
            players,
            universes,
        })
    }
}
