//! Notifications emitted by the simulation core after a relaxation settles.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{CommandId, PlayerId, UniverseId};
use crate::structs::FlagEvent;

/// Something observers (renderer, scoreboard, win polling) need to react to.
///
/// Events are only produced from settled histories, never from an
/// intermediate relaxation round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum MatchEvent {
    /// A universe's history changed from `earliest` onward.
    HistoryChanged {
        /// The universe whose key states changed.
        universe: UniverseId,
        /// Earliest affected time; everything before it is unchanged.
        earliest: f64,
    },
    /// A player planted a flag for the first time.
    FlagSet(FlagEvent),
    /// A command's conquest of a player-held planet earned its point.
    ScorePoint {
        /// Player credited with the point.
        player: PlayerId,
        /// Universe the scoring command was issued in.
        universe: UniverseId,
        /// The scoring command.
        command: CommandId,
        /// Time of the conquest.
        time: f64,
    },
    /// A player reached the flag threshold.
    Victory {
        /// The winning player.
        player: PlayerId,
    },
}
