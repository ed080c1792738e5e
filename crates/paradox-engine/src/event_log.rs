//! Settle callback that writes match notifications to the log.
//!
//! Every [`MatchEvent`] produced by a settled submission becomes one
//! structured tracing line. The callback also keeps running totals that
//! `main` reports at shutdown, once the coordinator hands it back.

use paradox_core::{Match, Submission};
use paradox_types::MatchEvent;
use tracing::{debug, info};

use crate::coordinator::SettleCallback;

/// Running totals of logged notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTotals {
    /// Submissions that settled.
    pub submissions: u64,
    /// Ghost commands among them.
    pub ghosts: u64,
    /// `HistoryChanged` notifications.
    pub history_changes: u64,
    /// `FlagSet` notifications.
    pub flags: u64,
    /// `ScorePoint` notifications.
    pub points: u64,
}

/// Callback that logs every match notification.
#[derive(Debug, Default)]
pub struct EventLogCallback {
    totals: EventTotals,
}

impl EventLogCallback {
    /// Create a callback with zeroed totals.
    pub const fn new() -> Self {
        Self {
            totals: EventTotals {
                submissions: 0,
                ghosts: 0,
                history_changes: 0,
                flags: 0,
                points: 0,
            },
        }
    }

    /// Totals seen so far.
    pub const fn totals(&self) -> EventTotals {
        self.totals
    }

    fn record(&mut self, event: &MatchEvent) {
        match event {
            MatchEvent::HistoryChanged { universe, earliest } => {
                self.totals.history_changes = self.totals.history_changes.saturating_add(1);
                debug!(universe = %universe, earliest, "History changed");
            }
            MatchEvent::FlagSet(flag) => {
                self.totals.flags = self.totals.flags.saturating_add(1);
                info!(
                    player = %flag.player,
                    universe = %flag.universe,
                    planet = %flag.planet,
                    time = flag.time,
                    "Flag planted"
                );
            }
            MatchEvent::ScorePoint {
                player,
                universe,
                command,
                time,
            } => {
                self.totals.points = self.totals.points.saturating_add(1);
                info!(
                    player = %player,
                    universe = %universe,
                    command = %command,
                    time,
                    "Conquest point scored"
                );
            }
            MatchEvent::Victory { player } => {
                info!(player = %player, "Victory");
            }
        }
    }
}

impl SettleCallback for EventLogCallback {
    fn on_settled(&mut self, submission: &Submission, game: &Match) {
        self.totals.submissions = self.totals.submissions.saturating_add(1);
        if !submission.command.valid {
            self.totals.ghosts = self.totals.ghosts.saturating_add(1);
        }
        info!(
            command = %submission.command.id,
            player = %submission.command.player,
            source = %submission.command.source_planet,
            target = %submission.command.target_planet,
            time = submission.command.time,
            valid = submission.command.valid,
            rounds = submission.rounds,
            "Command settled"
        );
        for event in &submission.events {
            self.record(event);
        }
        if let Some(winner) = game.winner() {
            debug!(winner = %winner, "Match already decided");
        }
    }
}
