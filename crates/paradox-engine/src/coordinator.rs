//! Serialized access to a running match.
//!
//! The coordinator task owns the [`Match`] and applies submissions one at a
//! time in arrival order. After every accepted submission it publishes a
//! fresh snapshot on a `watch` channel, so readers always see the last
//! settled match and never one mid-relaxation.

use std::sync::Arc;

use paradox_core::{Match, MatchError, Submission};
use paradox_types::{CommandRequest, UniverseId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::EngineError;

/// Callback invoked after each settled submission.
///
/// Implementations can use this to forward [`MatchEvent`]s to renderers,
/// scoreboards, or logs. It runs on the coordinator task, before the new
/// snapshot is published.
///
/// [`MatchEvent`]: paradox_types::MatchEvent
pub trait SettleCallback: Send {
    /// Called after a submission settles.
    fn on_settled(&mut self, submission: &Submission, game: &Match);
}

/// A no-op settle callback for testing.
#[cfg(test)]
#[derive(Debug)]
pub struct NoOpCallback;

#[cfg(test)]
impl SettleCallback for NoOpCallback {
    fn on_settled(&mut self, _submission: &Submission, _game: &Match) {}
}

/// A queued submission with its reply channel.
struct Envelope {
    universe: UniverseId,
    request: CommandRequest,
    reply: oneshot::Sender<Result<Submission, MatchError>>,
}

/// Cloneable handle for submitting commands and reading snapshots.
#[derive(Clone)]
pub struct CoordinatorHandle {
    submissions: mpsc::Sender<Envelope>,
    snapshots: watch::Receiver<Arc<Match>>,
}

impl CoordinatorHandle {
    /// Submit a command and wait for it to settle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CoordinatorClosed`] if the coordinator task
    /// has stopped, or [`EngineError::Match`] if the match rejected the
    /// command.
    pub async fn submit(
        &self,
        universe: UniverseId,
        request: CommandRequest,
    ) -> Result<Submission, EngineError> {
        let (reply, response) = oneshot::channel();
        self.submissions
            .send(Envelope {
                universe,
                request,
                reply,
            })
            .await
            .map_err(|_closed| EngineError::CoordinatorClosed)?;
        let result = response
            .await
            .map_err(|_closed| EngineError::CoordinatorClosed)?;
        Ok(result?)
    }

    /// The last settled match.
    pub fn latest(&self) -> Arc<Match> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// A receiver notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Match>> {
        self.snapshots.clone()
    }
}

/// Start the coordinator task.
///
/// The task runs until every [`CoordinatorHandle`] is dropped, then
/// returns the final match together with the callback.
pub fn spawn<C>(
    game: Match,
    capacity: usize,
    mut callback: C,
) -> (CoordinatorHandle, JoinHandle<(Match, C)>)
where
    C: SettleCallback + 'static,
{
    let (submissions, mut inbox) = mpsc::channel::<Envelope>(capacity.max(1));
    let (publisher, snapshots) = watch::channel(Arc::new(game.clone()));

    let task = tokio::spawn(async move {
        let mut game = game;
        let mut accepted: u64 = 0;
        while let Some(envelope) = inbox.recv().await {
            let result = game.submit_command(envelope.universe, envelope.request);
            if let Ok(submission) = &result {
                accepted = accepted.saturating_add(1);
                callback.on_settled(submission, &game);
                publisher.send_replace(Arc::new(game.clone()));
                debug!(
                    universe = %envelope.universe,
                    rounds = submission.rounds,
                    events = submission.events.len(),
                    "Snapshot published"
                );
            }
            // The submitter may have stopped waiting.
            let _ = envelope.reply.send(result);
        }
        info!(accepted, "Coordinator stopped");
        (game, callback)
    });

    (
        CoordinatorHandle {
            submissions,
            snapshots,
        },
        task,
    )
}
