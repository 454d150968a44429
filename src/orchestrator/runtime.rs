//! Real-time match driver
//!
//! `spawn_match` moves a `RoundOrchestrator` onto its own tokio task. Player
//! input reaches it through a command channel, timers through the
//! `TokioScheduler` channel, and every `MatchUpdate` is broadcast to
//! subscribers. The task owns the orchestrator, so nothing is shared.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::config::MatchConfig;
use crate::core::error::{QuizError, Result};
use crate::core::types::Side;
use crate::orchestrator::round::{MatchContext, RoundOrchestrator};
use crate::orchestrator::scheduler::{FiredTimer, TokioScheduler};
use crate::orchestrator::state::{MatchSnapshot, MatchUpdate};
use crate::orchestrator::stats::MatchStats;

const COMMAND_BUFFER: usize = 32;
const UPDATE_BUFFER: usize = 64;

#[derive(Debug)]
enum MatchCommand {
    Submit {
        side: Side,
        choice_index: usize,
        reply: oneshot::Sender<bool>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Resume {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<MatchSnapshot>,
    },
    Abandon,
}

/// Caller's side of a running match
pub struct MatchHandle {
    commands: mpsc::Sender<MatchCommand>,
    updates: broadcast::Sender<MatchUpdate>,
    task: JoinHandle<Result<MatchStats>>,
}

/// Start a match on its own task
///
/// Must be called from within a tokio runtime. The receiver returned alongside
/// the handle sees every update, including the first question.
pub fn spawn_match(
    config: MatchConfig,
    ctx: MatchContext,
) -> Result<(MatchHandle, broadcast::Receiver<MatchUpdate>)> {
    let (timer_tx, timer_rx) = mpsc::unbounded_channel();
    let orchestrator = RoundOrchestrator::start_match(config, ctx, TokioScheduler::new(timer_tx))?;

    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (update_tx, update_rx) = broadcast::channel(UPDATE_BUFFER);

    let task = tokio::spawn(drive(orchestrator, command_rx, timer_rx, update_tx.clone()));

    Ok((
        MatchHandle {
            commands: command_tx,
            updates: update_tx,
            task,
        },
        update_rx,
    ))
}

impl MatchHandle {
    /// Another receiver for updates produced from now on
    pub fn subscribe(&self) -> broadcast::Receiver<MatchUpdate> {
        self.updates.subscribe()
    }

    /// Whether the answer was accepted
    pub async fn submit_answer(&self, side: Side, choice_index: usize) -> Result<bool> {
        self.request(|reply| MatchCommand::Submit {
            side,
            choice_index,
            reply,
        })
        .await
    }

    pub async fn pause(&self) -> Result<bool> {
        self.request(|reply| MatchCommand::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<bool> {
        self.request(|reply| MatchCommand::Resume { reply }).await
    }

    pub async fn state(&self) -> Result<MatchSnapshot> {
        self.request(|reply| MatchCommand::Snapshot { reply }).await
    }

    /// End the match without a winner; no-op once it is over
    pub async fn abandon(&self) {
        if self.commands.send(MatchCommand::Abandon).await.is_err() {
            tracing::debug!("Abandon sent to a finished match");
        }
    }

    /// Wait for the match to end
    pub async fn finished(self) -> Result<MatchStats> {
        self.task.await.map_err(|e| {
            tracing::error!(error = %e, "Match task failed");
            QuizError::MatchClosed
        })?
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> MatchCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| QuizError::MatchClosed)?;
        response.await.map_err(|_| QuizError::MatchClosed)
    }
}

async fn drive(
    mut orchestrator: RoundOrchestrator<TokioScheduler>,
    mut commands: mpsc::Receiver<MatchCommand>,
    mut timers: mpsc::UnboundedReceiver<FiredTimer>,
    updates: broadcast::Sender<MatchUpdate>,
) -> Result<MatchStats> {
    loop {
        publish(&mut orchestrator, &updates);
        if let Some(stats) = orchestrator.final_stats() {
            return Ok(stats.clone());
        }

        tokio::select! {
            Some((handle, event)) = timers.recv() => {
                if let Err(e) = orchestrator.handle_timer(handle, event) {
                    publish(&mut orchestrator, &updates);
                    return Err(e);
                }
            }
            command = commands.recv() => match command {
                Some(MatchCommand::Submit { side, choice_index, reply }) => {
                    let _ = reply.send(orchestrator.submit_answer(side, choice_index));
                }
                Some(MatchCommand::Pause { reply }) => {
                    let _ = reply.send(orchestrator.pause());
                }
                Some(MatchCommand::Resume { reply }) => {
                    let _ = reply.send(orchestrator.resume());
                }
                Some(MatchCommand::Snapshot { reply }) => {
                    let _ = reply.send(orchestrator.state());
                }
                Some(MatchCommand::Abandon) => orchestrator.abandon(),
                None => {
                    tracing::debug!("Match handle dropped, abandoning");
                    orchestrator.abandon();
                }
            },
        }
    }
}

fn publish(orchestrator: &mut RoundOrchestrator<TokioScheduler>, updates: &broadcast::Sender<MatchUpdate>) {
    for update in orchestrator.take_updates() {
        // No subscribers is fine
        let _ = updates.send(update);
    }
}
