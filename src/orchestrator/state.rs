//! Match state machine types and what the orchestrator reports outward

use serde::{Deserialize, Serialize};

use crate::battle::resolver::RoundOutcome;
use crate::core::types::{MatchId, MatchMode, Millis, RoundNumber, Side, Winner};
use crate::orchestrator::stats::MatchStats;
use crate::question::model::Question;

/// Phase of a match
///
/// INIT → QUESTION → WAITING_ANSWER → ATTACK → (QUESTION | GAME_OVER).
/// GAME_OVER is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchState {
    Init,
    Question,
    WaitingAnswer,
    Attack,
    GameOver,
}

impl MatchState {
    pub fn is_over(&self) -> bool {
        matches!(self, MatchState::GameOver)
    }
}

/// Why a match reached GAME_OVER
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// A side's HP hit zero
    Knockout,
    /// The last allowed round was played; decided on remaining HP
    RoundLimit,
    /// No question could be produced
    ContentUnavailable,
    /// Stopped by the caller
    Abandoned,
}

/// Notifications for renderers, drained with `take_updates`
#[derive(Debug, Clone, Serialize)]
pub enum MatchUpdate {
    QuestionIssued {
        round: RoundNumber,
        question: Question,
        time_limit_ms: Millis,
    },
    /// A side's answer was recorded for the current round
    AnswerAccepted {
        round: RoundNumber,
        side: Side,
        is_correct: bool,
        response_time_ms: Millis,
    },
    RoundResolved(RoundOutcome),
    MatchEnded(MatchStats),
}

/// Read-only view of a match
#[derive(Debug, Clone, Serialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub mode: MatchMode,
    pub state: MatchState,
    pub paused: bool,
    pub round: RoundNumber,
    pub round_limit: u32,
    pub max_hp: u32,
    pub hp_one: u32,
    pub hp_two: u32,
    pub question: Option<Question>,
    /// Whether each side has answered the current question
    pub answered: [bool; 2],
    pub last_outcome: Option<RoundOutcome>,
    pub winner: Winner,
    pub end_reason: Option<EndReason>,
    pub now_ms: Millis,
}

impl MatchSnapshot {
    pub fn hp(&self, side: Side) -> u32 {
        match side {
            Side::One => self.hp_one,
            Side::Two => self.hp_two,
        }
    }
}
