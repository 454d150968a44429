//! Per-side answer tallies and the end-of-match record

use serde::{Deserialize, Serialize};

use crate::battle::answer::AnswerResult;
use crate::battle::session::{BattleSummary, DamageEvent};
use crate::core::types::{MatchId, MatchMode, Millis, Side, Winner};
use crate::opponent::profile::DifficultyTier;
use crate::orchestrator::state::EndReason;

/// Running totals for one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    pub rounds: u32,
    pub correct: u32,
    /// Answered, but wrong
    pub wrong: u32,
    pub unanswered: u32,
    /// Sum over every round; unanswered rounds count at the time limit
    pub total_response_ms: Millis,
    pub fastest_correct_ms: Option<Millis>,
}

impl SideStats {
    pub fn record(&mut self, result: &AnswerResult) {
        self.rounds += 1;
        self.total_response_ms += result.response_time_ms;

        if !result.is_answered() {
            self.unanswered += 1;
        } else if result.is_correct {
            self.correct += 1;
            let fastest = self.fastest_correct_ms.get_or_insert(result.response_time_ms);
            *fastest = (*fastest).min(result.response_time_ms);
        } else {
            self.wrong += 1;
        }
    }

    /// Fraction of rounds answered correctly; 0 before the first round
    pub fn accuracy(&self) -> f64 {
        if self.rounds == 0 {
            return 0.0;
        }
        self.correct as f64 / self.rounds as f64
    }

    pub fn avg_response_ms(&self) -> f64 {
        if self.rounds == 0 {
            return 0.0;
        }
        self.total_response_ms as f64 / self.rounds as f64
    }
}

/// Everything worth keeping about a finished match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub match_id: MatchId,
    pub mode: MatchMode,
    pub level: u8,
    pub seed: u64,
    pub difficulty_tier: DifficultyTier,
    /// Tier recommended for the next match against the simulated opponent
    pub next_tier: DifficultyTier,
    pub winner: Winner,
    pub end_reason: EndReason,
    pub rounds_played: u32,
    pub max_hp: u32,
    pub final_hp_one: u32,
    pub final_hp_two: u32,
    pub side_one: SideStats,
    pub side_two: SideStats,
    pub battle: BattleSummary,
    pub damage_log: Vec<DamageEvent>,
    pub duration_ms: Millis,
}

impl MatchStats {
    pub fn side(&self, side: Side) -> &SideStats {
        match side {
            Side::One => &self.side_one,
            Side::Two => &self.side_two,
        }
    }

    pub fn final_hp(&self, side: Side) -> u32 {
        match side {
            Side::One => self.final_hp_one,
            Side::Two => self.final_hp_two,
        }
    }
}
