//! Running whole matches on the simulated clock
//!
//! Human sides are stood in for by `ScriptedPlayer`s that answer after a fixed
//! delay with a fixed accuracy. Used for balancing runs and scenario tests.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::error::{QuizError, Result};
use crate::core::types::{Millis, Side};
use crate::orchestrator::round::RoundOrchestrator;
use crate::orchestrator::scheduler::SimulatedClock;
use crate::orchestrator::state::MatchState;
use crate::orchestrator::stats::MatchStats;
use crate::question::model::{Question, CHOICE_COUNT};

/// Stand-in for a human player
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    accuracy: f64,
    response_ms: Millis,
    rng: ChaCha8Rng,
}

impl ScriptedPlayer {
    pub fn new(accuracy: f64, response_ms: Millis, seed: u64) -> Self {
        Self {
            accuracy: accuracy.clamp(0.0, 1.0),
            response_ms,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Always right, always after `response_ms`
    pub fn perfect(response_ms: Millis) -> Self {
        Self::new(1.0, response_ms, 0)
    }

    pub fn response_ms(&self) -> Millis {
        self.response_ms
    }

    /// Index of the choice this player clicks
    pub fn pick(&mut self, question: &Question) -> usize {
        let correct = question.correct_index();
        if self.rng.gen_bool(self.accuracy) {
            return correct;
        }
        let wrong: Vec<usize> = (0..CHOICE_COUNT).filter(|&i| i != correct).collect();
        wrong.choose(&mut self.rng).copied().unwrap_or(correct)
    }
}

/// Play `orchestrator` to GAME_OVER
///
/// `side_two` is only consulted in two-player matches. Fails if the match
/// stops making progress (paused with nothing scheduled) or if a question
/// cannot be produced.
pub fn run_to_completion(
    orchestrator: &mut RoundOrchestrator<SimulatedClock>,
    side_one: &mut ScriptedPlayer,
    mut side_two: Option<&mut ScriptedPlayer>,
) -> Result<MatchStats> {
    loop {
        if let Some(stats) = orchestrator.final_stats() {
            return Ok(stats.clone());
        }

        // Earliest scripted answer still owed this round
        let mut next_answer: Option<(Millis, Side)> = None;
        if orchestrator.current_state() == MatchState::WaitingAnswer && !orchestrator.is_paused() {
            let shown_at = orchestrator.question_shown_at();
            let candidates = [
                Some((Side::One, side_one.response_ms())),
                side_two.as_ref().map(|p| (Side::Two, p.response_ms())),
            ];
            for (side, delay) in candidates.into_iter().flatten() {
                if orchestrator.has_answered(side) {
                    continue;
                }
                let at = shown_at.saturating_add(delay);
                if next_answer.map_or(true, |(best, _)| at < best) {
                    next_answer = Some((at, side));
                }
            }
        }

        match (next_answer, orchestrator.next_deadline()) {
            (Some((at, side)), deadline) if deadline.map_or(true, |d| at < d) => {
                orchestrator.advance_to(at)?;
                let Some(question) = orchestrator.current_question() else {
                    continue;
                };
                let pick = match side {
                    Side::One => side_one.pick(question),
                    Side::Two => match side_two.as_deref_mut() {
                        Some(player) => player.pick(question),
                        None => continue,
                    },
                };
                if !orchestrator.submit_answer(side, pick) {
                    // Only the simulated side two can refuse; stop trying this round
                    if side == Side::Two {
                        side_two = None;
                    }
                }
            }
            (_, Some(deadline)) => orchestrator.advance_to(deadline)?,
            (_, None) => {
                return Err(QuizError::Stalled(format!(
                    "round {} in {:?} with nothing scheduled",
                    orchestrator.round(),
                    orchestrator.current_state()
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::model::{Choice, ChoiceValue, Operation, QuestionMetadata};

    fn question() -> Question {
        Question::new(
            "2x3",
            "2 × 3 = ?",
            [
                Choice::wrong(ChoiceValue::Number(5)),
                Choice::wrong(ChoiceValue::Number(8)),
                Choice::correct(ChoiceValue::Number(6)),
                Choice::wrong(ChoiceValue::Number(4)),
            ],
            QuestionMetadata::Arithmetic {
                left: 2,
                right: 3,
                operation: Operation::Multiply,
            },
        )
    }

    #[test]
    fn test_perfect_player_always_correct() {
        let mut player = ScriptedPlayer::perfect(1800);
        for _ in 0..20 {
            assert_eq!(player.pick(&question()), 2);
        }
    }

    #[test]
    fn test_hopeless_player_never_correct() {
        let mut player = ScriptedPlayer::new(0.0, 1800, 4);
        for _ in 0..20 {
            let pick = player.pick(&question());
            assert_ne!(pick, 2);
            assert!(pick < CHOICE_COUNT);
        }
    }
}
