//! Simulated opponent for single-player matches
//!
//! For each question the opponent decides up front whether it will be right,
//! which value it will pick and how long it takes. The answer is delivered
//! through the scheduler as a timer event tagged with the round number.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::battle::answer::AnswerResult;
use crate::core::config::OpponentRules;
use crate::core::types::{Millis, RoundNumber};
use crate::opponent::mistake::{wrong_answer_for, MistakePattern};
use crate::opponent::profile::{DifficultyProfile, DifficultyTier};
use crate::orchestrator::scheduler::{Scheduler, TimerEvent, TimerHandle, TimerSlot};
use crate::question::model::{ChoiceValue, Question};

/// What the opponent will answer
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentDecision {
    pub chosen: ChoiceValue,
    pub is_correct: bool,
    /// Set when the opponent decided to be wrong
    pub mistake: Option<MistakePattern>,
}

pub struct OpponentSimulator {
    tier: DifficultyTier,
    profile: DifficultyProfile,
    min_response_ms: Millis,
    pending: TimerSlot,
    rng: ChaCha8Rng,
}

impl OpponentSimulator {
    pub fn new(tier: DifficultyTier, rules: &OpponentRules, seed: u64) -> Self {
        Self {
            tier,
            profile: rules.profile(tier).clone(),
            min_response_ms: rules.min_response_ms,
            pending: TimerSlot::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn tier(&self) -> DifficultyTier {
        self.tier
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Correct with the tier's accuracy; otherwise a wrong choice picked by a
    /// mistake pattern
    pub fn decide_outcome(&mut self, question: &Question) -> OpponentDecision {
        if self.rng.gen_bool(self.profile.accuracy.clamp(0.0, 1.0)) {
            return OpponentDecision {
                chosen: question.correct_value().clone(),
                is_correct: true,
                mistake: None,
            };
        }

        let pattern = MistakePattern::pick(self.tier, &mut self.rng);
        match wrong_answer_for(pattern, question, &mut self.rng) {
            Some(chosen) => OpponentDecision {
                is_correct: question.is_correct(&chosen),
                chosen,
                mistake: Some(pattern),
            },
            None => OpponentDecision {
                chosen: question.correct_value().clone(),
                is_correct: true,
                mistake: None,
            },
        }
    }

    /// Base time scaled by a uniform factor in `1 ± variance`, never below the
    /// configured floor
    pub fn response_delay(&mut self) -> Millis {
        let swing = self.rng.gen::<f64>() * 2.0 - 1.0;
        let factor = 1.0 + swing * self.profile.response_variance;
        let delay = (self.profile.base_response_ms as f64 * factor).round().max(0.0) as Millis;
        delay.max(self.min_response_ms)
    }

    /// Decide an answer for `question` and schedule its delivery
    ///
    /// Cancels any response still pending from an earlier question. Returns
    /// the delay used.
    pub fn schedule_response<S: Scheduler + ?Sized>(
        &mut self,
        question: &Question,
        round: RoundNumber,
        scheduler: &mut S,
    ) -> Millis {
        let decision = self.decide_outcome(question);
        let delay = self.response_delay();

        tracing::debug!(
            round,
            tier = %self.tier,
            delay_ms = delay,
            correct = decision.is_correct,
            mistake = ?decision.mistake,
            "Opponent response scheduled"
        );

        let result = AnswerResult::answered(decision.chosen, decision.is_correct, delay);
        self.pending
            .arm(scheduler, delay, TimerEvent::OpponentAnswered { round, result });
        delay
    }

    pub fn cancel<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.pending.cancel(scheduler);
    }

    /// Accept a fired response if it is the one still pending
    pub fn claim(&mut self, handle: TimerHandle) -> bool {
        self.pending.claim(handle)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_armed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::scheduler::SimulatedClock;
    use crate::question::model::{Choice, Operation, QuestionMetadata};

    fn question() -> Question {
        Question::new(
            "4x3",
            "4 × 3 = ?",
            [
                Choice::wrong(ChoiceValue::Number(9)),
                Choice::correct(ChoiceValue::Number(12)),
                Choice::wrong(ChoiceValue::Number(7)),
                Choice::wrong(ChoiceValue::Number(30)),
            ],
            QuestionMetadata::Arithmetic {
                left: 4,
                right: 3,
                operation: Operation::Multiply,
            },
        )
    }

    fn simulator(tier: DifficultyTier, seed: u64) -> OpponentSimulator {
        OpponentSimulator::new(tier, &OpponentRules::default(), seed)
    }

    #[test]
    fn test_delay_stays_within_variance_band() {
        for tier in DifficultyTier::ALL {
            let mut opponent = simulator(tier, 42);
            let profile = opponent.profile().clone();
            let base = profile.base_response_ms as f64;
            let low = (base * (1.0 - profile.response_variance)).floor() as Millis;
            let high = (base * (1.0 + profile.response_variance)).ceil() as Millis;

            for _ in 0..500 {
                let delay = opponent.response_delay();
                assert!(delay >= low.max(500) && delay <= high, "{} out of range for {}", delay, tier);
            }
        }
    }

    #[test]
    fn test_delay_respects_floor() {
        let mut rules = OpponentRules::default();
        rules.min_response_ms = 5000;
        let mut opponent = OpponentSimulator::new(DifficultyTier::High, &rules, 1);
        for _ in 0..100 {
            assert!(opponent.response_delay() >= 5000);
        }
    }

    #[test]
    fn test_perfect_accuracy_always_correct() {
        let mut rules = OpponentRules::default();
        rules.mid.accuracy = 1.0;
        let mut opponent = OpponentSimulator::new(DifficultyTier::Mid, &rules, 9);
        for _ in 0..100 {
            let decision = opponent.decide_outcome(&question());
            assert!(decision.is_correct);
            assert_eq!(decision.chosen, ChoiceValue::Number(12));
        }
    }

    #[test]
    fn test_zero_accuracy_picks_a_listed_wrong_choice() {
        let mut rules = OpponentRules::default();
        rules.low.accuracy = 0.0;
        let mut opponent = OpponentSimulator::new(DifficultyTier::Low, &rules, 9);
        let q = question();
        for _ in 0..100 {
            let decision = opponent.decide_outcome(&q);
            assert!(!decision.is_correct);
            assert!(decision.mistake.is_some());
            assert!(q.wrong_choices().any(|c| c.value == decision.chosen));
        }
    }

    #[test]
    fn test_accuracy_is_roughly_honored() {
        let mut opponent = simulator(DifficultyTier::Mid, 2024);
        let q = question();
        let correct = (0..2000).filter(|_| opponent.decide_outcome(&q).is_correct).count();
        let rate = correct as f64 / 2000.0;
        assert!((rate - 0.80).abs() < 0.05, "observed accuracy {}", rate);
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let mut a = simulator(DifficultyTier::Low, 77);
        let mut b = simulator(DifficultyTier::Low, 77);
        for _ in 0..50 {
            assert_eq!(a.decide_outcome(&question()), b.decide_outcome(&question()));
            assert_eq!(a.response_delay(), b.response_delay());
        }
    }

    #[test]
    fn test_schedule_replaces_pending_response() {
        let mut clock = SimulatedClock::new();
        let mut opponent = simulator(DifficultyTier::Mid, 5);

        opponent.schedule_response(&question(), 1, &mut clock);
        let delay = opponent.schedule_response(&question(), 2, &mut clock);
        assert_eq!(clock.pending(), 1);

        let (handle, event) = clock.pop_due(u64::MAX).unwrap();
        assert!(opponent.claim(handle));
        assert_eq!(clock.now(), delay);
        match event {
            TimerEvent::OpponentAnswered { round, result } => {
                assert_eq!(round, 2);
                assert_eq!(result.response_time_ms, delay);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_cancel_drops_pending_response() {
        let mut clock = SimulatedClock::new();
        let mut opponent = simulator(DifficultyTier::High, 5);

        opponent.schedule_response(&question(), 1, &mut clock);
        assert!(opponent.has_pending());
        opponent.cancel(&mut clock);

        assert!(!opponent.has_pending());
        assert_eq!(clock.pending(), 0);
    }
}
