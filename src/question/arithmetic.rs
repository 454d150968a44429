//! Multiplication-table questions synthesized from the school level

use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::core::config::GeneratorRules;
use crate::core::error::{QuizError, Result};
use crate::question::distractor::pick_distractors;
use crate::question::history::RecentKeys;
use crate::question::model::{Choice, ChoiceValue, Operation, Question, QuestionMetadata};
use crate::question::QuestionSource;

/// Operand range for a school level
///
/// Levels 1-2 stay within 1-5, 3-4 within 1-10 and 5-6 within 1-12. Any other
/// level uses 1-10.
pub fn operand_range(level: u8) -> RangeInclusive<u32> {
    match level {
        1 | 2 => 1..=5,
        3 | 4 => 1..=10,
        5 | 6 => 1..=12,
        _ => 1..=10,
    }
}

/// Rough difficulty label for a pair of operands
pub fn difficulty_label(left: u32, right: u32) -> &'static str {
    if left <= 5 && right <= 5 {
        "easy"
    } else if left <= 10 && right <= 10 {
        "medium"
    } else {
        "hard"
    }
}

pub struct ArithmeticGenerator {
    rules: GeneratorRules,
    recent: RecentKeys,
}

impl ArithmeticGenerator {
    pub fn new(rules: GeneratorRules) -> Self {
        let recent = RecentKeys::new(rules.recent_window);
        Self { rules, recent }
    }

    fn key(left: u32, right: u32) -> String {
        format!("{}x{}", left, right)
    }

    /// Uniformly pick an operand pair whose key is outside the recent window
    fn pick_operands(&self, range: &RangeInclusive<u32>, rng: &mut ChaCha8Rng) -> Option<(u32, u32)> {
        let candidates: Vec<(u32, u32)> = range
            .clone()
            .flat_map(|l| range.clone().map(move |r| (l, r)))
            .filter(|&(l, r)| !self.recent.contains(&Self::key(l, r)))
            .collect();
        candidates.choose(rng).copied()
    }
}

impl QuestionSource for ArithmeticGenerator {
    fn generate(&mut self, level: u8, rng: &mut ChaCha8Rng) -> Result<Question> {
        let range = operand_range(level);

        let (left, right) = match self.pick_operands(&range, rng) {
            Some(pair) => pair,
            None => {
                tracing::debug!(level, "Recent window exhausted every key, clearing");
                self.recent.clear();
                self.pick_operands(&range, rng).ok_or_else(|| {
                    QuizError::Content(format!("no multiplication questions for level {}", level))
                })?
            }
        };

        let key = Self::key(left, right);
        self.recent.push(key.clone());
        tracing::trace!(level, %key, difficulty = difficulty_label(left, right), "Operands picked");

        let operation = Operation::Multiply;
        let correct = operation.apply(left, right);
        let mut choices = vec![Choice::correct(ChoiceValue::Number(correct))];
        choices.extend(
            pick_distractors(left, right, &range, self.rules.answer_upper_bound, rng)
                .into_iter()
                .map(|v| Choice::wrong(ChoiceValue::Number(v))),
        );
        choices.shuffle(rng);

        let choices: [Choice; 4] = choices
            .try_into()
            .map_err(|_| QuizError::Content("distractor strategy produced wrong choice count".into()))?;

        Ok(Question::new(
            key,
            format!("{} {} {} = ?", left, operation.symbol(), right),
            choices,
            QuestionMetadata::Arithmetic { left, right, operation },
        ))
    }

    fn clear_history(&mut self) {
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;
    use rand::SeedableRng;

    fn generator(window: usize) -> ArithmeticGenerator {
        ArithmeticGenerator::new(GeneratorRules {
            recent_window: window,
            ..GeneratorRules::default()
        })
    }

    #[test]
    fn test_operand_ranges_by_level() {
        assert_eq!(operand_range(1), 1..=5);
        assert_eq!(operand_range(4), 1..=10);
        assert_eq!(operand_range(6), 1..=12);
        assert_eq!(operand_range(9), 1..=10);
    }

    #[test]
    fn test_question_matches_operands() {
        let mut gen = generator(10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let q = gen.generate(3, &mut rng).unwrap();

        let (left, right) = q.operands().unwrap();
        assert!(operand_range(3).contains(&left));
        assert!(operand_range(3).contains(&right));
        assert_eq!(q.correct_value(), &ChoiceValue::Number(left * right));
        assert_eq!(q.key(), format!("{}x{}", left, right));
        assert_eq!(q.prompt(), format!("{} × {} = ?", left, right));
        assert!(matches!(
            q.metadata(),
            QuestionMetadata::Arithmetic {
                operation: Operation::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_no_repeat_within_window() {
        let mut gen = generator(10);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let keys: Vec<String> = (0..11)
            .map(|_| gen.generate(1, &mut rng).unwrap().key().to_string())
            .collect();

        // Every run of 11 consecutive keys is repeat-free with a window of 10
        let unique: AHashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_window_larger_than_key_space_clears_and_continues() {
        // Level 1 has 25 keys; a window of 30 exhausts them
        let mut gen = generator(30);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..60 {
            assert!(gen.generate(1, &mut rng).is_ok());
        }
    }

    #[test]
    fn test_same_seed_same_questions() {
        let mut a = generator(10);
        let mut b = generator(10);
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..5 {
            assert_eq!(a.generate(5, &mut rng_a).unwrap(), b.generate(5, &mut rng_b).unwrap());
        }
    }

    #[test]
    fn test_difficulty_label() {
        assert_eq!(difficulty_label(3, 4), "easy");
        assert_eq!(difficulty_label(7, 4), "medium");
        assert_eq!(difficulty_label(11, 12), "hard");
    }
}
