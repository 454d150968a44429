//! How the simulated opponent gets things wrong
//!
//! A wrong answer is always one of the question's wrong choices. The pattern
//! only decides which one: a near miss, the sum instead of the product, the
//! value closest to the correct one, or any of them.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::opponent::profile::DifficultyTier;
use crate::question::distractor::{common_confusion, near_misses};
use crate::question::model::{ChoiceValue, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MistakePattern {
    /// One operand off by one
    NearMiss,
    /// Added instead of multiplied
    CommonConfusion,
    /// Closest wrong value to the correct one
    CloseToCorrect,
    /// Any wrong choice
    Random,
}

impl MistakePattern {
    /// Patterns a tier draws from; only the low tier guesses blindly
    pub fn allowed_for(tier: DifficultyTier) -> &'static [MistakePattern] {
        match tier {
            DifficultyTier::Low => &[
                MistakePattern::NearMiss,
                MistakePattern::CommonConfusion,
                MistakePattern::CloseToCorrect,
                MistakePattern::Random,
            ],
            DifficultyTier::Mid | DifficultyTier::High => &[
                MistakePattern::NearMiss,
                MistakePattern::CommonConfusion,
                MistakePattern::CloseToCorrect,
            ],
        }
    }

    /// Uniformly pick one of the tier's patterns
    pub fn pick(tier: DifficultyTier, rng: &mut ChaCha8Rng) -> MistakePattern {
        Self::allowed_for(tier)
            .choose(rng)
            .copied()
            .unwrap_or(MistakePattern::Random)
    }
}

/// The wrong choice `pattern` leads to
///
/// Patterns that find no matching choice, or that need operands the question
/// does not have, fall back to a random wrong choice. Returns `None` only for
/// a question without wrong choices.
pub fn wrong_answer_for(
    pattern: MistakePattern,
    question: &Question,
    rng: &mut ChaCha8Rng,
) -> Option<ChoiceValue> {
    let wrong: Vec<&ChoiceValue> = question.wrong_choices().map(|c| &c.value).collect();

    let targeted = match (pattern, question.operands()) {
        (MistakePattern::NearMiss, Some((left, right))) => near_misses(left, right, &(1..=u32::MAX))
            .into_iter()
            .map(ChoiceValue::Number)
            .find(|value| wrong.contains(&value)),
        (MistakePattern::CommonConfusion, Some((left, right))) => {
            let sum = ChoiceValue::Number(common_confusion(left, right));
            wrong.contains(&&sum).then_some(sum)
        }
        (MistakePattern::CloseToCorrect, _) => closest_to_correct(question, &wrong),
        _ => None,
    };

    targeted.or_else(|| wrong.choose(rng).map(|value| (*value).clone()))
}

/// Numeric wrong choice nearest the answer; the first listed wins a tie
fn closest_to_correct(question: &Question, wrong: &[&ChoiceValue]) -> Option<ChoiceValue> {
    let correct = question.correct_value().as_number()?;
    wrong
        .iter()
        .filter_map(|value| value.as_number())
        .min_by_key(|&n| n.abs_diff(correct))
        .map(ChoiceValue::Number)
}
