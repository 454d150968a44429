//! Per-answer performance rating shown after each round

use serde::Serialize;

use crate::battle::answer::AnswerResult;
use crate::core::config::DamageRules;
use crate::core::types::Millis;

const GOOD_MS: Millis = 5000;
const FAIR_MS: Millis = 7000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundRating {
    pub stars: u8,
    pub grade: char,
    pub message: &'static str,
}

/// Grade an answer: S and A follow the critical and fast damage thresholds
pub fn rate_answer(rules: &DamageRules, result: &AnswerResult) -> RoundRating {
    if !result.is_correct {
        return RoundRating { stars: 0, grade: 'F', message: "Try again!" };
    }

    let ms = result.response_time_ms;
    if ms < rules.critical_threshold_ms {
        RoundRating { stars: 5, grade: 'S', message: "Perfect!" }
    } else if ms < rules.fast_threshold_ms {
        RoundRating { stars: 4, grade: 'A', message: "Excellent!" }
    } else if ms < GOOD_MS {
        RoundRating { stars: 3, grade: 'B', message: "Good!" }
    } else if ms < FAIR_MS {
        RoundRating { stars: 2, grade: 'C', message: "Fair" }
    } else {
        RoundRating { stars: 1, grade: 'D', message: "Could be faster!" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::model::ChoiceValue;

    fn correct_in(ms: Millis) -> AnswerResult {
        AnswerResult::answered(ChoiceValue::Number(12), true, ms)
    }

    #[test]
    fn test_grades_by_speed() {
        let rules = DamageRules::default();
        let grades: Vec<char> = [1500, 2500, 4000, 6000, 9000]
            .into_iter()
            .map(|ms| rate_answer(&rules, &correct_in(ms)).grade)
            .collect();
        assert_eq!(grades, vec!['S', 'A', 'B', 'C', 'D']);
    }

    #[test]
    fn test_wrong_answer_gets_no_stars() {
        let rating = rate_answer(&DamageRules::default(), &AnswerResult::no_answer(10_000));
        assert_eq!(rating.stars, 0);
        assert_eq!(rating.grade, 'F');
    }
}
