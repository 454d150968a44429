//! One side's answer to one question

use serde::{Deserialize, Serialize};

use crate::core::types::Millis;
use crate::question::model::ChoiceValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// `None` when the side never answered
    pub chosen: Option<ChoiceValue>,
    pub is_correct: bool,
    /// Elapsed since the question was shown, clamped to the round limit
    pub response_time_ms: Millis,
}

impl AnswerResult {
    pub fn answered(chosen: ChoiceValue, is_correct: bool, response_time_ms: Millis) -> Self {
        Self {
            chosen: Some(chosen),
            is_correct,
            response_time_ms,
        }
    }

    /// Placeholder for a side that ran out of time
    pub fn no_answer(time_limit_ms: Millis) -> Self {
        Self {
            chosen: None,
            is_correct: false,
            response_time_ms: time_limit_ms,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.chosen.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_answer_is_incorrect_at_limit() {
        let result = AnswerResult::no_answer(10_000);
        assert!(!result.is_answered());
        assert!(!result.is_correct);
        assert_eq!(result.response_time_ms, 10_000);
    }
}
