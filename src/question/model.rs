//! Question shape consumed by the engine regardless of subject

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of choices shown for every question
pub const CHOICE_COUNT: usize = 4;

/// Value printed on an answer button
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Number(u32),
    Text(String),
}

impl ChoiceValue {
    pub fn as_number(&self) -> Option<u32> {
        match self {
            ChoiceValue::Number(n) => Some(*n),
            ChoiceValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceValue::Number(n) => write!(f, "{}", n),
            ChoiceValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: ChoiceValue,
    pub is_correct: bool,
}

impl Choice {
    pub fn correct(value: ChoiceValue) -> Self {
        Self { value, is_correct: true }
    }

    pub fn wrong(value: ChoiceValue) -> Self {
        Self { value, is_correct: false }
    }
}

/// Arithmetic operation a question asks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Multiply,
}

impl Operation {
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Multiply => "×",
        }
    }

    pub fn apply(self, left: u32, right: u32) -> u32 {
        match self {
            Operation::Multiply => left * right,
        }
    }
}

/// Subject-specific details kept alongside the question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionMetadata {
    Arithmetic {
        left: u32,
        right: u32,
        operation: Operation,
    },
    Fact {
        id: u32,
        category: String,
        explanation: String,
    },
}

/// An issued question
///
/// Immutable once built. Construction panics if the choices break the shape
/// invariants: that is a generator bug, not a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    key: String,
    prompt: String,
    correct_value: ChoiceValue,
    choices: [Choice; CHOICE_COUNT],
    metadata: QuestionMetadata,
}

impl Question {
    /// Build a question from already-shuffled choices
    ///
    /// # Panics
    /// If there is not exactly one correct choice, if two choices share a
    /// value, or if a numeric value is zero.
    pub fn new(
        key: impl Into<String>,
        prompt: impl Into<String>,
        choices: [Choice; CHOICE_COUNT],
        metadata: QuestionMetadata,
    ) -> Self {
        let correct: Vec<&Choice> = choices.iter().filter(|c| c.is_correct).collect();
        assert_eq!(correct.len(), 1, "question must have exactly one correct choice");
        let correct_value = correct[0].value.clone();

        for (i, a) in choices.iter().enumerate() {
            for b in &choices[i + 1..] {
                assert_ne!(a.value, b.value, "question choices must be distinct");
            }
            assert_ne!(
                a.value,
                ChoiceValue::Number(0),
                "numeric choices must be positive"
            );
        }

        Self {
            key: key.into(),
            prompt: prompt.into(),
            correct_value,
            choices,
            metadata,
        }
    }

    /// Identity used to avoid repeats
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn correct_value(&self) -> &ChoiceValue {
        &self.correct_value
    }

    pub fn choices(&self) -> &[Choice; CHOICE_COUNT] {
        &self.choices
    }

    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }

    pub fn metadata(&self) -> &QuestionMetadata {
        &self.metadata
    }

    /// Position of the correct choice after shuffling
    pub fn correct_index(&self) -> usize {
        self.choices
            .iter()
            .position(|c| c.is_correct)
            .unwrap_or_default()
    }

    pub fn is_correct(&self, value: &ChoiceValue) -> bool {
        *value == self.correct_value
    }

    pub fn wrong_choices(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter().filter(|c| !c.is_correct)
    }

    /// Operands for arithmetic questions
    pub fn operands(&self) -> Option<(u32, u32)> {
        match self.metadata {
            QuestionMetadata::Arithmetic { left, right, .. } => Some((left, right)),
            QuestionMetadata::Fact { .. } => None,
        }
    }
}
