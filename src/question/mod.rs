//! Question generation
//!
//! Two sources share the `QuestionSource` seam: multiplication questions
//! synthesized per level, and fact questions drawn from an external content
//! bank. Both avoid recently issued keys and shuffle the four choices.

pub mod arithmetic;
pub mod distractor;
pub mod facts;
pub mod history;
pub mod model;

pub use arithmetic::{operand_range, ArithmeticGenerator};
pub use facts::{ContentBank, FactGenerator, FactRecord, MemoryContentBank};
pub use history::RecentKeys;
pub use model::{Choice, ChoiceValue, Operation, Question, QuestionMetadata, CHOICE_COUNT};

use rand_chacha::ChaCha8Rng;

use crate::core::error::Result;

/// Anything that can issue questions for a level
pub trait QuestionSource: Send {
    /// Produce a fresh question; `QuizError::Content` when none can be built
    fn generate(&mut self, level: u8, rng: &mut ChaCha8Rng) -> Result<Question>;

    /// Forget the recent-key window
    fn clear_history(&mut self);
}
