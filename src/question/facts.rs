//! Multiple-choice fact questions supplied by a content bank
//!
//! The bank owns the authored records; this module only filters out the
//! malformed ones, avoids recent repeats and shuffles the choices.

use std::fs;
use std::path::Path;

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::GeneratorRules;
use crate::core::error::{QuizError, Result};
use crate::question::distractor::DISTRACTOR_COUNT;
use crate::question::history::RecentKeys;
use crate::question::model::{Choice, ChoiceValue, Question, QuestionMetadata};
use crate::question::QuestionSource;

/// One authored question as stored in a content bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    pub id: u32,
    pub prompt: String,
    pub correct_answer: String,
    pub wrong_answers: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub category: String,
    /// Lowest school level this record is offered at
    #[serde(default = "default_min_level")]
    pub min_level: u8,
}

fn default_min_level() -> u8 {
    1
}

impl FactRecord {
    fn key(&self) -> String {
        format!("fact-{}", self.id)
    }

    /// Distinct wrong answers that differ from the correct one
    fn usable_wrong_answers(&self) -> Vec<&str> {
        let correct = self.correct_answer.trim();
        let mut seen = AHashSet::new();
        self.wrong_answers
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty() && *w != correct)
            .filter(|w| seen.insert(*w))
            .collect()
    }

    /// Why this record cannot become a question, if it cannot
    pub fn defect(&self) -> Option<String> {
        if self.correct_answer.trim().is_empty() {
            return Some("empty correct answer".into());
        }
        let usable = self.usable_wrong_answers().len();
        if usable < DISTRACTOR_COUNT {
            return Some(format!(
                "{} usable wrong answers, need {}",
                usable, DISTRACTOR_COUNT
            ));
        }
        None
    }
}

/// External source of authored questions
pub trait ContentBank: Send {
    /// Every record offered at `level`
    fn fetch_question_content(&self, level: u8) -> Result<Vec<FactRecord>>;
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    questions: Vec<FactRecord>,
}

/// Content bank held in memory, optionally loaded from TOML
///
/// ```toml
/// [[questions]]
/// id = 1
/// prompt = "What do cows eat?"
/// correct_answer = "Grass"
/// wrong_answers = ["Meat", "Fish", "Eggs"]
/// min_level = 1
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryContentBank {
    records: Vec<FactRecord>,
}

impl MemoryContentBank {
    pub fn new(records: Vec<FactRecord>) -> Self {
        Self { records }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ContentFile = toml::from_str(contents)?;
        Ok(Self::new(file.questions))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ContentBank for MemoryContentBank {
    fn fetch_question_content(&self, level: u8) -> Result<Vec<FactRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.min_level <= level)
            .cloned()
            .collect())
    }
}

pub struct FactGenerator<B: ContentBank> {
    bank: B,
    recent: RecentKeys,
}

impl<B: ContentBank> FactGenerator<B> {
    pub fn new(bank: B, rules: &GeneratorRules) -> Self {
        Self {
            bank,
            recent: RecentKeys::new(rules.recent_window),
        }
    }

    fn format_question(record: &FactRecord, rng: &mut ChaCha8Rng) -> Result<Question> {
        let pool = record.usable_wrong_answers();
        let mut choices = vec![Choice::correct(ChoiceValue::Text(
            record.correct_answer.trim().to_string(),
        ))];
        choices.extend(
            pool.choose_multiple(rng, DISTRACTOR_COUNT)
                .map(|w| Choice::wrong(ChoiceValue::Text(w.to_string()))),
        );
        choices.shuffle(rng);

        let choices: [Choice; 4] = choices.try_into().map_err(|_| {
            QuizError::Content(format!("fact {} produced wrong choice count", record.id))
        })?;

        Ok(Question::new(
            record.key(),
            record.prompt.clone(),
            choices,
            QuestionMetadata::Fact {
                id: record.id,
                category: record.category.clone(),
                explanation: record.explanation.clone(),
            },
        ))
    }
}

impl<B: ContentBank> QuestionSource for FactGenerator<B> {
    fn generate(&mut self, level: u8, rng: &mut ChaCha8Rng) -> Result<Question> {
        let usable: Vec<FactRecord> = self
            .bank
            .fetch_question_content(level)?
            .into_iter()
            .filter(|r| match r.defect() {
                Some(defect) => {
                    tracing::warn!(id = r.id, %defect, "Skipping malformed fact record");
                    false
                }
                None => true,
            })
            .collect();

        let mut available: Vec<&FactRecord> = usable
            .iter()
            .filter(|r| !self.recent.contains(&r.key()))
            .collect();

        if available.is_empty() {
            tracing::debug!(level, "Recent window exhausted every fact, clearing");
            self.recent.clear();
            available = usable.iter().collect();
        }

        let record = available.choose(rng).copied().ok_or_else(|| {
            QuizError::Content(format!("no usable fact questions for level {}", level))
        })?;

        self.recent.push(record.key());
        Self::format_question(record, rng)
    }

    fn clear_history(&mut self) {
        self.recent.clear();
    }
}
