//! Game rules and match configuration with documented constants
//!
//! All tunable numbers are collected here. Rules are plain data: they can be
//! loaded from TOML and are validated once at match start, never consulted
//! through global state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{QuizError, Result};
use crate::core::types::{Millis, MatchMode};
use crate::opponent::profile::{DifficultyProfile, DifficultyTier};
use crate::question::distractor::MIN_ANSWER_UPPER_BOUND;

/// Longest round time limit or inter-round delay a match accepts (one hour)
pub const MAX_TIMER_MS: Millis = 60 * 60 * 1000;

/// Damage constants for the damage model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageRules {
    /// Damage dealt by a correct answer slower than the fast threshold
    pub base_damage: u32,

    /// Extra damage on top of `base_damage` for a fast answer
    pub fast_bonus: u32,

    /// Flat damage for a critical answer (replaces base + bonus)
    pub critical_damage: u32,

    /// Correct answers strictly below this are critical
    pub critical_threshold_ms: Millis,

    /// Correct answers strictly below this (and not critical) are fast
    ///
    /// Must be greater than `critical_threshold_ms`, otherwise the fast tier
    /// can never be reached.
    pub fast_threshold_ms: Millis,
}

impl Default for DamageRules {
    fn default() -> Self {
        Self {
            base_damage: 15,
            fast_bonus: 10,
            critical_damage: 25,
            critical_threshold_ms: 2000,
            fast_threshold_ms: 3000,
        }
    }
}

/// Question generator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorRules {
    /// How many recently issued question keys are excluded from generation
    pub recent_window: usize,

    /// Wrong answers must be strictly below this value
    ///
    /// Keeps distractors such as "double the product" from looking absurd.
    pub answer_upper_bound: u32,
}

impl Default for GeneratorRules {
    fn default() -> Self {
        Self {
            recent_window: 10,
            answer_upper_bound: 200,
        }
    }
}

/// Simulated opponent tuning, one profile per tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentRules {
    /// No simulated answer arrives sooner than this
    pub min_response_ms: Millis,
    pub low: DifficultyProfile,
    pub mid: DifficultyProfile,
    pub high: DifficultyProfile,
}

impl Default for OpponentRules {
    fn default() -> Self {
        Self {
            min_response_ms: 500,
            low: DifficultyProfile::default_for(DifficultyTier::Low),
            mid: DifficultyProfile::default_for(DifficultyTier::Mid),
            high: DifficultyProfile::default_for(DifficultyTier::High),
        }
    }
}

impl OpponentRules {
    /// Profile record for a tier
    pub fn profile(&self, tier: DifficultyTier) -> &DifficultyProfile {
        match tier {
            DifficultyTier::Low => &self.low,
            DifficultyTier::Mid => &self.mid,
            DifficultyTier::High => &self.high,
        }
    }
}

/// Thresholds for stepping the opponent tier between matches
///
/// Applied to cumulative per-match stats without hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveRules {
    pub enabled: bool,

    /// Accuracy strictly above this (with a fast average) steps the tier up
    pub step_up_accuracy: f64,

    /// Average response strictly below this (with high accuracy) steps up
    pub step_up_max_avg_ms: f64,

    /// Accuracy strictly below this (with a slow average) steps the tier down
    pub step_down_accuracy: f64,

    /// Average response strictly above this (with low accuracy) steps down
    pub step_down_min_avg_ms: f64,
}

impl Default for AdaptiveRules {
    fn default() -> Self {
        Self {
            enabled: true,
            step_up_accuracy: 0.9,
            step_up_max_avg_ms: 2000.0,
            step_down_accuracy: 0.5,
            step_down_min_avg_ms: 4000.0,
        }
    }
}

/// Complete rule set for a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Starting (and maximum) HP for both sides
    pub max_hp: u32,
    pub damage: DamageRules,
    pub generator: GeneratorRules,
    pub opponent: OpponentRules,
    pub adaptive: AdaptiveRules,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_hp: 100,
            damage: DamageRules::default(),
            generator: GeneratorRules::default(),
            opponent: OpponentRules::default(),
            adaptive: AdaptiveRules::default(),
        }
    }
}

impl GameRules {
    /// Create rules with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from a TOML file; missing tables keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let rules: GameRules = toml::from_str(&contents)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Validate rules for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_hp == 0 {
            return Err(invalid("max_hp must be positive"));
        }

        if self.damage.critical_threshold_ms >= self.damage.fast_threshold_ms {
            return Err(invalid(format!(
                "critical_threshold_ms ({}) should be < fast_threshold_ms ({})",
                self.damage.critical_threshold_ms, self.damage.fast_threshold_ms
            )));
        }

        if self.generator.answer_upper_bound < MIN_ANSWER_UPPER_BOUND {
            return Err(invalid(format!(
                "answer_upper_bound ({}) should be >= {} to leave room for distractors at every level",
                self.generator.answer_upper_bound, MIN_ANSWER_UPPER_BOUND
            )));
        }

        for tier in DifficultyTier::ALL {
            self.opponent
                .profile(tier)
                .validate()
                .map_err(|e| invalid(format!("{:?} profile: {}", tier, e)))?;
        }

        if self.adaptive.step_down_accuracy > self.adaptive.step_up_accuracy {
            return Err(invalid(format!(
                "step_down_accuracy ({}) should be <= step_up_accuracy ({})",
                self.adaptive.step_down_accuracy, self.adaptive.step_up_accuracy
            )));
        }

        Ok(())
    }
}

/// Per-match settings supplied by the caller of `start_match`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// School level 1-6; selects operand ranges and fact pools
    pub level: u8,

    /// Opponent profile used in vs-opponent mode
    pub difficulty_tier: DifficultyTier,

    /// Maximum number of questions before the match is decided on HP
    pub round_limit: u32,

    /// Time each side has to answer a question
    pub round_time_limit_ms: Millis,

    pub mode: MatchMode,

    /// Pause between a resolved round and the next question
    pub inter_round_delay_ms: Millis,

    /// Seed for question and opponent RNG; drawn from entropy when absent
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            level: 1,
            difficulty_tier: DifficultyTier::Mid,
            round_limit: 10,
            round_time_limit_ms: 10_000,
            mode: MatchMode::VsOpponent,
            inter_round_delay_ms: 5_000,
            seed: None,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.level == 0 {
            return Err(invalid("level must be at least 1"));
        }
        if self.round_limit == 0 {
            return Err(invalid("round_limit must be at least 1"));
        }
        if self.round_time_limit_ms == 0 {
            return Err(invalid("round_time_limit_ms must be positive"));
        }
        if self.round_time_limit_ms > MAX_TIMER_MS || self.inter_round_delay_ms > MAX_TIMER_MS {
            return Err(invalid(format!(
                "round_time_limit_ms and inter_round_delay_ms must not exceed {} ms",
                MAX_TIMER_MS
            )));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> QuizError {
    QuizError::InvalidConfig(message.into())
}
