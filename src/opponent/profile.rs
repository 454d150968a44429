//! Difficulty tiers and the timing/accuracy profile behind each one

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::types::Millis;

/// Named opponent strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Low,
    #[default]
    Mid,
    High,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 3] = [DifficultyTier::Low, DifficultyTier::Mid, DifficultyTier::High];

    /// One tier harder, clamped at High
    pub fn step_up(self) -> Self {
        match self {
            DifficultyTier::Low => DifficultyTier::Mid,
            DifficultyTier::Mid | DifficultyTier::High => DifficultyTier::High,
        }
    }

    /// One tier easier, clamped at Low
    pub fn step_down(self) -> Self {
        match self {
            DifficultyTier::High => DifficultyTier::Mid,
            DifficultyTier::Mid | DifficultyTier::Low => DifficultyTier::Low,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DifficultyTier::Low => "Novice opponent - slow and error-prone",
            DifficultyTier::Mid => "Standard opponent - moderate speed",
            DifficultyTier::High => "Expert opponent - fast and accurate",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DifficultyTier::Low => "low",
            DifficultyTier::Mid => "mid",
            DifficultyTier::High => "high",
        };
        f.write_str(name)
    }
}

impl FromStr for DifficultyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "easy" => Ok(DifficultyTier::Low),
            "mid" | "medium" => Ok(DifficultyTier::Mid),
            "high" | "hard" => Ok(DifficultyTier::High),
            other => Err(format!("unknown difficulty tier '{}'", other)),
        }
    }
}

/// Timing and accuracy for one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Average time to answer
    pub base_response_ms: Millis,

    /// Response time varies by up to ± this fraction of the base (0.3 = ±30%)
    pub response_variance: f64,

    /// Probability of answering correctly (0.0-1.0)
    pub accuracy: f64,
}

impl DifficultyProfile {
    /// Built-in profile for a tier
    pub fn default_for(tier: DifficultyTier) -> Self {
        match tier {
            DifficultyTier::Low => Self {
                base_response_ms: 4000,
                response_variance: 0.5,
                accuracy: 0.60,
            },
            DifficultyTier::Mid => Self {
                base_response_ms: 2500,
                response_variance: 0.3,
                accuracy: 0.80,
            },
            DifficultyTier::High => Self {
                base_response_ms: 1500,
                response_variance: 0.2,
                accuracy: 0.95,
            },
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_response_ms == 0 {
            return Err("base_response_ms must be positive".into());
        }
        if !(0.0..1.0).contains(&self.response_variance) {
            return Err(format!(
                "response_variance ({}) must be in [0, 1)",
                self.response_variance
            ));
        }
        if !(0.0..=1.0).contains(&self.accuracy) {
            return Err(format!("accuracy ({}) must be in [0, 1]", self.accuracy));
        }
        Ok(())
    }
}
