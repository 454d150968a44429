//! Damage model: correctness and speed decide how hard a side hits
//!
//! Pure function of the answer; nothing here touches HP.

use serde::Serialize;

use crate::core::config::DamageRules;
use crate::core::types::Millis;

/// Damage bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DamageTier {
    /// Wrong or missing answer - no attack
    Miss,
    Normal,
    Fast,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageOutcome {
    pub amount: u32,
    pub tier: DamageTier,
    pub description: &'static str,
}

/// Damage a single answer would deal if its side attacks
pub fn damage_for(rules: &DamageRules, is_correct: bool, response_time_ms: Millis) -> DamageOutcome {
    if !is_correct {
        return DamageOutcome {
            amount: 0,
            tier: DamageTier::Miss,
            description: "Wrong answer - no attack",
        };
    }

    if response_time_ms < rules.critical_threshold_ms {
        DamageOutcome {
            amount: rules.critical_damage,
            tier: DamageTier::Critical,
            description: "Critical strike!",
        }
    } else if response_time_ms < rules.fast_threshold_ms {
        DamageOutcome {
            amount: rules.base_damage.saturating_add(rules.fast_bonus),
            tier: DamageTier::Fast,
            description: "Fast strike!",
        }
    } else {
        DamageOutcome {
            amount: rules.base_damage,
            tier: DamageTier::Normal,
            description: "Normal strike",
        }
    }
}
