//! Between-match tier adjustment from the human's performance

use crate::core::config::AdaptiveRules;
use crate::opponent::profile::DifficultyTier;

/// Recommend the tier for the next match
///
/// `accuracy` is 0.0-1.0 and `avg_response_ms` the mean response time of the
/// human side. Returns `tier` unchanged when adaptation is disabled or neither
/// rule fires.
pub fn adjust_tier(
    rules: &AdaptiveRules,
    tier: DifficultyTier,
    accuracy: f64,
    avg_response_ms: f64,
) -> DifficultyTier {
    if !rules.enabled {
        return tier;
    }

    if accuracy > rules.step_up_accuracy && avg_response_ms < rules.step_up_max_avg_ms {
        let next = tier.step_up();
        if next != tier {
            tracing::info!(from = %tier, to = %next, accuracy, avg_response_ms, "Opponent tier stepped up");
        }
        next
    } else if accuracy < rules.step_down_accuracy && avg_response_ms > rules.step_down_min_avg_ms {
        let next = tier.step_down();
        if next != tier {
            tracing::info!(from = %tier, to = %next, accuracy, avg_response_ms, "Opponent tier stepped down");
        }
        next
    } else {
        tier
    }
}
