//! Wrong-answer strategies for multiplication questions
//!
//! Candidates come from several strategies, are deduplicated and filtered,
//! then three are drawn at random. The near-miss and common-confusion values
//! are also what the simulated opponent looks for when it makes a mistake.

use std::ops::RangeInclusive;

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Wrong answers needed per question
pub const DISTRACTOR_COUNT: usize = 3;

/// Half-width of the fallback offset range used when strategies run dry
const FALLBACK_SPREAD: i64 = 20;

/// Largest product any level asks for (12 × 12)
pub const LARGEST_PRODUCT: u32 = 144;

/// Smallest answer bound that always leaves the fallback offsets enough room
pub const MIN_ANSWER_UPPER_BOUND: u32 = LARGEST_PRODUCT + FALLBACK_SPREAD as u32 + 1;

/// Products with one operand moved by ±1, staying inside the level range
pub fn near_misses(left: u32, right: u32, range: &RangeInclusive<u32>) -> Vec<u32> {
    let mut values = Vec::with_capacity(4);
    if left > *range.start() {
        values.push((left - 1) * right);
    }
    if left < *range.end() {
        values.push((left + 1) * right);
    }
    if right > *range.start() {
        values.push(left * (right - 1));
    }
    if right < *range.end() {
        values.push(left * (right + 1));
    }
    values
}

/// Adding instead of multiplying
pub fn common_confusion(left: u32, right: u32) -> u32 {
    left + right
}

/// Every strategy's raw candidates, before filtering
fn raw_candidates(
    left: u32,
    right: u32,
    range: &RangeInclusive<u32>,
    rng: &mut ChaCha8Rng,
) -> Vec<i64> {
    let correct = (left * right) as i64;
    let mut raw: Vec<i64> = near_misses(left, right, range)
        .into_iter()
        .map(i64::from)
        .collect();

    raw.push(common_confusion(left, right) as i64);

    // Small offsets
    raw.push(correct + rng.gen_range(1..=5));
    raw.push(correct - rng.gen_range(1..=5));

    // Larger offsets
    raw.push(correct + rng.gen_range(5..=15));
    raw.push(correct - rng.gen_range(5..=15));

    // Scaling
    raw.push(correct * 2);
    raw.push(correct / 2);

    raw
}

/// Pick three distinct, positive wrong answers for `left × right`
pub fn pick_distractors(
    left: u32,
    right: u32,
    range: &RangeInclusive<u32>,
    upper_bound: u32,
    rng: &mut ChaCha8Rng,
) -> Vec<u32> {
    let correct = left * right;

    let mut seen = AHashSet::new();
    let valid: Vec<u32> = raw_candidates(left, right, range, rng)
        .into_iter()
        .filter(|&v| v > 0 && v < upper_bound as i64 && v != correct as i64)
        .map(|v| v as u32)
        .filter(|&v| seen.insert(v))
        .collect();

    let mut selected: Vec<u32> = valid
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .copied()
        .collect();

    // correct+1..=correct+20 stays under any bound of at least MIN_ANSWER_UPPER_BOUND
    while selected.len() < DISTRACTOR_COUNT {
        let candidate = correct as i64 + rng.gen_range(-FALLBACK_SPREAD..=FALLBACK_SPREAD);
        if candidate > 0
            && candidate < upper_bound as i64
            && candidate != correct as i64
            && !selected.contains(&(candidate as u32))
        {
            selected.push(candidate as u32);
        }
    }

    selected
}
