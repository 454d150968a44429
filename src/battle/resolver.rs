//! Round resolution
//!
//! Decides who attacks from both sides' answers, then applies the damage to
//! the session. Not idempotent: each call lands its hits again.

use serde::Serialize;

use crate::battle::answer::AnswerResult;
use crate::battle::damage::{damage_for, DamageOutcome};
use crate::battle::rating::{rate_answer, RoundRating};
use crate::battle::session::BattleSession;
use crate::core::config::DamageRules;
use crate::core::types::{Millis, RoundNumber, Side, Winner};

/// One side's part of a resolved round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideReport {
    pub result: AnswerResult,
    /// What this side's attack is worth, whether or not it attacked
    pub attack: DamageOutcome,
    pub rating: RoundRating,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub round: RoundNumber,
    pub side_one_attacks: bool,
    pub side_two_attacks: bool,
    /// HP side one actually lost this round
    pub damage_to_side_one: u32,
    /// HP side two actually lost this round
    pub damage_to_side_two: u32,
    pub resulting_hp_one: u32,
    pub resulting_hp_two: u32,
    pub winner: Winner,
    pub side_one: SideReport,
    pub side_two: SideReport,
}

impl RoundOutcome {
    pub fn report(&self, side: Side) -> &SideReport {
        match side {
            Side::One => &self.side_one,
            Side::Two => &self.side_two,
        }
    }

    pub fn attacks(&self, side: Side) -> bool {
        match side {
            Side::One => self.side_one_attacks,
            Side::Two => self.side_two_attacks,
        }
    }

    /// Short line for logs and text renderers
    pub fn headline(&self) -> &'static str {
        match (self.side_one_attacks, self.side_two_attacks) {
            (true, true) => "Both sides attack!",
            (true, false) => self.side_one.attack.description,
            (false, true) => self.side_two.attack.description,
            (false, false) => "No attack this round",
        }
    }
}

/// Which sides attack: (side one, side two)
///
/// Both correct: the strictly faster side attacks, an exact tie means both do.
/// One correct: that side. Neither: nobody.
pub fn attackers(one: &AnswerResult, two: &AnswerResult) -> (bool, bool) {
    match (one.is_correct, two.is_correct) {
        (true, true) => match one.response_time_ms.cmp(&two.response_time_ms) {
            std::cmp::Ordering::Less => (true, false),
            std::cmp::Ordering::Greater => (false, true),
            std::cmp::Ordering::Equal => (true, true),
        },
        (true, false) => (true, false),
        (false, true) => (false, true),
        (false, false) => (false, false),
    }
}

/// Resolve a round and apply its damage to `session`
///
/// Call exactly once per round.
pub fn resolve(
    round: RoundNumber,
    one: &AnswerResult,
    two: &AnswerResult,
    session: &mut BattleSession,
    rules: &DamageRules,
    at_ms: Millis,
) -> RoundOutcome {
    let attack_one = damage_for(rules, one.is_correct, one.response_time_ms);
    let attack_two = damage_for(rules, two.is_correct, two.response_time_ms);
    let (side_one_attacks, side_two_attacks) = attackers(one, two);

    // Both hits are costed before either lands, so a tie is truly simultaneous
    let damage_to_side_two = if side_one_attacks {
        session.apply_damage(Side::Two, attack_one.amount, at_ms)
    } else {
        0
    };
    let damage_to_side_one = if side_two_attacks {
        session.apply_damage(Side::One, attack_two.amount, at_ms)
    } else {
        0
    };

    let winner = session.check_battle_end();

    tracing::debug!(
        round,
        side_one_attacks,
        side_two_attacks,
        damage_to_side_one,
        damage_to_side_two,
        ?winner,
        "Round resolved"
    );

    RoundOutcome {
        round,
        side_one_attacks,
        side_two_attacks,
        damage_to_side_one,
        damage_to_side_two,
        resulting_hp_one: session.hp(Side::One),
        resulting_hp_two: session.hp(Side::Two),
        winner,
        side_one: SideReport {
            result: one.clone(),
            rating: rate_answer(rules, one),
            attack: attack_one,
        },
        side_two: SideReport {
            result: two.clone(),
            rating: rate_answer(rules, two),
            attack: attack_two,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::damage::DamageTier;
    use crate::question::model::ChoiceValue;

    fn correct(ms: Millis) -> AnswerResult {
        AnswerResult::answered(ChoiceValue::Number(12), true, ms)
    }

    fn wrong(ms: Millis) -> AnswerResult {
        AnswerResult::answered(ChoiceValue::Number(7), false, ms)
    }

    #[test]
    fn test_faster_correct_side_attacks() {
        let mut session = BattleSession::new(100);
        let outcome = resolve(1, &correct(1500), &correct(2500), &mut session, &DamageRules::default(), 2500);

        assert!(outcome.side_one_attacks);
        assert!(!outcome.side_two_attacks);
        assert_eq!(outcome.damage_to_side_two, 25);
        assert_eq!(outcome.damage_to_side_one, 0);
        assert_eq!(outcome.resulting_hp_two, 75);
        assert_eq!(outcome.winner, Winner::Undecided);
    }

    #[test]
    fn test_slower_side_attacks_with_own_damage() {
        let mut session = BattleSession::new(100);
        let outcome = resolve(1, &correct(4000), &correct(2500), &mut session, &DamageRules::default(), 4000);

        assert!(!outcome.side_one_attacks);
        assert!(outcome.side_two_attacks);
        // Side two's answer was fast, not critical
        assert_eq!(outcome.side_two.attack.tier, DamageTier::Fast);
        assert_eq!(outcome.damage_to_side_one, 25);
    }

    #[test]
    fn test_exact_tie_both_attack() {
        let mut session = BattleSession::new(100);
        let outcome = resolve(1, &correct(2500), &correct(2500), &mut session, &DamageRules::default(), 2500);

        assert!(outcome.side_one_attacks && outcome.side_two_attacks);
        assert_eq!(outcome.resulting_hp_one, 75);
        assert_eq!(outcome.resulting_hp_two, 75);
        assert_eq!(outcome.headline(), "Both sides attack!");
    }

    #[test]
    fn test_one_sided_headline_names_the_strike() {
        let rules = DamageRules::default();
        let one = resolve(1, &correct(2500), &correct(4000), &mut BattleSession::new(100), &rules, 4000);
        let two = resolve(1, &correct(4000), &correct(2500), &mut BattleSession::new(100), &rules, 4000);

        assert_eq!(one.headline(), "Fast strike!");
        assert_eq!(two.headline(), one.headline());

        let critical = resolve(1, &wrong(500), &correct(1200), &mut BattleSession::new(100), &rules, 1200);
        assert_eq!(critical.headline(), "Critical strike!");
    }

    #[test]
    fn test_only_correct_side_attacks_even_if_slower() {
        let mut session = BattleSession::new(100);
        let outcome = resolve(1, &wrong(500), &correct(5000), &mut session, &DamageRules::default(), 5000);

        assert!(!outcome.side_one_attacks);
        assert!(outcome.side_two_attacks);
        assert_eq!(outcome.damage_to_side_one, 15);
    }

    #[test]
    fn test_both_wrong_no_attack() {
        let mut session = BattleSession::new(100);
        let outcome = resolve(1, &wrong(1000), &AnswerResult::no_answer(10_000), &mut session, &DamageRules::default(), 10_000);

        assert_eq!(outcome.damage_to_side_one, 0);
        assert_eq!(outcome.damage_to_side_two, 0);
        assert_eq!(outcome.winner, Winner::Undecided);
        assert_eq!(session.hp(Side::One), 100);
        assert_eq!(session.hp(Side::Two), 100);
        assert!(session.round_log().is_empty());
    }

    #[test]
    fn test_simultaneous_knockout_is_draw() {
        let mut session = BattleSession::new(20);
        let outcome = resolve(4, &correct(1000), &correct(1000), &mut session, &DamageRules::default(), 1000);
        assert_eq!(outcome.winner, Winner::Draw);
        assert_eq!(outcome.damage_to_side_one, 20);
    }

    #[test]
    fn test_knockout_names_winner() {
        let mut session = BattleSession::new(25);
        let outcome = resolve(3, &correct(1000), &wrong(1000), &mut session, &DamageRules::default(), 1000);
        assert_eq!(outcome.winner, Winner::SideOne);
        assert_eq!(outcome.resulting_hp_two, 0);
    }

    #[test]
    fn test_resolving_twice_lands_hits_twice() {
        let mut session = BattleSession::new(100);
        let rules = DamageRules::default();
        resolve(1, &correct(1500), &wrong(3000), &mut session, &rules, 3000);
        let hp_after_first = session.hp(Side::Two);

        resolve(1, &correct(1500), &wrong(3000), &mut session, &rules, 3000);
        assert_ne!(session.hp(Side::Two), hp_after_first);
        assert_eq!(session.hp(Side::Two), 50);
    }
}
