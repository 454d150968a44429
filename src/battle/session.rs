//! Battle session: both sides' HP and the damage history of one match

use serde::{Deserialize, Serialize};

use crate::core::types::{Millis, Side, Winner};

/// Log entry for one applied hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub target: Side,
    pub amount: u32,
    pub hp_before: u32,
    pub hp_after: u32,
    /// Match clock when the hit landed
    pub at_ms: Millis,
}

/// Damage totals for the end-of-match report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub hits_landed: usize,
    pub damage_taken_one: u32,
    pub damage_taken_two: u32,
    pub hp_percent_one: f64,
    pub hp_percent_two: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSession {
    max_hp: u32,
    hp: [u32; 2],
    round_log: Vec<DamageEvent>,
}

impl BattleSession {
    pub fn new(max_hp: u32) -> Self {
        Self {
            max_hp,
            hp: [max_hp; 2],
            round_log: Vec::new(),
        }
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn hp(&self, side: Side) -> u32 {
        self.hp[side.index()]
    }

    pub fn round_log(&self) -> &[DamageEvent] {
        &self.round_log
    }

    /// Subtract `amount` from `target`, flooring at 0
    ///
    /// Every call is logged, including zero-damage ones. Returns the HP the
    /// target actually lost.
    pub fn apply_damage(&mut self, target: Side, amount: u32, at_ms: Millis) -> u32 {
        let hp_before = self.hp[target.index()];
        let hp_after = hp_before.saturating_sub(amount);
        self.hp[target.index()] = hp_after;

        self.round_log.push(DamageEvent {
            target,
            amount,
            hp_before,
            hp_after,
            at_ms,
        });

        hp_before - hp_after
    }

    /// Knockout check: a side at 0 HP loses, both at 0 is a draw
    pub fn check_battle_end(&self) -> Winner {
        match (self.hp(Side::One) == 0, self.hp(Side::Two) == 0) {
            (true, true) => Winner::Draw,
            (false, true) => Winner::SideOne,
            (true, false) => Winner::SideTwo,
            (false, false) => Winner::Undecided,
        }
    }

    /// Decide a match that ran out of rounds: more HP wins, equal HP draws
    pub fn winner_by_hp(&self) -> Winner {
        let knockout = self.check_battle_end();
        if knockout.is_decided() {
            return knockout;
        }
        match self.hp(Side::One).cmp(&self.hp(Side::Two)) {
            std::cmp::Ordering::Greater => Winner::SideOne,
            std::cmp::Ordering::Less => Winner::SideTwo,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }

    pub fn summary(&self) -> BattleSummary {
        let percent = |hp: u32| hp as f64 / self.max_hp as f64 * 100.0;
        BattleSummary {
            hits_landed: self.round_log.iter().filter(|e| e.amount > 0).count(),
            damage_taken_one: self.max_hp - self.hp(Side::One),
            damage_taken_two: self.max_hp - self.hp(Side::Two),
            hp_percent_one: percent(self.hp(Side::One)),
            hp_percent_two: percent(self.hp(Side::Two)),
        }
    }
}
