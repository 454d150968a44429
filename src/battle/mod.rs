//! Battle system - HP, damage and round resolution
//!
//! A round is resolved once both answers are in:
//! answers -> attackers -> damage -> HP -> winner

pub mod answer;
pub mod damage;
pub mod rating;
pub mod resolver;
pub mod session;

pub use answer::AnswerResult;
pub use damage::{damage_for, DamageOutcome, DamageTier};
pub use rating::{rate_answer, RoundRating};
pub use resolver::{attackers, resolve, RoundOutcome, SideReport};
pub use session::{BattleSession, BattleSummary, DamageEvent};
