//! Simulated opponent: tier profiles, mistakes, answer timing and
//! between-match tier adjustment

pub mod adaptive;
pub mod mistake;
pub mod profile;
pub mod simulator;

pub use adaptive::adjust_tier;
pub use mistake::{wrong_answer_for, MistakePattern};
pub use profile::{DifficultyProfile, DifficultyTier};
pub use simulator::{OpponentDecision, OpponentSimulator};
