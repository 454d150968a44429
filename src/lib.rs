//! Quiz Battle - turn-based quiz duels
//!
//! Two sides answer the same multiple-choice question each round. The faster
//! correct answer attacks; the first side to run out of HP loses.

pub mod battle;
pub mod core;
pub mod opponent;
pub mod orchestrator;
pub mod question;
pub mod record;
