pub mod config;
pub mod error;
pub mod types;

pub use config::{AdaptiveRules, DamageRules, GameRules, GeneratorRules, MatchConfig, OpponentRules};
pub use error::{QuizError, Result};
pub use types::{MatchId, MatchMode, Millis, RoundNumber, Side, Winner};
