//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub Uuid);

impl MatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

/// Round counter (1-based once the first question is issued)
pub type RoundNumber = u32;

/// Milliseconds on the match clock
pub type Millis = u64;

/// One of the two combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    /// The other combatant
    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    /// Index into per-side arrays
    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }
}

/// Who won, if anyone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Winner {
    /// Battle continues
    #[default]
    Undecided,
    SideOne,
    SideTwo,
    Draw,
}

impl Winner {
    pub fn side(side: Side) -> Self {
        match side {
            Side::One => Winner::SideOne,
            Side::Two => Winner::SideTwo,
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, Winner::Undecided)
    }
}

/// Who controls side two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchMode {
    /// Side two is the simulated opponent
    #[default]
    VsOpponent,
    /// Both sides are human
    TwoPlayer,
}
