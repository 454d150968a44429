//! Match orchestration
//!
//! The state machine itself is synchronous and clock-agnostic; timers go
//! through the `Scheduler` seam so the same code runs on the simulated clock
//! in tests and the headless runner, and on tokio timers in real time.

pub mod headless;
pub mod round;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod stats;

pub use headless::{run_to_completion, ScriptedPlayer};
pub use round::{MatchContext, RoundOrchestrator};
pub use runtime::{spawn_match, MatchHandle};
pub use scheduler::{Scheduler, SimulatedClock, TimerEvent, TimerHandle, TokioScheduler};
pub use state::{EndReason, MatchSnapshot, MatchState, MatchUpdate};
pub use stats::{MatchStats, SideStats};
