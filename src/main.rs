//! Quiz Battle - terminal entry point
//!
//! Plays one real-time match in the terminal. Side one answers with 1-4; in
//! two-player mode side two answers with a-d on the same keyboard.

use clap::Parser;
use quiz_battle::core::error::{QuizError, Result};
use quiz_battle::core::{GameRules, MatchConfig, MatchMode, Side, Winner};
use quiz_battle::opponent::DifficultyTier;
use quiz_battle::orchestrator::{spawn_match, MatchContext, MatchHandle, MatchStats, MatchUpdate};
use quiz_battle::question::{FactGenerator, MemoryContentBank};
use quiz_battle::record::JsonLinesRecorder;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(name = "quiz-battle")]
#[command(about = "Answer faster than your opponent to attack")]
struct Args {
    /// School level (1-6)
    #[arg(long, default_value_t = 1)]
    level: u8,

    /// Opponent tier: low, mid or high
    #[arg(long, default_value = "mid")]
    tier: DifficultyTier,

    /// Two humans on one keyboard instead of the simulated opponent
    #[arg(long)]
    two_player: bool,

    /// Questions per match
    #[arg(long, default_value_t = 10)]
    rounds: u32,

    /// Rules file
    #[arg(long, default_value = "data/rules.toml")]
    rules: String,

    /// Fact file to draw questions from instead of multiplication
    #[arg(long)]
    facts: Option<String>,

    /// Append the finished match to this JSON-lines file
    #[arg(long)]
    record: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("quiz_battle=info")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let rules = GameRules::load(&args.rules).unwrap_or_else(|e| {
        tracing::warn!(path = %args.rules, error = %e, "Using built-in rules");
        GameRules::default()
    });

    let mut ctx = match &args.facts {
        Some(path) => {
            let bank = MemoryContentBank::load(path)?;
            MatchContext::new(rules.clone(), Box::new(FactGenerator::new(bank, &rules.generator)))
        }
        None => MatchContext::arithmetic(rules),
    };
    if let Some(path) = &args.record {
        ctx = ctx.with_recorder(JsonLinesRecorder::new(path));
    }

    let config = MatchConfig {
        level: args.level,
        difficulty_tier: args.tier,
        round_limit: args.rounds,
        mode: if args.two_player {
            MatchMode::TwoPlayer
        } else {
            MatchMode::VsOpponent
        },
        ..MatchConfig::default()
    };

    println!("\n=== QUIZ BATTLE ===");
    println!("Answer with 1-4{}", if args.two_player { " (side two: a-d)" } else { "" });
    println!("  p - pause   r - resume   q - quit");
    println!();

    let rt = Runtime::new()?;
    let stats = rt.block_on(play(config, ctx))?;
    display_result(&stats);
    Ok(())
}

async fn play(config: MatchConfig, ctx: MatchContext) -> Result<MatchStats> {
    let (handle, mut updates) = spawn_match(config, ctx)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut reading = true;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(MatchUpdate::MatchEnded(_)) | Err(RecvError::Closed) => break,
                Ok(update) => display_update(&update),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Display fell behind");
                }
            },
            line = lines.next_line(), if reading => {
                let keep_playing = match line? {
                    Some(line) => match handle_input(&handle, line.trim()).await {
                        Ok(keep_playing) => keep_playing,
                        Err(QuizError::MatchClosed) => false,
                        Err(e) => return Err(e),
                    },
                    None => false,
                };
                if !keep_playing {
                    reading = false;
                    handle.abandon().await;
                }
            }
        }
    }

    handle.finished().await
}

/// Returns false when the player wants to quit
async fn handle_input(handle: &MatchHandle, input: &str) -> Result<bool> {
    let answer = match input {
        "q" | "quit" => return Ok(false),
        "p" | "pause" => {
            if handle.pause().await? {
                println!("-- paused --");
            }
            return Ok(true);
        }
        "r" | "resume" => {
            if handle.resume().await? {
                println!("-- resumed, the clock restarts --");
            }
            return Ok(true);
        }
        "1" | "2" | "3" | "4" => Some((Side::One, input.as_bytes()[0] - b'1')),
        "a" | "b" | "c" | "d" => Some((Side::Two, input.as_bytes()[0] - b'a')),
        _ => None,
    };

    match answer {
        Some((side, index)) => {
            if !handle.submit_answer(side, usize::from(index)).await? {
                println!("(answer not accepted)");
            }
        }
        None if !input.is_empty() => println!("Unknown input '{}'", input),
        None => {}
    }
    Ok(true)
}

fn display_update(update: &MatchUpdate) {
    match update {
        MatchUpdate::QuestionIssued {
            round,
            question,
            time_limit_ms,
        } => {
            println!("Round {} - {} ({}s)", round, question.prompt(), time_limit_ms / 1000);
            for (i, choice) in question.choices().iter().enumerate() {
                println!("  {}) {}", i + 1, choice.value);
            }
        }
        MatchUpdate::AnswerAccepted { side, .. } => {
            println!("  {:?} locked in", side);
        }
        MatchUpdate::RoundResolved(outcome) => {
            println!(
                "  {}  [{} {}] / [{} {}]",
                outcome.headline(),
                outcome.side_one.rating.grade,
                outcome.side_one.rating.message,
                outcome.side_two.rating.grade,
                outcome.side_two.rating.message
            );
            println!(
                "  HP  you: {}  opponent: {}",
                outcome.resulting_hp_one, outcome.resulting_hp_two
            );
            println!();
        }
        MatchUpdate::MatchEnded(_) => {}
    }
}

fn display_result(stats: &MatchStats) {
    let verdict = match stats.winner {
        Winner::SideOne => "You win!",
        Winner::SideTwo => "You lose!",
        Winner::Draw => "Draw!",
        Winner::Undecided => "Match abandoned",
    };
    println!("=== {} ===", verdict);
    println!(
        "Rounds: {}  Final HP: {} / {}",
        stats.rounds_played, stats.final_hp_one, stats.final_hp_two
    );
    println!(
        "Accuracy: {:.0}%  Average answer: {:.1}s",
        stats.side_one.accuracy() * 100.0,
        stats.side_one.avg_response_ms() / 1000.0
    );
    if stats.next_tier != stats.difficulty_tier {
        println!("Next opponent: {}", stats.next_tier.description());
    }
}
