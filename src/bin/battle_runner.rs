//! Headless Battle Runner
//!
//! Plays scripted players against the simulated opponent (or each other) on
//! the simulated clock and prints the results. Useful for balancing rules and
//! opponent profiles.

use clap::{Parser, ValueEnum};
use quiz_battle::core::{GameRules, MatchConfig, MatchMode, Result, Winner};
use quiz_battle::opponent::DifficultyTier;
use quiz_battle::orchestrator::{
    run_to_completion, MatchContext, MatchStats, MatchUpdate, RoundOrchestrator, ScriptedPlayer,
    SimulatedClock,
};
use quiz_battle::question::{FactGenerator, MemoryContentBank};
use quiz_battle::record::JsonLinesRecorder;
use serde::Serialize;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    VsOpponent,
    TwoPlayer,
}

/// Headless Battle Runner - scripted quiz matches
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run scripted quiz battles and output results")]
struct Args {
    /// School level (1-6)
    #[arg(long, default_value_t = 1)]
    level: u8,

    /// Opponent tier for the first match: low, mid or high
    #[arg(long, default_value = "mid")]
    tier: DifficultyTier,

    #[arg(long, value_enum, default_value = "vs-opponent")]
    mode: Mode,

    /// Questions per match
    #[arg(long, default_value_t = 10)]
    rounds: u32,

    /// Answer window per question in milliseconds
    #[arg(long, default_value_t = 10_000)]
    time_limit_ms: u64,

    /// Matches to play back to back; the opponent tier adapts between them
    #[arg(long, default_value_t = 1)]
    matches: u32,

    /// Probability side one answers correctly
    #[arg(long, default_value_t = 1.0)]
    accuracy: f64,

    /// Side one's response time in milliseconds
    #[arg(long, default_value_t = 1800)]
    response_ms: u64,

    /// Probability side two answers correctly (two-player mode)
    #[arg(long, default_value_t = 0.8)]
    side_two_accuracy: f64,

    /// Side two's response time in milliseconds (two-player mode)
    #[arg(long, default_value_t = 2500)]
    side_two_response_ms: u64,

    /// Rules file; built-in defaults when absent
    #[arg(long)]
    rules: Option<String>,

    /// Fact file to draw questions from instead of multiplication
    #[arg(long)]
    facts: Option<String>,

    /// Append every finished match to this JSON-lines file
    #[arg(long)]
    record: Option<String>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every match update to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct MatchResult {
    winner: Winner,
    end_reason: String,
    rounds: u32,
    final_hp_one: u32,
    final_hp_two: u32,
    side_one_accuracy: f64,
    side_one_avg_ms: f64,
    side_two_accuracy: f64,
    tier: DifficultyTier,
    next_tier: DifficultyTier,
    seed: u64,
}

impl From<&MatchStats> for MatchResult {
    fn from(stats: &MatchStats) -> Self {
        Self {
            winner: stats.winner,
            end_reason: format!("{:?}", stats.end_reason),
            rounds: stats.rounds_played,
            final_hp_one: stats.final_hp_one,
            final_hp_two: stats.final_hp_two,
            side_one_accuracy: stats.side_one.accuracy(),
            side_one_avg_ms: stats.side_one.avg_response_ms(),
            side_two_accuracy: stats.side_two.accuracy(),
            tier: stats.difficulty_tier,
            next_tier: stats.next_tier,
            seed: stats.seed,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let rules = match &args.rules {
        Some(path) => GameRules::load(path)?,
        None => GameRules::default(),
    };
    let bank = match &args.facts {
        Some(path) => Some(MemoryContentBank::load(path)?),
        None => None,
    };

    let base_seed = args.seed.unwrap_or_else(rand::random);
    let mut tier = args.tier;
    let mut results = Vec::new();

    for index in 0..args.matches {
        let seed = base_seed.wrapping_add(u64::from(index) * 1000);
        let config = MatchConfig {
            level: args.level,
            difficulty_tier: tier,
            round_limit: args.rounds,
            round_time_limit_ms: args.time_limit_ms,
            mode: match args.mode {
                Mode::VsOpponent => MatchMode::VsOpponent,
                Mode::TwoPlayer => MatchMode::TwoPlayer,
            },
            seed: Some(seed),
            ..MatchConfig::default()
        };

        let mut ctx = match &bank {
            Some(bank) => MatchContext::new(
                rules.clone(),
                Box::new(FactGenerator::new(bank.clone(), &rules.generator)),
            ),
            None => MatchContext::arithmetic(rules.clone()),
        };
        if let Some(path) = &args.record {
            ctx = ctx.with_recorder(JsonLinesRecorder::new(path));
        }

        let mut orchestrator = RoundOrchestrator::start_match(config, ctx, SimulatedClock::new())?;
        let mut side_one = ScriptedPlayer::new(args.accuracy, args.response_ms, seed.wrapping_add(2));
        let mut side_two =
            ScriptedPlayer::new(args.side_two_accuracy, args.side_two_response_ms, seed.wrapping_add(3));

        let stats = run_to_completion(&mut orchestrator, &mut side_one, Some(&mut side_two))?;

        if args.verbose {
            eprintln!("=== Match {} (tier {}) ===", index + 1, tier);
            for update in orchestrator.take_updates() {
                log_update(&update);
            }
            eprintln!();
        }

        tier = stats.next_tier;
        results.push(MatchResult::from(&stats));
    }

    match args.format.as_str() {
        "text" => print_text(&results),
        "json" => print_json(&results)?,
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            print_json(&results)?;
        }
    }

    Ok(())
}

fn print_json(results: &[MatchResult]) -> Result<()> {
    let output = match results {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    println!("{}", output);
    Ok(())
}

fn print_text(results: &[MatchResult]) {
    for (i, result) in results.iter().enumerate() {
        println!("Match {}", i + 1);
        println!("========");
        println!("Winner: {:?} ({})", result.winner, result.end_reason);
        println!("Rounds: {}", result.rounds);
        println!("HP: {} vs {}", result.final_hp_one, result.final_hp_two);
        println!(
            "Side one: {:.0}% correct, {:.0} ms average",
            result.side_one_accuracy * 100.0,
            result.side_one_avg_ms
        );
        println!("Side two: {:.0}% correct", result.side_two_accuracy * 100.0);
        println!("Tier: {} -> {}", result.tier, result.next_tier);
        println!("Seed: {}", result.seed);
        println!();
    }
}

fn log_update(update: &MatchUpdate) {
    match update {
        MatchUpdate::QuestionIssued { round, question, .. } => {
            let choices: Vec<String> = question.choices().iter().map(|c| c.value.to_string()).collect();
            eprintln!("[round {}] {}  [{}]", round, question.prompt(), choices.join(", "));
        }
        MatchUpdate::AnswerAccepted {
            side,
            is_correct,
            response_time_ms,
            ..
        } => {
            eprintln!(
                "  {:?} answered {} in {} ms",
                side,
                if *is_correct { "correctly" } else { "wrong" },
                response_time_ms
            );
        }
        MatchUpdate::RoundResolved(outcome) => {
            eprintln!(
                "  {} HP {} / {}",
                outcome.headline(),
                outcome.resulting_hp_one,
                outcome.resulting_hp_two
            );
        }
        MatchUpdate::MatchEnded(stats) => {
            eprintln!("  Match over: {:?} ({:?})", stats.winner, stats.end_reason);
        }
    }
}
