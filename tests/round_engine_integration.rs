//! Round engine integration tests: content failures, recorders, timer hygiene

use quiz_battle::core::{GameRules, GeneratorRules, MatchConfig, MatchMode, QuizError, Result, Side, Winner};
use quiz_battle::opponent::DifficultyTier;
use quiz_battle::orchestrator::{
    run_to_completion, EndReason, MatchContext, MatchState, MatchStats, MatchUpdate, RoundOrchestrator,
    ScriptedPlayer, SimulatedClock,
};
use quiz_battle::question::{
    ArithmeticGenerator, ContentBank, FactGenerator, FactRecord, MemoryContentBank, Question, QuestionSource,
};
use quiz_battle::record::{JsonLinesRecorder, MatchRecorder, MemoryRecorder};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Arithmetic questions until the budget runs out, then content errors
struct LimitedSource {
    inner: ArithmeticGenerator,
    remaining: usize,
}

impl LimitedSource {
    fn new(questions: usize) -> Self {
        Self {
            inner: ArithmeticGenerator::new(GeneratorRules::default()),
            remaining: questions,
        }
    }
}

impl QuestionSource for LimitedSource {
    fn generate(&mut self, level: u8, rng: &mut ChaCha8Rng) -> Result<Question> {
        if self.remaining == 0 {
            return Err(QuizError::Content("question bank exhausted".into()));
        }
        self.remaining -= 1;
        self.inner.generate(level, rng)
    }

    fn clear_history(&mut self) {
        self.inner.clear_history();
    }
}

/// Arithmetic questions, counting how often the window is cleared
struct CountingSource {
    inner: ArithmeticGenerator,
    clears: Arc<AtomicUsize>,
}

impl QuestionSource for CountingSource {
    fn generate(&mut self, level: u8, rng: &mut ChaCha8Rng) -> Result<Question> {
        self.inner.generate(level, rng)
    }

    fn clear_history(&mut self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear_history();
    }
}

struct FailingRecorder;

impl MatchRecorder for FailingRecorder {
    fn record_match_result(&mut self, _stats: &MatchStats) -> Result<()> {
        Err(QuizError::Content("store offline".into()))
    }
}

/// Bank whose records are all unusable
struct BrokenBank;

impl ContentBank for BrokenBank {
    fn fetch_question_content(&self, _level: u8) -> Result<Vec<FactRecord>> {
        Ok(vec![FactRecord {
            id: 1,
            prompt: "What do owls eat?".into(),
            correct_answer: "Mice".into(),
            wrong_answers: vec!["Mice".into(), "Grass".into()],
            explanation: String::new(),
            category: String::new(),
            min_level: 1,
        }])
    }
}

fn config(mode: MatchMode, seed: u64) -> MatchConfig {
    MatchConfig {
        mode,
        difficulty_tier: DifficultyTier::Low,
        seed: Some(seed),
        ..MatchConfig::default()
    }
}

#[test]
fn test_content_error_at_start_is_returned() {
    let rules = GameRules::default();
    let ctx = MatchContext::new(rules.clone(), Box::new(FactGenerator::new(BrokenBank, &rules.generator)));
    let result = RoundOrchestrator::start_match(config(MatchMode::VsOpponent, 1), ctx, SimulatedClock::new());

    assert!(matches!(result, Err(QuizError::Content(_))));
}

#[test]
fn test_level_zero_rejected_before_content_fetch() {
    let rules = GameRules::default();
    let bank = MemoryContentBank::load("data/facts/food_chain.toml").unwrap();
    let ctx = MatchContext::new(rules.clone(), Box::new(FactGenerator::new(bank, &rules.generator)));
    let result = RoundOrchestrator::start_match(
        MatchConfig {
            level: 0,
            ..config(MatchMode::VsOpponent, 1)
        },
        ctx,
        SimulatedClock::new(),
    );

    // Level 0 is rejected before any content is fetched
    assert!(matches!(result, Err(QuizError::InvalidConfig(_))));
}

#[test]
fn test_content_error_mid_match_ends_match() {
    let memory = MemoryRecorder::new();
    let ctx = MatchContext::new(GameRules::default(), Box::new(LimitedSource::new(2))).with_recorder(memory.clone());
    let mut orch = RoundOrchestrator::start_match(config(MatchMode::TwoPlayer, 4), ctx, SimulatedClock::new()).unwrap();

    // Round 1 and 2 time out; the third question cannot be produced
    orch.advance_to(15_000).unwrap();
    assert_eq!(orch.round(), 2);
    orch.advance_to(25_000).unwrap();
    assert_eq!(orch.current_state(), MatchState::Attack);

    let err = orch.advance_to(30_000).unwrap_err();
    assert!(matches!(err, QuizError::Content(_)));
    assert_eq!(orch.current_state(), MatchState::GameOver);
    assert_eq!(orch.pending_timers(), 0);

    let stats = orch.final_stats().unwrap();
    assert_eq!(stats.end_reason, EndReason::ContentUnavailable);
    assert_eq!(stats.winner, Winner::Undecided);
    assert_eq!(stats.rounds_played, 2);
    assert_eq!(memory.records().len(), 1);
}

#[test]
fn test_match_start_clears_question_history() {
    let clears = Arc::new(AtomicUsize::new(0));
    let source = CountingSource {
        inner: ArithmeticGenerator::new(GeneratorRules::default()),
        clears: clears.clone(),
    };
    let ctx = MatchContext::new(GameRules::default(), Box::new(source));
    let mut orch = RoundOrchestrator::start_match(config(MatchMode::VsOpponent, 3), ctx, SimulatedClock::new()).unwrap();
    assert_eq!(clears.load(Ordering::SeqCst), 1);

    // Cleared once per match, never between rounds
    run_to_completion(&mut orch, &mut ScriptedPlayer::perfect(1800), None).unwrap();
    assert_eq!(clears.load(Ordering::SeqCst), 1);
}

#[test]
fn test_memory_recorder_receives_final_stats() {
    let memory = MemoryRecorder::new();
    let ctx = MatchContext::arithmetic(GameRules::default()).with_recorder(memory.clone());
    let mut orch = RoundOrchestrator::start_match(config(MatchMode::VsOpponent, 8), ctx, SimulatedClock::new()).unwrap();

    let stats = run_to_completion(&mut orch, &mut ScriptedPlayer::perfect(1800), None).unwrap();

    let records = memory.records();
    assert_eq!(records, vec![stats]);
}

#[test]
fn test_recorder_failure_does_not_block_game_over() {
    let ctx = MatchContext::arithmetic(GameRules::default()).with_recorder(FailingRecorder);
    let mut orch = RoundOrchestrator::start_match(config(MatchMode::VsOpponent, 8), ctx, SimulatedClock::new()).unwrap();

    let stats = run_to_completion(&mut orch, &mut ScriptedPlayer::perfect(1800), None).unwrap();
    assert_eq!(stats.winner, Winner::SideOne);
    assert!(orch.is_over());
}

#[test]
fn test_json_lines_recorder_appends_each_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history").join("matches.jsonl");

    let mut played = Vec::new();
    for seed in [10, 11] {
        let ctx = MatchContext::arithmetic(GameRules::default()).with_recorder(JsonLinesRecorder::new(&path));
        let mut orch =
            RoundOrchestrator::start_match(config(MatchMode::VsOpponent, seed), ctx, SimulatedClock::new()).unwrap();
        played.push(run_to_completion(&mut orch, &mut ScriptedPlayer::perfect(1800), None).unwrap());
    }

    let loaded = JsonLinesRecorder::load_all(&path).unwrap();
    assert_eq!(loaded, played);
}

#[test]
fn test_update_stream_follows_match_flow() {
    let mut orch = RoundOrchestrator::start_match(
        MatchConfig {
            round_limit: 1,
            ..config(MatchMode::TwoPlayer, 2)
        },
        MatchContext::arithmetic(GameRules::default()),
        SimulatedClock::new(),
    )
    .unwrap();

    let correct = orch.current_question().unwrap().correct_index();
    orch.advance_to(1200).unwrap();
    orch.submit_answer(Side::Two, correct);
    orch.advance_to(2600).unwrap();
    orch.submit_answer(Side::One, correct);
    orch.advance_by(5000).unwrap();

    let kinds: Vec<&str> = orch
        .take_updates()
        .iter()
        .map(|u| match u {
            MatchUpdate::QuestionIssued { .. } => "question",
            MatchUpdate::AnswerAccepted { side: Side::One, .. } => "one",
            MatchUpdate::AnswerAccepted { side: Side::Two, .. } => "two",
            MatchUpdate::RoundResolved(_) => "resolved",
            MatchUpdate::MatchEnded(_) => "ended",
        })
        .collect();
    assert_eq!(kinds, vec!["question", "two", "one", "resolved", "ended"]);

    // Side two was faster and critical
    let stats = orch.final_stats().unwrap();
    assert_eq!(stats.winner, Winner::SideTwo);
    assert_eq!(stats.final_hp_one, 75);
    assert_eq!(stats.final_hp_two, 100);
}

#[test]
fn test_snapshot_reflects_progress() {
    let mut orch =
        RoundOrchestrator::start_match(config(MatchMode::VsOpponent, 6), MatchContext::arithmetic(GameRules::default()), SimulatedClock::new())
            .unwrap();

    let snapshot = orch.state();
    assert_eq!(snapshot.state, MatchState::WaitingAnswer);
    assert_eq!(snapshot.round, 1);
    assert_eq!(snapshot.answered, [false, false]);
    assert!(snapshot.question.is_some());

    let correct = snapshot.question.as_ref().unwrap().correct_index();
    orch.advance_to(1000).unwrap();
    orch.submit_answer(Side::One, correct);

    let snapshot = orch.state();
    assert_eq!(snapshot.answered, [true, false]);
    assert_eq!(snapshot.now_ms, 1000);
    assert_eq!(snapshot.hp(Side::Two), 100);

    // Low tier answers within 6000 ms
    orch.advance_to(6000).unwrap();
    let snapshot = orch.state();
    assert_eq!(snapshot.state, MatchState::Attack);
    assert_eq!(snapshot.hp(Side::Two), 75);
    assert!(snapshot.last_outcome.is_some());
}

#[test]
fn test_invalid_rules_rejected_at_start() {
    let mut rules = GameRules::default();
    rules.damage.fast_threshold_ms = rules.damage.critical_threshold_ms;
    let result = RoundOrchestrator::start_match(
        config(MatchMode::VsOpponent, 1),
        MatchContext::arithmetic(rules),
        SimulatedClock::new(),
    );
    assert!(matches!(result, Err(QuizError::InvalidConfig(_))));
}
