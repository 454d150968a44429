//! Round orchestrator: the match state machine
//!
//! Drives INIT → QUESTION → WAITING_ANSWER → ATTACK → QUESTION ... →
//! GAME_OVER. Player input arrives through `submit_answer`; everything timed
//! (the opponent's answer, the round timeout, the pause between rounds)
//! arrives through `handle_timer`. Each timer carries the round it was armed
//! for and is claimed against the handle the orchestrator still holds, so a
//! late or cancelled timer never touches a newer round.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::battle::answer::AnswerResult;
use crate::battle::resolver::{resolve, RoundOutcome};
use crate::battle::session::BattleSession;
use crate::core::config::{GameRules, MatchConfig};
use crate::core::error::Result;
use crate::core::types::{MatchId, MatchMode, Millis, RoundNumber, Side, Winner};
use crate::opponent::adaptive::adjust_tier;
use crate::opponent::simulator::OpponentSimulator;
use crate::orchestrator::scheduler::{
    Scheduler, SimulatedClock, TimerEvent, TimerHandle, TimerSlot,
};
use crate::orchestrator::state::{EndReason, MatchSnapshot, MatchState, MatchUpdate};
use crate::orchestrator::stats::{MatchStats, SideStats};
use crate::question::arithmetic::ArithmeticGenerator;
use crate::question::model::Question;
use crate::question::QuestionSource;
use crate::record::{MatchRecorder, NullRecorder};

/// Collaborators a match is started with
pub struct MatchContext {
    pub rules: GameRules,
    pub questions: Box<dyn QuestionSource>,
    pub recorder: Box<dyn MatchRecorder>,
}

impl MatchContext {
    pub fn new(rules: GameRules, questions: Box<dyn QuestionSource>) -> Self {
        Self {
            rules,
            questions,
            recorder: Box::new(NullRecorder),
        }
    }

    /// Multiplication questions, nothing recorded
    pub fn arithmetic(rules: GameRules) -> Self {
        let generator = ArithmeticGenerator::new(rules.generator.clone());
        Self::new(rules, Box::new(generator))
    }

    pub fn with_recorder(mut self, recorder: impl MatchRecorder + 'static) -> Self {
        self.recorder = Box::new(recorder);
        self
    }
}

pub struct RoundOrchestrator<S: Scheduler> {
    id: MatchId,
    config: MatchConfig,
    rules: GameRules,
    seed: u64,
    questions: Box<dyn QuestionSource>,
    recorder: Box<dyn MatchRecorder>,
    scheduler: S,
    rng: ChaCha8Rng,
    /// Present only against the simulated opponent
    opponent: Option<OpponentSimulator>,
    session: BattleSession,

    state: MatchState,
    paused: bool,
    round: RoundNumber,
    question: Option<Question>,
    question_shown_at: Millis,
    answers: [Option<AnswerResult>; 2],
    /// Set once the current round starts resolving
    resolving: bool,

    round_timer: TimerSlot,
    next_round_timer: TimerSlot,

    last_outcome: Option<RoundOutcome>,
    side_stats: [SideStats; 2],
    final_stats: Option<MatchStats>,
    updates: Vec<MatchUpdate>,
}

impl<S: Scheduler> RoundOrchestrator<S> {
    /// Validate the setup, reset both sides to full HP and issue the first
    /// question
    ///
    /// A content failure on the first question is returned as the error; the
    /// match behind it is already over.
    pub fn start_match(config: MatchConfig, ctx: MatchContext, scheduler: S) -> Result<Self> {
        config.validate()?;
        ctx.rules.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        // Each match starts from an empty recent-key window
        let mut questions = ctx.questions;
        questions.clear_history();

        let opponent = match config.mode {
            MatchMode::VsOpponent => Some(OpponentSimulator::new(
                config.difficulty_tier,
                &ctx.rules.opponent,
                seed.wrapping_add(1),
            )),
            MatchMode::TwoPlayer => None,
        };

        let mut orchestrator = Self {
            id: MatchId::new(),
            session: BattleSession::new(ctx.rules.max_hp),
            rules: ctx.rules,
            seed,
            questions,
            recorder: ctx.recorder,
            scheduler,
            rng: ChaCha8Rng::seed_from_u64(seed),
            opponent,
            state: MatchState::Init,
            paused: false,
            round: 0,
            question: None,
            question_shown_at: 0,
            answers: [None, None],
            resolving: false,
            round_timer: TimerSlot::new(),
            next_round_timer: TimerSlot::new(),
            last_outcome: None,
            side_stats: [SideStats::default(); 2],
            final_stats: None,
            updates: Vec::new(),
            config,
        };

        tracing::info!(
            match_id = %orchestrator.id.0,
            mode = ?orchestrator.config.mode,
            level = orchestrator.config.level,
            tier = %orchestrator.config.difficulty_tier,
            seed,
            "Match started"
        );

        orchestrator.enter_question()?;
        Ok(orchestrator)
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn current_state(&self) -> MatchState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn round(&self) -> RoundNumber {
        self.round
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Match clock time the current question was shown (or last resumed)
    pub fn question_shown_at(&self) -> Millis {
        self.question_shown_at
    }

    pub fn has_answered(&self, side: Side) -> bool {
        self.answers[side.index()].is_some()
    }

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn last_outcome(&self) -> Option<&RoundOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn final_stats(&self) -> Option<&MatchStats> {
        self.final_stats.as_ref()
    }

    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    /// Drain notifications produced since the last call
    pub fn take_updates(&mut self) -> Vec<MatchUpdate> {
        std::mem::take(&mut self.updates)
    }

    pub fn state(&self) -> MatchSnapshot {
        MatchSnapshot {
            match_id: self.id,
            mode: self.config.mode,
            state: self.state,
            paused: self.paused,
            round: self.round,
            round_limit: self.config.round_limit,
            max_hp: self.session.max_hp(),
            hp_one: self.session.hp(Side::One),
            hp_two: self.session.hp(Side::Two),
            question: self.question.clone(),
            answered: [self.has_answered(Side::One), self.has_answered(Side::Two)],
            last_outcome: self.last_outcome.clone(),
            winner: self
                .final_stats
                .as_ref()
                .map(|s| s.winner)
                .unwrap_or_default(),
            end_reason: self.final_stats.as_ref().map(|s| s.end_reason),
            now_ms: self.scheduler.now(),
        }
    }

    /// Record a player's pick for the current question
    ///
    /// Ignored (returns false) outside WAITING_ANSWER, while paused, for a
    /// side that already answered, for an index outside the four choices, and
    /// for side two when it is the simulated opponent.
    pub fn submit_answer(&mut self, side: Side, choice_index: usize) -> bool {
        if self.state != MatchState::WaitingAnswer || self.paused || self.resolving {
            tracing::debug!(?side, state = ?self.state, paused = self.paused, "Answer ignored");
            return false;
        }
        if side == Side::Two && self.opponent.is_some() {
            tracing::debug!("Side two is simulated, answer ignored");
            return false;
        }
        if self.has_answered(side) {
            tracing::debug!(?side, round = self.round, "Side already answered");
            return false;
        }

        let Some(choice) = self.question.as_ref().and_then(|q| q.choice(choice_index)) else {
            tracing::debug!(?side, choice_index, "Choice index out of range");
            return false;
        };

        let elapsed = self
            .scheduler
            .now()
            .saturating_sub(self.question_shown_at)
            .min(self.config.round_time_limit_ms);
        let result = AnswerResult::answered(choice.value.clone(), choice.is_correct, elapsed);

        self.accept_answer(side, result);
        true
    }

    /// React to a fired timer
    ///
    /// Timers no longer held by the orchestrator, or armed for another round,
    /// are dropped. Errors only when moving on to the next question fails to
    /// produce content; the match is over by then.
    pub fn handle_timer(&mut self, handle: TimerHandle, event: TimerEvent) -> Result<()> {
        match event {
            TimerEvent::OpponentAnswered { round, result } => {
                let claimed = self
                    .opponent
                    .as_mut()
                    .map_or(false, |opponent| opponent.claim(handle));
                if !claimed || !self.accepting(round) || self.has_answered(Side::Two) {
                    tracing::debug!(round, current = self.round, "Stale opponent answer dropped");
                    return Ok(());
                }

                let mut result = result;
                result.response_time_ms = result.response_time_ms.min(self.config.round_time_limit_ms);
                self.accept_answer(Side::Two, result);
            }
            TimerEvent::RoundTimeout { round } => {
                if !self.round_timer.claim(handle) || !self.accepting(round) {
                    tracing::debug!(round, current = self.round, "Stale round timeout dropped");
                    return Ok(());
                }

                tracing::debug!(round, "Round timed out");
                let limit = self.config.round_time_limit_ms;
                for answer in self.answers.iter_mut().filter(|a| a.is_none()) {
                    *answer = Some(AnswerResult::no_answer(limit));
                }
                self.finalize_round();
            }
            TimerEvent::NextRound { round } => {
                if !self.next_round_timer.claim(handle)
                    || round != self.round
                    || self.state != MatchState::Attack
                    || self.paused
                {
                    tracing::debug!(round, current = self.round, "Stale next-round timer dropped");
                    return Ok(());
                }
                self.enter_question()?;
            }
        }
        Ok(())
    }

    /// Freeze the match; every pending timer is cancelled
    pub fn pause(&mut self) -> bool {
        if self.paused || self.state.is_over() {
            return false;
        }

        self.paused = true;
        self.cancel_timers();
        tracing::info!(round = self.round, state = ?self.state, "Match paused");
        true
    }

    /// Continue a paused match
    ///
    /// In WAITING_ANSWER the round timer restarts with the full limit and
    /// response times count from now. A cancelled opponent answer is not
    /// rescheduled. In ATTACK the next question is scheduled again.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }

        self.paused = false;
        match self.state {
            MatchState::WaitingAnswer => {
                self.question_shown_at = self.scheduler.now();
                self.round_timer.arm(
                    &mut self.scheduler,
                    self.config.round_time_limit_ms,
                    TimerEvent::RoundTimeout { round: self.round },
                );
            }
            MatchState::Attack => {
                self.next_round_timer.arm(
                    &mut self.scheduler,
                    self.config.inter_round_delay_ms,
                    TimerEvent::NextRound { round: self.round },
                );
            }
            _ => {}
        }
        tracing::info!(round = self.round, state = ?self.state, "Match resumed");
        true
    }

    /// Stop the match early; no winner is declared
    pub fn abandon(&mut self) {
        if self.state.is_over() {
            return;
        }
        tracing::info!(round = self.round, "Match abandoned");
        self.finish(Winner::Undecided, EndReason::Abandoned);
    }

    fn accepting(&self, round: RoundNumber) -> bool {
        round == self.round
            && self.state == MatchState::WaitingAnswer
            && !self.paused
            && !self.resolving
    }

    fn accept_answer(&mut self, side: Side, result: AnswerResult) {
        tracing::debug!(
            round = self.round,
            ?side,
            correct = result.is_correct,
            response_ms = result.response_time_ms,
            "Answer accepted"
        );
        self.updates.push(MatchUpdate::AnswerAccepted {
            round: self.round,
            side,
            is_correct: result.is_correct,
            response_time_ms: result.response_time_ms,
        });
        self.answers[side.index()] = Some(result);

        if self.answers.iter().all(Option::is_some) {
            self.finalize_round();
        }
    }

    fn enter_question(&mut self) -> Result<()> {
        self.state = MatchState::Question;
        self.cancel_timers();

        if self.round >= self.config.round_limit {
            let winner = self.session.winner_by_hp();
            self.finish(winner, EndReason::RoundLimit);
            return Ok(());
        }

        let question = match self.questions.generate(self.config.level, &mut self.rng) {
            Ok(question) => question,
            Err(e) => {
                tracing::error!(error = %e, round = self.round + 1, "No question available, ending match");
                self.finish(Winner::Undecided, EndReason::ContentUnavailable);
                return Err(e);
            }
        };

        self.round += 1;
        self.answers = [None, None];
        self.resolving = false;
        self.question_shown_at = self.scheduler.now();

        // Armed before the opponent so an answer landing exactly on the limit
        // loses to the timeout
        self.round_timer.arm(
            &mut self.scheduler,
            self.config.round_time_limit_ms,
            TimerEvent::RoundTimeout { round: self.round },
        );
        if let Some(opponent) = self.opponent.as_mut() {
            opponent.schedule_response(&question, self.round, &mut self.scheduler);
        }

        tracing::debug!(round = self.round, key = question.key(), "Question issued");
        self.updates.push(MatchUpdate::QuestionIssued {
            round: self.round,
            question: question.clone(),
            time_limit_ms: self.config.round_time_limit_ms,
        });
        self.question = Some(question);
        self.state = MatchState::WaitingAnswer;
        Ok(())
    }

    /// Resolve the current round at most once
    fn finalize_round(&mut self) {
        if self.resolving {
            return;
        }
        self.resolving = true;

        self.round_timer.cancel(&mut self.scheduler);
        if let Some(opponent) = self.opponent.as_mut() {
            opponent.cancel(&mut self.scheduler);
        }
        self.state = MatchState::Attack;

        let limit = self.config.round_time_limit_ms;
        let [one, two] = std::mem::take(&mut self.answers)
            .map(|answer| answer.unwrap_or_else(|| AnswerResult::no_answer(limit)));
        self.side_stats[Side::One.index()].record(&one);
        self.side_stats[Side::Two.index()].record(&two);

        let outcome = resolve(
            self.round,
            &one,
            &two,
            &mut self.session,
            &self.rules.damage,
            self.scheduler.now(),
        );
        // Kept so `has_answered` still reads true while in ATTACK
        self.answers = [Some(one), Some(two)];

        tracing::info!(
            round = self.round,
            hp_one = outcome.resulting_hp_one,
            hp_two = outcome.resulting_hp_two,
            "{}",
            outcome.headline()
        );

        let winner = outcome.winner;
        self.last_outcome = Some(outcome.clone());
        self.updates.push(MatchUpdate::RoundResolved(outcome));

        if winner.is_decided() {
            self.finish(winner, EndReason::Knockout);
        } else {
            self.next_round_timer.arm(
                &mut self.scheduler,
                self.config.inter_round_delay_ms,
                TimerEvent::NextRound { round: self.round },
            );
        }
    }

    fn cancel_timers(&mut self) {
        self.round_timer.cancel(&mut self.scheduler);
        self.next_round_timer.cancel(&mut self.scheduler);
        if let Some(opponent) = self.opponent.as_mut() {
            opponent.cancel(&mut self.scheduler);
        }
    }

    fn finish(&mut self, winner: Winner, reason: EndReason) {
        self.cancel_timers();
        self.state = MatchState::GameOver;
        self.paused = false;

        let stats = self.build_stats(winner, reason);
        tracing::info!(
            match_id = %self.id.0,
            ?winner,
            ?reason,
            rounds = stats.rounds_played,
            hp_one = stats.final_hp_one,
            hp_two = stats.final_hp_two,
            "Match over"
        );

        if let Err(e) = self.recorder.record_match_result(&stats) {
            tracing::warn!(error = %e, "Failed to record match result");
        }

        self.updates.push(MatchUpdate::MatchEnded(stats.clone()));
        self.final_stats = Some(stats);
    }

    fn build_stats(&self, winner: Winner, end_reason: EndReason) -> MatchStats {
        let side_one = self.side_stats[Side::One.index()];
        let side_two = self.side_stats[Side::Two.index()];

        let next_tier = if self.opponent.is_some() && side_one.rounds > 0 {
            adjust_tier(
                &self.rules.adaptive,
                self.config.difficulty_tier,
                side_one.accuracy(),
                side_one.avg_response_ms(),
            )
        } else {
            self.config.difficulty_tier
        };

        MatchStats {
            match_id: self.id,
            mode: self.config.mode,
            level: self.config.level,
            seed: self.seed,
            difficulty_tier: self.config.difficulty_tier,
            next_tier,
            winner,
            end_reason,
            rounds_played: side_one.rounds,
            max_hp: self.session.max_hp(),
            final_hp_one: self.session.hp(Side::One),
            final_hp_two: self.session.hp(Side::Two),
            side_one,
            side_two,
            battle: self.session.summary(),
            damage_log: self.session.round_log().to_vec(),
            duration_ms: self.scheduler.now(),
        }
    }
}

impl RoundOrchestrator<SimulatedClock> {
    /// Fire every timer due up to `until` in deadline order, then move the
    /// clock there
    pub fn advance_to(&mut self, until: Millis) -> Result<()> {
        while let Some((handle, event)) = self.scheduler.pop_due(until) {
            self.handle_timer(handle, event)?;
        }
        self.scheduler.set_now(until);
        Ok(())
    }

    pub fn advance_by(&mut self, ms: Millis) -> Result<()> {
        self.advance_to(self.scheduler.now() + ms)
    }

    /// Deadline of the earliest pending timer
    pub fn next_deadline(&self) -> Option<Millis> {
        self.scheduler.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }
}
