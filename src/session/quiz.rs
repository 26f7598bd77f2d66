use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::distractor;
use crate::engine::pool::{CombinationPool, FactPair};
use crate::engine::scoring;
use crate::error::SessionError;

/// One multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    pub pair: FactPair,
    pub solution: u32,
    pub proposals: Vec<u32>,
}

/// Final figures of a finished quiz.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSummary {
    pub score: u32,
    pub accuracy: f64,
    pub correct: u32,
    pub total: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum QuestionOutcome {
    Continue(Problem),
    Finished(SessionSummary),
}

/// Expiry of one question's answer window. Only the event matching the
/// question still awaiting an answer has any effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutEvent {
    question: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingAnswer,
    /// Between an answer (or timeout) and the next question.
    Resolved,
    Finished,
}

struct Pending {
    question: u32,
    pair: FactPair,
    solution: u32,
    asked_at: Instant,
    deadline: Instant,
}

/// One play-through: draws problems from a player's pool, times each
/// question and scores the answers.
///
/// At most one question is pending at a time. Answering, timing out and
/// moving on all clear the pending slot, so whichever arrives first wins and
/// anything later is rejected.
pub struct QuizSession<R: Rng> {
    config: EngineConfig,
    rng: R,
    state: SessionState,
    total: u32,
    remaining: u32,
    score: u32,
    correct: u32,
    asked: u32,
    current: Option<Problem>,
    pending: Option<Pending>,
}

impl<R: Rng> QuizSession<R> {
    pub fn new(config: EngineConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            state: SessionState::Idle,
            total: 0,
            remaining: 0,
            score: 0,
            correct: 0,
            asked: 0,
            current: None,
            pending: None,
        }
    }

    pub fn start(&mut self, total: u32) {
        self.state = SessionState::Resolved;
        self.total = total;
        self.remaining = total;
        self.score = 0;
        self.correct = 0;
        self.current = None;
        self.pending = None;
        info!(total, "quiz started");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Share of the questions already handed out.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        1.0 - self.remaining as f64 / self.total as f64
    }

    /// The most recent problem, kept after it is resolved so it can be
    /// revealed.
    pub fn current_problem(&self) -> Option<&Problem> {
        self.current.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn next_question(
        &mut self,
        pool: &CombinationPool,
    ) -> Result<QuestionOutcome, SessionError> {
        self.next_question_at(Instant::now(), pool)
    }

    pub fn next_question_at(
        &mut self,
        now: Instant,
        pool: &CombinationPool,
    ) -> Result<QuestionOutcome, SessionError> {
        match self.state {
            SessionState::Idle => return Err(SessionError::NotStarted),
            SessionState::Finished => return Err(SessionError::Finished),
            SessionState::AwaitingAnswer | SessionState::Resolved => {}
        }

        if let Some(abandoned) = self.pending.take() {
            debug!(question = abandoned.question, "question skipped, timer cancelled");
        }
        self.state = SessionState::Resolved;

        if self.remaining == 0 {
            let summary = self.summary();
            self.state = SessionState::Finished;
            info!(
                score = summary.score,
                correct = summary.correct,
                total = summary.total,
                "quiz finished"
            );
            return Ok(QuestionOutcome::Finished(summary));
        }

        let pair = pool.draw(&mut self.rng);
        let solution = pair.solution();
        let proposals =
            distractor::build_proposals(&mut self.rng, solution, self.config.proposal_count)?;
        let problem = Problem {
            pair,
            solution,
            proposals,
        };

        self.asked += 1;
        self.pending = Some(Pending {
            question: self.asked,
            pair,
            solution,
            asked_at: now,
            deadline: now + self.config.timeout,
        });
        self.current = Some(problem.clone());
        self.remaining -= 1;
        self.state = SessionState::AwaitingAnswer;
        debug!(%pair, question = self.asked, remaining = self.remaining, "question armed");

        Ok(QuestionOutcome::Continue(problem))
    }

    pub fn check_answer(
        &mut self,
        candidate: u32,
        pool: &mut CombinationPool,
    ) -> Result<bool, SessionError> {
        self.check_answer_at(candidate, Instant::now(), pool)
    }

    /// Score `candidate` against the pending question. Answers arriving when
    /// no question is pending are rejected and change nothing. An answer at or
    /// after the deadline loses to the timer: it is handled as a timeout and
    /// returns `false`.
    pub fn check_answer_at(
        &mut self,
        candidate: u32,
        now: Instant,
        pool: &mut CombinationPool,
    ) -> Result<bool, SessionError> {
        let pending = self.take_pending()?;
        if now >= pending.deadline {
            pool.reinforce_wrong(pending.pair, &mut self.rng);
            debug!(
                pair = %pending.pair,
                question = pending.question,
                candidate,
                "answer after deadline, counted as timeout"
            );
            return Ok(false);
        }
        let fraction = scoring::elapsed_fraction(
            now.saturating_duration_since(pending.asked_at),
            self.config.timeout,
        );

        let is_correct = candidate == pending.solution;
        if is_correct {
            self.correct += 1;
            self.score += scoring::correct_answer_points(self.config.correct_points, fraction);
            pool.reinforce_correct(pending.pair);
        } else {
            pool.reinforce_wrong(pending.pair, &mut self.rng);
        }
        debug!(
            pair = %pending.pair,
            candidate,
            is_correct,
            elapsed_fraction = fraction,
            score = self.score,
            "answer checked"
        );
        Ok(is_correct)
    }

    /// The timeout event for the pending question once its deadline has
    /// passed.
    pub fn poll_timeout(&self, now: Instant) -> Option<TimeoutEvent> {
        self.pending
            .as_ref()
            .filter(|p| now >= p.deadline)
            .map(|p| TimeoutEvent {
                question: p.question,
            })
    }

    /// Treat an expired question as a wrong answer. Returns `false` for a
    /// stale event whose question was already answered or replaced.
    pub fn handle_timeout(&mut self, event: TimeoutEvent, pool: &mut CombinationPool) -> bool {
        let pending = match self.pending.take() {
            Some(p) if p.question == event.question => p,
            other => {
                self.pending = other;
                warn!(question = event.question, "ignoring stale timeout");
                return false;
            }
        };

        self.state = SessionState::Resolved;
        let pair = pending.pair;
        pool.reinforce_wrong(pair, &mut self.rng);
        debug!(%pair, question = event.question, "question timed out");
        true
    }

    fn take_pending(&mut self) -> Result<Pending, SessionError> {
        match self.state {
            SessionState::Idle => Err(SessionError::NotStarted),
            SessionState::Finished => Err(SessionError::Finished),
            SessionState::Resolved => {
                warn!("answer arrived with no pending question");
                Err(SessionError::NoPendingQuestion)
            }
            SessionState::AwaitingAnswer => {
                self.state = SessionState::Resolved;
                self.pending.take().ok_or(SessionError::NoPendingQuestion)
            }
        }
    }

    fn summary(&self) -> SessionSummary {
        let accuracy = if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        };
        SessionSummary {
            score: self.score,
            accuracy,
            correct: self.correct,
            total: self.total,
        }
    }
}
