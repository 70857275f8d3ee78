use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rand::Rng;
use thiserror::Error;

use crate::quiz::answers::{AnswerError, AnswerSheet};
use crate::quiz::feedback::{classify, FeedbackTier, ThresholdError, Thresholds};
use crate::quiz::gate::{check_complete, Completeness};
use crate::quiz::scoring::score;
use crate::quiz::shuffle::shuffle_questions;
use crate::quiz::Question;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot start a quiz without questions")]
    EmptyBank,
    #[error(transparent)]
    Thresholds(#[from] ThresholdError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error("answers are locked, the quiz was already submitted")]
    AlreadySubmitted,
    #[error("the quiz has not been submitted yet")]
    NotSubmitted,
    #[error("answer question {} before submitting", .position + 1)]
    Incomplete { position: usize },
    #[error("submit confirmation belongs to an earlier attempt")]
    StaleToken,
}

/// Proof that the answer sheet passed the completeness check. Handed out by
/// [`Session::request_submit`] and redeemed by [`Session::confirm_submit`]
/// once the user has confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitToken {
    round: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
    pub correct: Vec<bool>,
    pub tier: FeedbackTier,
    pub ungradable: Vec<usize>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Submitted(QuizResult),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was graded; the user still has to answer `position`.
    Rejected { position: usize },
    /// The user backed out at the confirmation step.
    Declined,
    Graded(QuizResult),
}

/// One attempt at a quiz: the shuffled questions, the answers given so far
/// and, after submission, the frozen result.
#[derive(Debug, Clone)]
pub struct Session {
    bank: Arc<Vec<Question>>,
    thresholds: Thresholds,
    questions: Vec<Question>,
    answers: AnswerSheet,
    state: SessionState,
    round: u64,
}

impl Session {
    pub fn start<R: Rng + ?Sized>(
        bank: Arc<Vec<Question>>,
        thresholds: Thresholds,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        if bank.is_empty() {
            return Err(SessionError::EmptyBank);
        }
        thresholds.check_total(bank.len())?;

        let questions = shuffle_questions(&bank, rng);
        let answers = AnswerSheet::for_questions(&questions);
        debug!("Starting quiz with {} questions", questions.len());

        Ok(Self {
            bank,
            thresholds,
            questions,
            answers,
            state: SessionState::InProgress,
            round: 0,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, position: usize) -> Option<&Question> {
        self.questions.get(position)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn result(&self) -> Option<&QuizResult> {
        match &self.state {
            SessionState::Submitted(result) => Some(result),
            SessionState::InProgress => None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.result().is_some()
    }

    pub fn answers(&self) -> &[Option<usize>] {
        self.answers.slots()
    }

    pub fn answer(&self, position: usize) -> Result<Option<usize>, SessionError> {
        Ok(self.answers.get(position)?)
    }

    pub fn answered(&self) -> usize {
        self.answers.answered()
    }

    pub fn set_answer(&mut self, position: usize, option: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.answers.set(position, option)?;
        Ok(())
    }

    pub fn clear_answers(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.answers.reset();
        Ok(())
    }

    pub fn completeness(&self) -> Completeness {
        check_complete(self.answers.slots())
    }

    /// First phase of submission: checks that every question has an answer.
    pub fn request_submit(&self) -> Result<SubmitToken, SessionError> {
        self.ensure_in_progress()?;
        match self.completeness() {
            Completeness::Complete => Ok(SubmitToken { round: self.round }),
            Completeness::Incomplete { position } => Err(SessionError::Incomplete { position }),
        }
    }

    /// Second phase: grades the attempt and locks it.
    pub fn confirm_submit(&mut self, token: SubmitToken) -> Result<&QuizResult, SessionError> {
        self.ensure_in_progress()?;
        if token.round != self.round {
            return Err(SessionError::StaleToken);
        }
        if let Completeness::Incomplete { position } = self.completeness() {
            return Err(SessionError::Incomplete { position });
        }

        let card = score(&self.questions, self.answers.slots());
        for &position in &card.ungradable {
            warn!(
                "Question {} has an answer key that matches no option, counting it as wrong",
                self.questions[position].id
            );
        }
        let total = self.questions.len();
        let result = QuizResult {
            score: card.total,
            total,
            tier: classify(card.total, &self.thresholds),
            correct: card.correct,
            ungradable: card.ungradable,
            submitted_at: Utc::now(),
        };
        debug!(
            "Quiz submitted: {}/{} ({:?})",
            result.score, result.total, result.tier
        );

        self.state = SessionState::Submitted(result);
        self.result().ok_or(SessionError::NotSubmitted)
    }

    /// Both submission phases in one call, for hosts that can ask the user
    /// synchronously.
    pub fn submit_with<F>(&mut self, confirm: F) -> Result<SubmitOutcome, SessionError>
    where
        F: FnOnce(&Session) -> bool,
    {
        let token = match self.request_submit() {
            Ok(token) => token,
            Err(SessionError::Incomplete { position }) => {
                return Ok(SubmitOutcome::Rejected { position })
            }
            Err(err) => return Err(err),
        };
        if !confirm(self) {
            return Ok(SubmitOutcome::Declined);
        }
        self.confirm_submit(token)
            .map(|result| SubmitOutcome::Graded(result.clone()))
    }

    /// Starts a new attempt over the same bank: fresh order, no answers, no result.
    pub fn retry<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SessionError> {
        if !self.is_submitted() {
            return Err(SessionError::NotSubmitted);
        }
        self.questions = shuffle_questions(&self.bank, rng);
        self.answers = AnswerSheet::for_questions(&self.questions);
        self.state = SessionState::InProgress;
        self.round += 1;
        debug!("Retrying quiz, attempt {}", self.round + 1);
        Ok(())
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::InProgress => Ok(()),
            SessionState::Submitted(_) => Err(SessionError::AlreadySubmitted),
        }
    }
}
