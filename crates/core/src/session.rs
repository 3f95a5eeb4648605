use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use crate::model::{LessonId, QuestionId, QuizContext, QuizQuestion, QuizResults, QuizType};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this quiz")]
    Empty,

    #[error("quiz context is missing or incomplete")]
    MissingContext,

    #[error("cannot {action} while session is {from}")]
    InvalidTransition {
        from: SessionPhase,
        action: &'static str,
    },
}

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Lifecycle phase of a quiz session.
///
/// Exactly one of `Loading`, `Displaying`, `Submitting`, `ShowingResults`
/// is ever active; `Idle` and `Error` are the only phases reachable without
/// a loaded question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Idle,
    Loading,
    Displaying,
    Submitting,
    ShowingResults,
    Error,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Loading => "loading",
            SessionPhase::Displaying => "displaying",
            SessionPhase::Submitting => "submitting",
            SessionPhase::ShowingResults => "showing-results",
            SessionPhase::Error => "error",
        };
        f.write_str(name)
    }
}

//
// ─── SUBMISSION PAYLOAD ────────────────────────────────────────────────────────
//

/// Everything the server needs to score a quiz: one answer entry per
/// question (unanswered questions map to the empty string) plus the session
/// context for re-validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub answers: BTreeMap<QuestionId, String>,
    pub context: QuizContext,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// The quiz session state machine.
///
/// Pure data plus transitions: no I/O, no rendering knowledge. A controller
/// drives it around the two network calls and a rendering layer observes
/// the phase it reports.
///
/// Lifecycle: `Idle` → `begin_loading` → `Loading` →
/// `questions_loaded`/`load_failed` → `Displaying`/`Error`;
/// `Displaying` → `begin_submit` → `Submitting` →
/// `submit_succeeded`/`submit_failed` → `ShowingResults`/`Displaying`;
/// `reset` returns to `Idle` from anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    phase: SessionPhase,
    questions: Vec<QuizQuestion>,
    answers: BTreeMap<QuestionId, String>,
    context: Option<QuizContext>,
    results: Option<QuizResults>,
    last_error: Option<String>,
    generation: u64,
}

impl QuizSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            questions: Vec::new(),
            answers: BTreeMap::new(),
            context: None,
            results: None,
            last_error: None,
            generation: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, String> {
        &self.answers
    }

    #[must_use]
    pub fn context(&self) -> Option<&QuizContext> {
        self.context.as_ref()
    }

    #[must_use]
    pub fn results(&self) -> Option<&QuizResults> {
        self.results.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Monotonic token identifying the current lifecycle run.
    ///
    /// Bumped by `begin_loading` and `reset`; a response captured under an
    /// older generation must be discarded instead of applied.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Enter `Loading` ahead of a question fetch.
    ///
    /// Legal from `Idle` and from `Error` (the retry path). Clears any
    /// previous error message.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from any other phase; in
    /// particular a session already `Loading` or `Submitting` rejects the
    /// call, which is the single-in-flight-request guarantee.
    pub fn begin_loading(&mut self) -> Result<u64, SessionError> {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Error => {
                self.last_error = None;
                self.generation += 1;
                self.phase = SessionPhase::Loading;
                Ok(self.generation)
            }
            from => Err(SessionError::InvalidTransition {
                from,
                action: "start a quiz",
            }),
        }
    }

    /// Accept a fetched question set and enter `Displaying`.
    ///
    /// Derives `context.question_ids` from the question order and clears
    /// any previously recorded answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` (and enters `Error`) when the server
    /// returned zero questions: an empty quiz is a degenerate state, never
    /// presented as a valid "0 of 0" run.
    /// Returns `SessionError::InvalidTransition` outside `Loading`.
    pub fn questions_loaded(
        &mut self,
        questions: Vec<QuizQuestion>,
        lesson_ids: BTreeSet<LessonId>,
        quiz_type: QuizType,
    ) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Loading {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "load questions",
            });
        }

        if questions.is_empty() {
            self.phase = SessionPhase::Error;
            self.last_error = Some(SessionError::Empty.to_string());
            return Err(SessionError::Empty);
        }

        let question_ids = questions.iter().map(QuizQuestion::id).collect();
        self.context = Some(QuizContext::new(lesson_ids, quiz_type, question_ids));
        self.questions = questions;
        self.answers.clear();
        self.results = None;
        self.phase = SessionPhase::Displaying;
        Ok(())
    }

    /// Record a fetch failure and enter `Error`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Loading`.
    pub fn load_failed(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Loading {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "fail a load",
            });
        }
        self.phase = SessionPhase::Error;
        self.last_error = Some(message.into());
        Ok(())
    }

    /// Store the user's answer for a displayed question, trimmed of
    /// surrounding whitespace.
    ///
    /// Returns `Ok(false)` without storing anything when the id does not
    /// belong to the current question set; callers may log this, it is not
    /// a session failure.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Displaying`.
    pub fn record_answer(
        &mut self,
        id: QuestionId,
        text: &str,
    ) -> Result<bool, SessionError> {
        if self.phase != SessionPhase::Displaying {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "record an answer",
            });
        }

        if !self.questions.iter().any(|q| q.id() == id) {
            return Ok(false);
        }

        self.answers.insert(id, text.trim().to_string());
        Ok(true)
    }

    /// Build the submission payload and enter `Submitting`.
    ///
    /// The payload carries exactly one entry per question (recorded text
    /// for answered questions, the empty string for the rest) and the
    /// context with `question_ids` re-derived from the current question
    /// order, guarding against any prior desync.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Displaying`,
    /// `SessionError::Empty` when no questions are held, and
    /// `SessionError::MissingContext` when the context was never populated
    /// or names no lessons. All of these fail before any network traffic.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, SessionError> {
        if self.phase != SessionPhase::Displaying {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "submit",
            });
        }
        if self.questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let context = self.context.as_mut().ok_or(SessionError::MissingContext)?;
        if context.lesson_ids.is_empty() {
            return Err(SessionError::MissingContext);
        }
        context.question_ids = self.questions.iter().map(QuizQuestion::id).collect();

        let answers = self
            .questions
            .iter()
            .map(|q| {
                let text = self.answers.get(&q.id()).cloned().unwrap_or_default();
                (q.id(), text)
            })
            .collect();

        let payload = SubmissionPayload {
            answers,
            context: context.clone(),
        };

        self.phase = SessionPhase::Submitting;
        Ok(payload)
    }

    /// Record a submission failure and return to `Displaying`.
    ///
    /// Questions, answers, and context are all retained so the user can
    /// resubmit without retyping anything.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Submitting`.
    pub fn submit_failed(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Submitting {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "fail a submission",
            });
        }
        self.phase = SessionPhase::Displaying;
        self.last_error = Some(message.into());
        Ok(())
    }

    /// Accept the server's scored results and enter `ShowingResults`.
    ///
    /// The submitted question set is consumed exactly once: questions,
    /// answers, and context are cleared immediately, so a second submission
    /// without a fresh quiz start is a transition error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside `Submitting`.
    pub fn submit_succeeded(&mut self, results: QuizResults) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Submitting {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "complete a submission",
            });
        }
        self.results = Some(results);
        self.questions.clear();
        self.answers.clear();
        self.context = None;
        self.last_error = None;
        self.phase = SessionPhase::ShowingResults;
        Ok(())
    }

    /// Discard all session data and return to `Idle`.
    ///
    /// Always legal, idempotent. Bumps the generation so any response still
    /// in flight is discarded when it lands.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.questions.clear();
        self.answers.clear();
        self.context = None;
        self.results = None;
        self.last_error = None;
        self.generation += 1;
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
