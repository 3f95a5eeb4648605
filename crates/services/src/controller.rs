use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::QuizBackend;
use quiz_core::model::{LessonId, QuestionId, QuizResults, QuizType};
use quiz_core::session::{QuizSession, SessionError, SessionPhase};

use crate::error::QuizError;

type Listener = Arc<dyn Fn(SessionPhase) + Send + Sync>;

/// Drives a single quiz session around the two network calls.
///
/// Cheap to clone: every handle shares the same session, so a rendering
/// layer can hold one clone per event handler. The session lock is never
/// held across an await, and the session's generation token guards every
/// response applied after one: a `reset` issued while a request is in
/// flight makes the eventual response land dead instead of reviving a
/// stale session.
///
/// At most one request is in flight at a time: starting a quiz is only
/// legal from the idle and error phases and submitting only from the
/// displaying phase, so a second call while loading or submitting fails
/// with a transition error, the same contract the browser client got from
/// disabled buttons.
#[derive(Clone)]
pub struct QuizController {
    backend: Arc<dyn QuizBackend>,
    session: Arc<Mutex<QuizSession>>,
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl QuizController {
    #[must_use]
    pub fn new(backend: Arc<dyn QuizBackend>) -> Self {
        Self {
            backend,
            session: Arc::new(Mutex::new(QuizSession::new())),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a phase-transition listener.
    ///
    /// Listeners are invoked after every phase change, outside of every
    /// controller lock, on the task that drove the transition. A listener
    /// may call back into the controller, including `reset` and
    /// `subscribe`.
    pub fn subscribe(&self, listener: impl Fn(SessionPhase) + Send + Sync + 'static) {
        self.lock_listeners().push(Arc::new(listener));
    }

    /// Fetch questions for the given lessons and enter the displaying
    /// phase.
    ///
    /// Input validation failures leave the session untouched and issue no
    /// request. Fetch failures and an empty result set move the session to
    /// the error phase with a descriptive message. If the session was
    /// reset while the request was in flight, the response is discarded
    /// and `Ok(())` is returned.
    ///
    /// # Errors
    ///
    /// `QuizError::NoLessonsSelected` / `QuizError::InvalidCount` for bad
    /// inputs, `QuizError::Session` when a quiz is already running,
    /// `QuizError::EmptyResult` for a zero-question fetch, and
    /// `QuizError::Backend` for transport, status, or decode failures.
    pub async fn start_quiz(
        &self,
        lessons: BTreeSet<LessonId>,
        count: u32,
        quiz_type: QuizType,
    ) -> Result<(), QuizError> {
        if lessons.is_empty() {
            return Err(QuizError::NoLessonsSelected);
        }
        if count == 0 {
            return Err(QuizError::InvalidCount);
        }

        let generation = self.lock_session().begin_loading()?;
        self.notify(SessionPhase::Loading);

        let fetched = self
            .backend
            .fetch_questions(&lessons, count, quiz_type)
            .await;

        let mut session = self.lock_session();
        if session.generation() != generation {
            tracing::debug!("discarding quiz fetch response for a reset session");
            return Ok(());
        }

        match fetched {
            Ok(questions) => match session.questions_loaded(questions, lessons, quiz_type) {
                Ok(()) => {
                    drop(session);
                    self.notify(SessionPhase::Displaying);
                    Ok(())
                }
                Err(SessionError::Empty) => {
                    drop(session);
                    self.notify(SessionPhase::Error);
                    Err(QuizError::EmptyResult)
                }
                Err(other) => Err(other.into()),
            },
            Err(err) => {
                session.load_failed(err.to_string())?;
                drop(session);
                self.notify(SessionPhase::Error);
                Err(err.into())
            }
        }
    }

    /// Store the user's answer for a displayed question.
    ///
    /// An id outside the current question set is logged and ignored; it is
    /// not a session failure.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` outside the displaying phase.
    pub fn record_answer(&self, id: QuestionId, text: &str) -> Result<(), QuizError> {
        let known = self.lock_session().record_answer(id, text)?;
        if !known {
            tracing::warn!(%id, "ignoring answer for a question not in this quiz");
        }
        Ok(())
    }

    /// Submit the collected answers for server-side scoring.
    ///
    /// Unanswered questions are submitted as empty strings and the context
    /// question ids are re-derived from the displayed set before anything
    /// leaves the client. On failure the session returns to the displaying
    /// phase with every answer intact, so a retry sends an identical
    /// payload. Returns `Ok(None)` when the session was reset while the
    /// request was in flight and the response was discarded.
    ///
    /// # Errors
    ///
    /// `QuizError::Session` for precondition failures (wrong phase, no
    /// questions, missing context), which never reach the network, and
    /// `QuizError::Backend` for transport, status, or decode failures.
    pub async fn submit(&self) -> Result<Option<QuizResults>, QuizError> {
        let (payload, generation) = {
            let mut session = self.lock_session();
            let payload = session.begin_submit()?;
            (payload, session.generation())
        };
        self.notify(SessionPhase::Submitting);

        let outcome = self.backend.submit_answers(&payload).await;

        let mut session = self.lock_session();
        if session.generation() != generation {
            tracing::debug!("discarding submission response for a reset session");
            return Ok(None);
        }

        match outcome {
            Ok(results) => {
                session.submit_succeeded(results.clone())?;
                drop(session);
                self.notify(SessionPhase::ShowingResults);
                Ok(Some(results))
            }
            Err(err) => {
                session.submit_failed(err.to_string())?;
                drop(session);
                self.notify(SessionPhase::Displaying);
                Err(err.into())
            }
        }
    }

    /// Discard all session data and return to idle. Always legal,
    /// idempotent, and fatal to any response still in flight.
    pub fn reset(&self) {
        self.lock_session().reset();
        self.notify(SessionPhase::Idle);
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.lock_session().phase()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock_session().last_error().map(str::to_string)
    }

    #[must_use]
    pub fn results(&self) -> Option<QuizResults> {
        self.lock_session().results().cloned()
    }

    /// Owned copy of the full session state for a rendering pass.
    #[must_use]
    pub fn snapshot(&self) -> QuizSession {
        self.lock_session().clone()
    }

    fn lock_session(&self) -> MutexGuard<'_, QuizSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, phase: SessionPhase) {
        // Snapshot first: invoking under the lock would deadlock any
        // listener that re-enters the controller.
        let snapshot: Vec<Listener> = self.lock_listeners().iter().map(Arc::clone).collect();
        for listener in &snapshot {
            listener(phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{InMemoryBackend, VocabularyEntry};

    fn seeded_controller() -> QuizController {
        let backend = InMemoryBackend::new();
        backend.insert(VocabularyEntry {
            id: QuestionId::new(1),
            lesson: LessonId::new(1),
            english: "apple".to_string(),
            chinese: "苹果".to_string(),
            part_of_speech: Some("n.".to_string()),
        });
        QuizController::new(Arc::new(backend))
    }

    fn lessons(ids: &[u32]) -> BTreeSet<LessonId> {
        ids.iter().copied().map(LessonId::new).collect()
    }

    #[tokio::test]
    async fn listeners_observe_every_transition() {
        let controller = seeded_controller();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.subscribe(move |phase| sink.lock().unwrap().push(phase));

        controller
            .start_quiz(lessons(&[1]), 10, QuizType::CnToEn)
            .await
            .unwrap();
        controller.submit().await.unwrap();
        controller.reset();

        let phases = seen.lock().unwrap().clone();
        assert_eq!(
            phases,
            vec![
                SessionPhase::Loading,
                SessionPhase::Displaying,
                SessionPhase::Submitting,
                SessionPhase::ShowingResults,
                SessionPhase::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn empty_lesson_selection_never_touches_the_session() {
        let controller = seeded_controller();
        let err = controller
            .start_quiz(BTreeSet::new(), 10, QuizType::CnToEn)
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::NoLessonsSelected));
        assert_eq!(controller.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn listener_may_reset_the_controller_reentrantly() {
        let controller = seeded_controller();
        let handle = controller.clone();
        controller.subscribe(move |phase| {
            if phase == SessionPhase::ShowingResults {
                handle.reset();
            }
        });

        controller
            .start_quiz(lessons(&[1]), 10, QuizType::CnToEn)
            .await
            .unwrap();
        let results = controller.submit().await.unwrap();

        assert!(results.is_some());
        assert_eq!(controller.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn listener_may_subscribe_reentrantly() {
        let controller = seeded_controller();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handle = controller.clone();
        let sink = Arc::clone(&seen);
        controller.subscribe(move |phase| {
            if phase == SessionPhase::Loading {
                let sink = Arc::clone(&sink);
                handle.subscribe(move |phase| sink.lock().unwrap().push(phase));
            }
        });

        controller
            .start_quiz(lessons(&[1]), 10, QuizType::CnToEn)
            .await
            .unwrap();

        // The nested listener was registered during the loading
        // notification and sees the next transition.
        assert_eq!(seen.lock().unwrap().clone(), vec![SessionPhase::Displaying]);
    }

    #[tokio::test]
    async fn zero_count_is_rejected_locally() {
        let controller = seeded_controller();
        let err = controller
            .start_quiz(lessons(&[1]), 0, QuizType::CnToEn)
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::InvalidCount));
        assert_eq!(controller.phase(), SessionPhase::Idle);
    }
}
