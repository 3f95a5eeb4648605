use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use quiz_core::model::{LessonId, QuestionId, QuizQuestion, QuizType};
use quiz_core::session::SubmissionPayload;
use quiz_core::{QuizResults, WrongAnswer};

use crate::mapping::MappingError;

/// Errors surfaced by quiz backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    /// The server could not be reached, or the request timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server returned status {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    /// The server answered 2xx but refused the operation.
    #[error("server rejected the request: {0}")]
    Rejected(String),

    /// The response body could not be decoded or failed validation.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<MappingError> for BackendError {
    fn from(err: MappingError) -> Self {
        BackendError::Malformed(err.to_string())
    }
}

/// Contract for the quiz server endpoints.
///
/// The controller owns no persisted state; everything it cannot derive
/// locally crosses this seam.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Fetch questions matching the lesson filter, capped at `count`.
    ///
    /// An empty result is returned as-is; the caller decides that zero
    /// questions is not a presentable quiz.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for transport, status, or decode failures.
    async fn fetch_questions(
        &self,
        lessons: &BTreeSet<LessonId>,
        count: u32,
        quiz_type: QuizType,
    ) -> Result<Vec<QuizQuestion>, BackendError>;

    /// Submit collected answers with their session context for scoring.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for transport, status, or decode failures.
    async fn submit_answers(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<QuizResults, BackendError>;

    /// Flip the favorite flag on a vocabulary item, returning the
    /// server-confirmed state.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` when the item does not exist, or
    /// other backend errors.
    async fn toggle_favorite(&self, id: QuestionId) -> Result<bool, BackendError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// One vocabulary row of the in-memory backend.
#[derive(Debug, Clone)]
pub struct VocabularyEntry {
    pub id: QuestionId,
    pub lesson: LessonId,
    pub english: String,
    pub chinese: String,
    pub part_of_speech: Option<String>,
}

impl VocabularyEntry {
    fn prompt(&self, quiz_type: QuizType) -> &str {
        match quiz_type {
            QuizType::CnToEn => &self.chinese,
            QuizType::EnToCn => &self.english,
        }
    }

    fn expected_answer(&self, quiz_type: QuizType) -> &str {
        match quiz_type {
            QuizType::CnToEn => &self.english,
            QuizType::EnToCn => &self.chinese,
        }
    }
}

#[derive(Default)]
struct InMemoryState {
    vocabulary: HashMap<QuestionId, VocabularyEntry>,
    order: Vec<QuestionId>,
    favorites: HashSet<QuestionId>,
    fetch_failure: Option<BackendError>,
    submit_failure: Option<BackendError>,
}

/// Simple in-memory backend for tests and prototyping.
///
/// Scores submissions the way the real server does: trimmed,
/// case-insensitive comparison against the expected answer for the quiz
/// direction named in the submitted context. Failures can be injected to
/// exercise error paths.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seed the vocabulary table, preserving insertion order for fetches.
    pub fn insert(&self, entry: VocabularyEntry) {
        let mut guard = self.lock();
        if !guard.vocabulary.contains_key(&entry.id) {
            guard.order.push(entry.id);
        }
        guard.vocabulary.insert(entry.id, entry);
    }

    /// Make every subsequent fetch fail with the given error, until cleared.
    pub fn fail_fetches_with(&self, err: BackendError) {
        self.lock().fetch_failure = Some(err);
    }

    /// Make every subsequent submission fail with the given error, until
    /// cleared.
    pub fn fail_submissions_with(&self, err: BackendError) {
        self.lock().submit_failure = Some(err);
    }

    /// Clear any injected failures.
    pub fn clear_failures(&self) {
        let mut guard = self.lock();
        guard.fetch_failure = None;
        guard.submit_failure = None;
    }

    /// Current favorite state of an item, for test assertions.
    #[must_use]
    pub fn is_favorite(&self, id: QuestionId) -> bool {
        self.lock().favorites.contains(&id)
    }
}

#[async_trait]
impl QuizBackend for InMemoryBackend {
    async fn fetch_questions(
        &self,
        lessons: &BTreeSet<LessonId>,
        count: u32,
        quiz_type: QuizType,
    ) -> Result<Vec<QuizQuestion>, BackendError> {
        let guard = self.lock();
        if let Some(err) = &guard.fetch_failure {
            return Err(err.clone());
        }

        let mut questions = Vec::new();
        for id in &guard.order {
            if questions.len() >= count as usize {
                break;
            }
            let entry = &guard.vocabulary[id];
            if !lessons.contains(&entry.lesson) {
                continue;
            }
            let question = QuizQuestion::new(
                entry.id,
                entry.lesson,
                entry.prompt(quiz_type),
                entry.part_of_speech.clone(),
                entry.expected_answer(quiz_type),
            )
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
            questions.push(question);
        }
        Ok(questions)
    }

    async fn submit_answers(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<QuizResults, BackendError> {
        let guard = self.lock();
        if let Some(err) = &guard.submit_failure {
            return Err(err.clone());
        }

        let quiz_type = payload.context.quiz_type;
        let mut score = 0_u32;
        let mut total = 0_u32;
        let mut wrong_answers = Vec::new();

        for id in &payload.context.question_ids {
            let Some(entry) = guard.vocabulary.get(id) else {
                continue;
            };
            total += 1;

            let expected = entry.expected_answer(quiz_type);
            let given = payload.answers.get(id).map(String::as_str).unwrap_or("");
            if !given.is_empty() && given.trim().eq_ignore_ascii_case(expected.trim()) {
                score += 1;
            } else {
                wrong_answers.push(WrongAnswer {
                    prompt: entry.prompt(quiz_type).to_string(),
                    part_of_speech: entry.part_of_speech.clone(),
                    user_answer: given.to_string(),
                    correct_answer: expected.to_string(),
                });
            }
        }

        Ok(QuizResults {
            score,
            total_questions: total,
            wrong_answers,
        })
    }

    async fn toggle_favorite(&self, id: QuestionId) -> Result<bool, BackendError> {
        let mut guard = self.lock();
        if !guard.vocabulary.contains_key(&id) {
            return Err(BackendError::Rejected(format!(
                "vocabulary item {id} not found"
            )));
        }

        if guard.favorites.remove(&id) {
            Ok(false)
        } else {
            guard.favorites.insert(id);
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuizContext;
    use std::collections::BTreeMap;

    fn seeded_backend() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        for (id, english, chinese) in [(1, "apple", "苹果"), (2, "banana", "香蕉")] {
            backend.insert(VocabularyEntry {
                id: QuestionId::new(id),
                lesson: LessonId::new(1),
                english: english.to_string(),
                chinese: chinese.to_string(),
                part_of_speech: Some("n.".to_string()),
            });
        }
        backend
    }

    fn payload_for(
        answers: &[(u64, &str)],
        question_ids: &[u64],
        quiz_type: QuizType,
    ) -> SubmissionPayload {
        let answers: BTreeMap<_, _> = answers
            .iter()
            .map(|(id, text)| (QuestionId::new(*id), (*text).to_string()))
            .collect();
        SubmissionPayload {
            answers,
            context: QuizContext::new(
                [LessonId::new(1)].into(),
                quiz_type,
                question_ids.iter().copied().map(QuestionId::new).collect(),
            ),
        }
    }

    #[tokio::test]
    async fn fetch_filters_by_lesson_and_caps_count() {
        let backend = seeded_backend();
        backend.insert(VocabularyEntry {
            id: QuestionId::new(3),
            lesson: LessonId::new(2),
            english: "cat".to_string(),
            chinese: "猫".to_string(),
            part_of_speech: None,
        });

        let lessons: BTreeSet<_> = [LessonId::new(1)].into();
        let questions = backend
            .fetch_questions(&lessons, 10, QuizType::CnToEn)
            .await
            .unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].prompt(), "苹果");

        let capped = backend
            .fetch_questions(&lessons, 1, QuizType::CnToEn)
            .await
            .unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn unmatched_lessons_return_empty_set() {
        let backend = seeded_backend();
        let lessons: BTreeSet<_> = [LessonId::new(99)].into();
        let questions = backend
            .fetch_questions(&lessons, 10, QuizType::CnToEn)
            .await
            .unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn scoring_is_case_insensitive_and_lists_misses() {
        let backend = seeded_backend();
        let payload = payload_for(&[(1, "APPLE"), (2, "pear")], &[1, 2], QuizType::CnToEn);

        let results = backend.submit_answers(&payload).await.unwrap();
        assert_eq!(results.score, 1);
        assert_eq!(results.total_questions, 2);
        assert_eq!(results.wrong_answers.len(), 1);
        assert_eq!(results.wrong_answers[0].correct_answer, "banana");
        assert_eq!(results.wrong_answers[0].user_answer, "pear");
    }

    #[tokio::test]
    async fn empty_answers_are_wrong_answers() {
        let backend = seeded_backend();
        let payload = payload_for(&[(1, ""), (2, "")], &[1, 2], QuizType::CnToEn);

        let results = backend.submit_answers(&payload).await.unwrap();
        assert_eq!(results.score, 0);
        assert_eq!(results.wrong_answers.len(), 2);
    }

    #[tokio::test]
    async fn toggle_favorite_flips_state() {
        let backend = seeded_backend();
        let id = QuestionId::new(1);

        assert!(backend.toggle_favorite(id).await.unwrap());
        assert!(backend.is_favorite(id));
        assert!(!backend.toggle_favorite(id).await.unwrap());
        assert!(!backend.is_favorite(id));
    }

    #[tokio::test]
    async fn toggle_favorite_rejects_unknown_item() {
        let backend = seeded_backend();
        let err = backend.toggle_favorite(QuestionId::new(404)).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
    }

    #[tokio::test]
    async fn injected_failures_surface_and_clear() {
        let backend = seeded_backend();
        backend.fail_fetches_with(BackendError::Status {
            status: 500,
            message: None,
        });

        let lessons: BTreeSet<_> = [LessonId::new(1)].into();
        let err = backend
            .fetch_questions(&lessons, 10, QuizType::CnToEn)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));

        backend.clear_failures();
        assert!(
            backend
                .fetch_questions(&lessons, 10, QuizType::CnToEn)
                .await
                .is_ok()
        );
    }
}
