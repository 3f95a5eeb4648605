use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{LessonId, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("question has no correct answer")]
    EmptyAnswer,
}

/// A single quiz question as supplied by the server.
///
/// Read-only to the client. `correct_answer` is carried for post-submission
/// review display only; the server is the scoring authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    id: QuestionId,
    lesson: LessonId,
    prompt: String,
    part_of_speech: Option<String>,
    correct_answer: String,
}

impl QuizQuestion {
    /// Build a question, validating that prompt and answer are non-blank.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` or `QuestionError::EmptyAnswer`
    /// when the respective field is empty after trimming.
    pub fn new(
        id: QuestionId,
        lesson: LessonId,
        prompt: impl Into<String>,
        part_of_speech: Option<String>,
        correct_answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        let correct_answer = correct_answer.into();
        if correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }

        let part_of_speech = part_of_speech.filter(|p| !p.trim().is_empty());

        Ok(Self {
            id,
            lesson,
            prompt,
            part_of_speech,
            correct_answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn lesson(&self) -> LessonId {
        self.lesson
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn part_of_speech(&self) -> Option<&str> {
        self.part_of_speech.as_deref()
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_optional_part_of_speech() {
        let q = QuizQuestion::new(
            QuestionId::new(1),
            LessonId::new(3),
            "苹果",
            Some("n.".to_string()),
            "apple",
        )
        .unwrap();

        assert_eq!(q.prompt(), "苹果");
        assert_eq!(q.part_of_speech(), Some("n."));
        assert_eq!(q.correct_answer(), "apple");
    }

    #[test]
    fn blank_part_of_speech_normalizes_to_none() {
        let q = QuizQuestion::new(QuestionId::new(1), LessonId::new(1), "Q", Some("  ".into()), "A")
            .unwrap();
        assert_eq!(q.part_of_speech(), None);
    }

    #[test]
    fn rejects_empty_prompt() {
        let err =
            QuizQuestion::new(QuestionId::new(1), LessonId::new(1), "   ", None, "A").unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn rejects_empty_answer() {
        let err =
            QuizQuestion::new(QuestionId::new(1), LessonId::new(1), "Q", None, "").unwrap_err();
        assert_eq!(err, QuestionError::EmptyAnswer);
    }
}
