//! Conversions between wire DTOs and the domain model.
//!
//! The wire layer never leaks into the domain: questions are validated on
//! the way in, and submission payloads are rendered into the server's
//! string-keyed shape on the way out.

use thiserror::Error;

use quiz_core::model::{LessonId, QuestionError, QuestionId, QuizQuestion};
use quiz_core::session::SubmissionPayload;
use quiz_core::{QuizResults, WrongAnswer};

use crate::wire::{ContextDto, QuestionDto, SubmitRequest, SubmitResponse};

/// A payload that decoded as JSON but fails domain validation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MappingError {
    #[error("question {id} is invalid: {source}")]
    InvalidQuestion {
        id: u64,
        #[source]
        source: QuestionError,
    },
}

/// Validate a fetched question into the domain type.
///
/// # Errors
///
/// Returns `MappingError::InvalidQuestion` when the prompt or correct
/// answer is blank.
pub fn question_from_dto(dto: QuestionDto) -> Result<QuizQuestion, MappingError> {
    QuizQuestion::new(
        QuestionId::new(dto.id),
        LessonId::new(dto.lesson),
        dto.question,
        dto.part_of_speech,
        dto.correct_answer,
    )
    .map_err(|source| MappingError::InvalidQuestion { id: dto.id, source })
}

/// Render a submission payload into the server's request shape.
#[must_use]
pub fn submit_request(payload: &SubmissionPayload) -> SubmitRequest {
    let answers = payload
        .answers
        .iter()
        .map(|(id, text)| (id.to_string(), text.clone()))
        .collect();

    let context = &payload.context;
    SubmitRequest {
        answers,
        quiz_context: ContextDto {
            lesson_ids: context.lesson_ids.iter().map(LessonId::value).collect(),
            quiz_type: context.quiz_type.to_string(),
            question_ids: context
                .question_ids
                .iter()
                .map(QuestionId::value)
                .collect(),
        },
    }
}

/// Convert the server's scored response into domain results.
///
/// A `null` or absent `user_answer` in a wrong-answer record is displayed
/// as "no answer given", so it normalizes to the empty string here.
#[must_use]
pub fn results_from_response(response: SubmitResponse) -> QuizResults {
    QuizResults {
        score: response.score,
        total_questions: response.total_questions,
        wrong_answers: response
            .wrong_answers
            .into_iter()
            .map(|dto| WrongAnswer {
                prompt: dto.question,
                part_of_speech: dto.part_of_speech,
                user_answer: dto.user_answer.unwrap_or_default(),
                correct_answer: dto.correct_answer,
            })
            .collect(),
    }
}
