//! JSON shapes exchanged with the quiz server.
//!
//! Field names mirror the server contract exactly: `/api/quiz` returns an
//! array of question objects, `/api/submit_quiz` takes `{answers,
//! quiz_context}` with stringified question-id keys, and every failure path
//! carries an `{error}` body.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One question from the `/api/quiz` response. Missing required fields fail
/// deserialization, which the client surfaces as a malformed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDto {
    pub id: u64,
    pub lesson: u32,
    pub question: String,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    pub correct_answer: String,
}

/// Session context attached to a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextDto {
    pub lesson_ids: Vec<u32>,
    pub quiz_type: String,
    pub question_ids: Vec<u64>,
}

/// Body of `POST /api/submit_quiz`. Answer keys are question ids rendered
/// as strings, the way the browser client sent them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub answers: BTreeMap<String, String>,
    pub quiz_context: ContextDto,
}

/// One entry of the server's wrong-answer review list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrongAnswerDto {
    pub question: String,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub user_answer: Option<String>,
    pub correct_answer: String,
}

/// Scored response of `POST /api/submit_quiz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub score: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub wrong_answers: Vec<WrongAnswerDto>,
}

/// Failure body used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Response of the per-item favorite toggle endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteResponse {
    pub success: bool,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}
