use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::model::{LessonId, QuestionId};

/// Quiz direction: which language the prompt is shown in and which the
/// answer is expected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizType {
    CnToEn,
    EnToCn,
}

impl QuizType {
    /// Wire token used in query parameters and submission payloads.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizType::CnToEn => "cn_to_en",
            QuizType::EnToCn => "en_to_cn",
        }
    }
}

impl fmt::Display for QuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for an unrecognized quiz direction token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQuizType(pub String);

impl fmt::Display for UnknownQuizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quiz type token: {}", self.0)
    }
}

impl std::error::Error for UnknownQuizType {}

impl FromStr for QuizType {
    type Err = UnknownQuizType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cn_to_en" => Ok(QuizType::CnToEn),
            "en_to_cn" => Ok(QuizType::EnToCn),
            other => Err(UnknownQuizType(other.to_string())),
        }
    }
}

/// Context that must accompany a submission so the server can re-validate
/// against the original question set.
///
/// `question_ids` mirrors the order of the session's question list; the
/// session re-derives it immediately before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizContext {
    pub lesson_ids: BTreeSet<LessonId>,
    pub quiz_type: QuizType,
    pub question_ids: Vec<QuestionId>,
}

impl QuizContext {
    #[must_use]
    pub fn new(
        lesson_ids: BTreeSet<LessonId>,
        quiz_type: QuizType,
        question_ids: Vec<QuestionId>,
    ) -> Self {
        Self {
            lesson_ids,
            quiz_type,
            question_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_type_token_roundtrip() {
        for ty in [QuizType::CnToEn, QuizType::EnToCn] {
            let parsed: QuizType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "en_to_fr".parse::<QuizType>().unwrap_err();
        assert_eq!(err, UnknownQuizType("en_to_fr".to_string()));
    }
}
