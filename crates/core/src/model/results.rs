use serde::{Deserialize, Serialize};

/// Server-returned review record for one missed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongAnswer {
    pub prompt: String,
    pub part_of_speech: Option<String>,
    pub user_answer: String,
    pub correct_answer: String,
}

/// Scored outcome of a submitted quiz. The server is authoritative; the
/// client never recomputes or second-guesses these numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResults {
    pub score: u32,
    pub total_questions: u32,
    pub wrong_answers: Vec<WrongAnswer>,
}

impl QuizResults {
    /// True when every answer was accepted.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.wrong_answers.is_empty() && self.score == self.total_questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_score_has_no_wrong_answers() {
        let results = QuizResults {
            score: 3,
            total_questions: 3,
            wrong_answers: Vec::new(),
        };
        assert!(results.is_perfect());
    }

    #[test]
    fn missed_questions_are_not_perfect() {
        let results = QuizResults {
            score: 2,
            total_questions: 3,
            wrong_answers: vec![WrongAnswer {
                prompt: "苹果".into(),
                part_of_speech: Some("n.".into()),
                user_answer: String::new(),
                correct_answer: "apple".into(),
            }],
        };
        assert!(!results.is_perfect());
    }
}
