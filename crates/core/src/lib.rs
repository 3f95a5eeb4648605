#![forbid(unsafe_code)]

pub mod model;
pub mod session;

pub use model::{
    LessonId, ParseIdError, QuestionError, QuestionId, QuizContext, QuizQuestion, QuizResults,
    QuizType, UnknownQuizType, WrongAnswer,
};
pub use session::{QuizSession, SessionError, SessionPhase, SubmissionPayload};
