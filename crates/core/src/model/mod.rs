mod context;
mod ids;
mod question;
mod results;

pub use context::{QuizContext, QuizType, UnknownQuizType};
pub use ids::{LessonId, ParseIdError, QuestionId};
pub use question::{QuestionError, QuizQuestion};
pub use results::{QuizResults, WrongAnswer};
