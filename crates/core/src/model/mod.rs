mod bank;
mod ids;
mod question;
mod result;
mod seen;

pub use bank::{BankError, Category, QuestionBank};
pub use ids::{ParseIdError, QuestionId, UserId};
pub use question::{OPTION_COUNT, Question, QuestionDraft, QuestionError};
pub use result::{EXAM_CATEGORY_LABEL, QuizMode, QuizResult, QuizResultError};
pub use seen::SeenQuestions;
