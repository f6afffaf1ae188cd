pub mod question_set;

pub use question_set::{load_question_set, LoadedQuestionSet, QuestionSet, RejectedEntry};
