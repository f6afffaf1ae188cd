pub mod admin;
pub mod loaders;
pub mod question;
pub mod session;
pub mod wire;

pub use admin::{BackupInfo, Envelope, QuestionDraft, QuestionRef};
pub use loaders::{load_question_set, LoadedQuestionSet};
pub use question::{
    AnswerResult, AnswerSubmission, NextQuestion, Question, QuestionTurn, RemainingTime,
    SubmitOutcome, TimeStatus,
};
pub use session::SessionProgress;

#[cfg(test)]
pub(crate) mod test_support {
    use super::question::{AnswerResult, Question, QuestionTurn};

    pub(crate) fn sample_question() -> Question {
        Question {
            text: "Qual é a capital do Brasil?".to_string(),
            options: vec![
                "São Paulo".to_string(),
                "Brasília".to_string(),
                "Rio de Janeiro".to_string(),
                "Salvador".to_string(),
            ],
            correct_answer: "Brasília".to_string(),
            category: "Geografia".to_string(),
            difficulty: "facil".to_string(),
            explanation: Some("  ".to_string()),
            reference: None,
            subject: None,
            topic: None,
        }
    }

    pub(crate) fn turn(index: usize, total: usize) -> QuestionTurn {
        QuestionTurn {
            question: sample_question(),
            index,
            total,
            points: 0,
        }
    }

    pub(crate) fn answer(correct: bool, points: i64) -> AnswerResult {
        AnswerResult {
            correct,
            correct_answer: "Brasília".to_string(),
            points,
            explanation: None,
            is_last: false,
        }
    }
}
