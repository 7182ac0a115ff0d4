// src/attempt/error.rs

use std::fmt;

use super::AttemptStatus;

/// A caller invoked a controller operation against a broken precondition.
///
/// Every variant is a programming error on the caller's side (usually a UI
/// bug); scoring itself never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// The quiz definition cannot back an attempt (no questions, no time).
    InvalidDefinition(String),

    /// The operation needs a running attempt.
    NotInProgress(AttemptStatus),

    /// The question id is not part of the active quiz.
    UnknownQuestion(i64),

    /// The option id does not belong to the given question.
    UnknownOption { question_id: i64, option_id: i64 },

    /// Direct navigation to an index past either end of the question list.
    QuestionIndexOutOfRange { index: usize, question_count: usize },
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::InvalidDefinition(reason) => write!(f, "Invalid quiz definition: {}", reason),
            AttemptError::NotInProgress(status) => {
                write!(f, "Attempt is not in progress (status: {})", status)
            }
            AttemptError::UnknownQuestion(id) => write!(f, "Question {} is not part of this quiz", id),
            AttemptError::UnknownOption {
                question_id,
                option_id,
            } => write!(
                f,
                "Option {} does not belong to question {}",
                option_id, question_id
            ),
            AttemptError::QuestionIndexOutOfRange {
                index,
                question_count,
            } => write!(
                f,
                "Question index {} is out of range (quiz has {} questions)",
                index, question_count
            ),
        }
    }
}

impl std::error::Error for AttemptError {}
