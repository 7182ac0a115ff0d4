// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    config::{DEFAULT_POINTS_PER_QUESTION, MAX_OPTIONS_PER_QUESTION, MIN_OPTIONS_PER_QUESTION},
    error::AppError,
    utils::html::clean_html,
};

/// One selectable answer. Ids are unique within the owning question only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: i64,
    pub text: String,
}

/// A single-choice question inside a quiz definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The prompt shown to the learner.
    pub text: String,

    /// Options in display order.
    pub options: Vec<QuizOption>,

    /// Id of the one correct entry in `options`.
    pub correct_option_id: i64,

    /// Per-question weight. Stored for completeness; scoring ignores it and
    /// applies the quiz-wide `points_per_question` to every question.
    #[serde(default)]
    pub points: Option<u32>,
}

impl Question {
    pub fn option(&self, option_id: i64) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn has_option(&self, option_id: i64) -> bool {
        self.option(option_id).is_some()
    }
}

/// Immutable quiz template consumed by an attempt.
///
/// Question order is significant: it defines numbering, navigation order
/// and the order of per-question outcomes in a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub id: i64,
    pub title: String,
    pub time_budget_seconds: u32,
    pub points_per_question: u32,
    pub questions: Vec<Question>,
}

impl QuizDefinition {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Row returned when listing quizzes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub time_budget_seconds: i32,
    pub question_count: i64,
}

/// DTO for sending a question to the client (excludes the correct option).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub options: Vec<QuizOption>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }
}

/// DTO for sending a whole quiz to the client before an attempt.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub time_budget_seconds: u32,
    pub points_per_question: u32,
    pub questions: Vec<PublicQuestion>,
}

impl From<&QuizDefinition> for PublicQuiz {
    fn from(def: &QuizDefinition) -> Self {
        Self {
            id: def.id,
            title: def.title.clone(),
            time_budget_seconds: def.time_budget_seconds,
            points_per_question: def.points_per_question,
            questions: def.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// DTO for creating a new quiz. Also the format of the startup seed file.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1, max = 86400))]
    pub time_budget_seconds: u32,
    #[validate(range(min = 1, max = 1000))]
    pub points_per_question: Option<u32>,
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// DTO for one question of a new quiz.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_option: usize,
    #[validate(range(min = 1, max = 1000))]
    pub points: Option<u32>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < MIN_OPTIONS_PER_QUESTION {
        return Err(validator::ValidationError::new("too_few_options"));
    }
    if options.len() > MAX_OPTIONS_PER_QUESTION {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// A validated, sanitized quiz ready to be assigned ids by a repository.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub time_budget_seconds: u32,
    pub points_per_question: u32,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    pub points: Option<u32>,
}

impl NewQuestion {
    /// Option ids are the 1-based display positions.
    pub fn numbered_options(&self) -> Vec<QuizOption> {
        self.options
            .iter()
            .zip(1..)
            .map(|(text, id)| QuizOption {
                id,
                text: text.clone(),
            })
            .collect()
    }

    pub fn correct_option_id(&self) -> Result<i64, AppError> {
        i64::try_from(self.correct_option)
            .ok()
            .and_then(|index| index.checked_add(1))
            .ok_or_else(|| {
                AppError::BadRequest(format!("correct_option {} is out of range", self.correct_option))
            })
    }
}

impl CreateQuizRequest {
    /// Validates the request and strips unsafe markup from every text field.
    pub fn into_new_quiz(self) -> Result<NewQuiz, AppError> {
        if let Err(validation_errors) = self.validate() {
            return Err(AppError::BadRequest(validation_errors.to_string()));
        }
        if self.questions.is_empty() {
            return Err(AppError::BadRequest(
                "A quiz needs at least one question".to_string(),
            ));
        }

        let mut questions = Vec::with_capacity(self.questions.len());
        for (index, q) in self.questions.into_iter().enumerate() {
            if q.correct_option >= q.options.len() {
                return Err(AppError::BadRequest(format!(
                    "Question {}: correct_option {} is out of range",
                    index + 1,
                    q.correct_option
                )));
            }
            questions.push(NewQuestion {
                text: clean_html(&q.text),
                options: q.options.iter().map(|o| clean_html(o)).collect(),
                correct_option: q.correct_option,
                points: q.points,
            });
        }

        Ok(NewQuiz {
            title: clean_html(&self.title),
            time_budget_seconds: self.time_budget_seconds,
            points_per_question: self
                .points_per_question
                .unwrap_or(DEFAULT_POINTS_PER_QUESTION),
            questions,
        })
    }
}
