// src/attempt/controller.rs

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{
    error::AttemptError,
    scoring::{AttemptResult, score_answers},
};
use crate::models::quiz::{Question, QuizDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Submitted,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttemptStatus::NotStarted => "not_started",
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Submitted => "submitted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

/// What a single countdown tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time was deducted; this many seconds remain.
    Running(u32),
    /// The tick used up the last second and submitted the attempt.
    AutoSubmitted,
    /// The attempt is not running; nothing changed.
    Idle,
}

/// The result lives inside the terminal phase, so a submitted attempt
/// always has exactly one result and a running one never has any.
#[derive(Debug, Clone)]
enum Phase {
    NotStarted,
    InProgress,
    Submitted(Arc<AttemptResult>),
}

/// State of one learner's pass through a quiz.
///
/// Status only moves forward (`NotStarted → InProgress → Submitted`). A retake
/// builds a fresh value instead of rewinding this one.
#[derive(Debug, Clone)]
pub struct AttemptState {
    definition: Arc<QuizDefinition>,
    phase: Phase,
    current_question_index: usize,
    answers: BTreeMap<i64, i64>,
    remaining_seconds: u32,
}

impl AttemptState {
    /// Creates a `NotStarted` attempt for the definition.
    pub fn open(definition: Arc<QuizDefinition>) -> Result<Self, AttemptError> {
        if definition.questions.is_empty() {
            return Err(AttemptError::InvalidDefinition(
                "quiz has no questions".to_string(),
            ));
        }
        if definition.time_budget_seconds == 0 {
            return Err(AttemptError::InvalidDefinition(
                "time budget must be positive".to_string(),
            ));
        }

        Ok(Self {
            remaining_seconds: definition.time_budget_seconds,
            definition,
            phase: Phase::NotStarted,
            current_question_index: 0,
            answers: BTreeMap::new(),
        })
    }

    /// Moves a `NotStarted` attempt to `InProgress` with the full time budget.
    pub fn begin(&mut self) -> Result<(), AttemptError> {
        if !matches!(self.phase, Phase::NotStarted) {
            return Err(AttemptError::NotInProgress(self.status()));
        }
        self.phase = Phase::InProgress;
        self.current_question_index = 0;
        self.answers.clear();
        self.remaining_seconds = self.definition.time_budget_seconds;
        Ok(())
    }

    /// Opens and begins a new attempt in one step.
    pub fn start(definition: Arc<QuizDefinition>) -> Result<Self, AttemptError> {
        let mut state = Self::open(definition)?;
        state.begin()?;
        Ok(state)
    }

    /// Same as [`AttemptState::start`]. Nothing from a previous attempt carries over.
    pub fn retake(definition: Arc<QuizDefinition>) -> Result<Self, AttemptError> {
        Self::start(definition)
    }

    pub fn definition(&self) -> &Arc<QuizDefinition> {
        &self.definition
    }

    pub fn status(&self) -> AttemptStatus {
        match self.phase {
            Phase::NotStarted => AttemptStatus::NotStarted,
            Phase::InProgress => AttemptStatus::InProgress,
            Phase::Submitted(_) => AttemptStatus::Submitted,
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, Phase::Submitted(_))
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> &Question {
        &self.definition.questions[self.current_question_index]
    }

    pub fn answers(&self) -> &BTreeMap<i64, i64> {
        &self.answers
    }

    pub fn answer_for(&self, question_id: i64) -> Option<i64> {
        self.answers.get(&question_id).copied()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn result(&self) -> Option<&Arc<AttemptResult>> {
        match &self.phase {
            Phase::Submitted(result) => Some(result),
            _ => None,
        }
    }

    fn ensure_in_progress(&self) -> Result<(), AttemptError> {
        match self.phase {
            Phase::InProgress => Ok(()),
            _ => Err(AttemptError::NotInProgress(self.status())),
        }
    }

    /// Records `option_id` as the answer to `question_id`, replacing any earlier choice.
    pub fn select_answer(&mut self, question_id: i64, option_id: i64) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;

        let question = self
            .definition
            .question(question_id)
            .ok_or(AttemptError::UnknownQuestion(question_id))?;
        if !question.has_option(option_id) {
            return Err(AttemptError::UnknownOption {
                question_id,
                option_id,
            });
        }

        self.answers.insert(question_id, option_id);
        Ok(())
    }

    /// Steps one question forward or back. Stepping past either end is a no-op.
    pub fn navigate(&mut self, direction: Direction) -> Result<usize, AttemptError> {
        self.ensure_in_progress()?;

        let last = self.definition.question_count() - 1;
        self.current_question_index = match direction {
            Direction::Next => (self.current_question_index + 1).min(last),
            Direction::Previous => self.current_question_index.saturating_sub(1),
        };
        Ok(self.current_question_index)
    }

    /// Jumps straight to a question, answered or not.
    pub fn jump_to(&mut self, index: usize) -> Result<usize, AttemptError> {
        self.ensure_in_progress()?;

        let question_count = self.definition.question_count();
        if index >= question_count {
            return Err(AttemptError::QuestionIndexOutOfRange {
                index,
                question_count,
            });
        }
        self.current_question_index = index;
        Ok(index)
    }

    /// Deducts one second. Reaching zero submits the attempt.
    ///
    /// Ticks on an attempt that is not running change nothing, so a late
    /// tick after submission can never submit twice.
    pub fn tick(&mut self) -> TickOutcome {
        if !matches!(self.phase, Phase::InProgress) {
            return TickOutcome::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.finish();
            TickOutcome::AutoSubmitted
        } else {
            TickOutcome::Running(self.remaining_seconds)
        }
    }

    /// Submits the attempt and returns its result.
    ///
    /// Calling this on an already submitted attempt returns the stored
    /// result untouched, whichever caller submitted first.
    pub fn submit(&mut self) -> Result<Arc<AttemptResult>, AttemptError> {
        if let Phase::Submitted(result) = &self.phase {
            return Ok(Arc::clone(result));
        }
        self.ensure_in_progress()?;
        Ok(self.finish())
    }

    fn finish(&mut self) -> Arc<AttemptResult> {
        let result = Arc::new(score_answers(&self.definition, &self.answers));
        self.phase = Phase::Submitted(Arc::clone(&result));
        result
    }
}
