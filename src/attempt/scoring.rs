// src/attempt/scoring.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    attempt::ReviewItem,
    quiz::QuizDefinition,
};

/// Outcome of one question, in definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: i64,
    /// `None` when the learner left the question unanswered.
    pub selected_option_id: Option<i64>,
    pub correct_option_id: i64,
    pub is_correct: bool,
}

/// Scoring record for one submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub correct_count: usize,
    pub total_questions: usize,
    /// `round(correct_count / total_questions * 100)`.
    pub percentage: u32,
    /// `correct_count * points_per_question`.
    pub score: u32,
    pub max_score: u32,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Rounded share of correct answers, 0..=100.
pub fn percentage(correct_count: usize, total_questions: usize) -> u32 {
    if total_questions == 0 {
        return 0;
    }
    ((correct_count as f64 / total_questions as f64) * 100.0).round() as u32
}

/// Scores a snapshot of answers against the definition.
///
/// Correctness compares option ids, never option text. Questions with no
/// recorded answer count as incorrect; answers keyed by ids outside the
/// definition are ignored.
pub fn score_answers(definition: &QuizDefinition, answers: &BTreeMap<i64, i64>) -> AttemptResult {
    let outcomes: Vec<QuestionOutcome> = definition
        .questions
        .iter()
        .map(|q| {
            let selected = answers.get(&q.id).copied();
            QuestionOutcome {
                question_id: q.id,
                selected_option_id: selected,
                correct_option_id: q.correct_option_id,
                is_correct: selected == Some(q.correct_option_id),
            }
        })
        .collect();

    let correct_count = outcomes.iter().filter(|o| o.is_correct).count();
    let total_questions = definition.question_count();

    AttemptResult {
        correct_count,
        total_questions,
        percentage: percentage(correct_count, total_questions),
        score: correct_count as u32 * definition.points_per_question,
        max_score: total_questions as u32 * definition.points_per_question,
        outcomes,
    }
}

/// Joins each outcome with its question and option text for the review screen.
pub fn review_items(definition: &QuizDefinition, result: &AttemptResult) -> Vec<ReviewItem> {
    definition
        .questions
        .iter()
        .zip(&result.outcomes)
        .map(|(q, outcome)| ReviewItem {
            question_id: q.id,
            text: q.text.clone(),
            options: q.options.clone(),
            selected_option_id: outcome.selected_option_id,
            selected_text: outcome
                .selected_option_id
                .and_then(|id| q.option(id))
                .map(|o| o.text.clone()),
            correct_option_id: outcome.correct_option_id,
            correct_text: q.option(q.correct_option_id).map(|o| o.text.clone()),
            is_correct: outcome.is_correct,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{Question, QuizOption};

    /// Four questions with ids 1..=4, each with options 1..=4, option 1 correct.
    fn definition(question_count: i64) -> QuizDefinition {
        QuizDefinition {
            id: 1,
            title: "Scoring".to_string(),
            time_budget_seconds: 60,
            points_per_question: 10,
            questions: (1..=question_count)
                .map(|id| Question {
                    id,
                    text: format!("Question {}", id),
                    options: (1..=4)
                        .map(|o| QuizOption {
                            id: o,
                            text: "Same text".to_string(),
                        })
                        .collect(),
                    correct_option_id: 1,
                    points: Some(99),
                })
                .collect(),
        }
    }

    #[test]
    fn test_score_mixed_answers() {
        let def = definition(4);
        let answers = BTreeMap::from([(1, 1), (2, 3), (3, 1)]);

        let result = score_answers(&def, &answers);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.total_questions, 4);
        assert_eq!(result.percentage, 50);
        assert_eq!(result.score, 20);
        assert_eq!(result.max_score, 40);

        let flags: Vec<bool> = result.outcomes.iter().map(|o| o.is_correct).collect();
        assert_eq!(flags, vec![true, false, true, false]);
        assert_eq!(result.outcomes[3].selected_option_id, None);
    }

    #[test]
    fn test_score_ignores_per_question_points() {
        let def = definition(2);
        let result = score_answers(&def, &BTreeMap::from([(1, 1), (2, 1)]));
        assert_eq!(result.score, 20);
    }

    #[test]
    fn test_score_compares_ids_not_text() {
        // Every option has the same text; only the id decides.
        let def = definition(1);
        let result = score_answers(&def, &BTreeMap::from([(1, 2)]));
        assert_eq!(result.correct_count, 0);
    }

    #[test]
    fn test_score_nothing_answered() {
        let def = definition(3);
        let result = score_answers(&def, &BTreeMap::new());
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.percentage, 0);
        assert_eq!(result.outcomes.len(), 3);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_review_items_carry_text() {
        let mut def = definition(2);
        def.questions[0].options[0].text = "Ming".to_string();
        def.questions[0].options[1].text = "Tang".to_string();
        let result = score_answers(&def, &BTreeMap::from([(1, 2)]));

        let items = review_items(&def, &result);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].selected_text.as_deref(), Some("Tang"));
        assert_eq!(items[0].correct_text.as_deref(), Some("Ming"));
        assert!(!items[0].is_correct);
        assert_eq!(items[1].selected_text, None);
    }
}
