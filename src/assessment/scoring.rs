use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Answer, AnswerValue, Question, QuestionType, NONE_OPTION};

/// Weighted score of a set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: f64,
    pub max_score: f64,
    /// `round(score / max_score * 100)`, clamped to `0..=100`.
    pub percentage: u8,
}

/// Highest score a question can contribute.
pub fn question_max(question: &Question) -> f64 {
    let raw = match question.question_type {
        QuestionType::Single | QuestionType::Scale => question.max_option_weight(),
        QuestionType::Multiple => question
            .options
            .iter()
            .filter(|o| !o.is_none_sentinel())
            .map(|o| o.weight)
            .sum(),
        QuestionType::Text | QuestionType::Range | QuestionType::Boolean => 0.0,
    };
    raw * question.weight
}

/// Score contributed by one answer to `question`.
pub fn question_score(question: &Question, value: &AnswerValue) -> f64 {
    let raw = match (question.question_type, value) {
        (QuestionType::Single, AnswerValue::Number(n)) => question
            .find_option_by_number(*n)
            .map_or(0.0, |o| o.weight),
        (QuestionType::Single, AnswerValue::Text(text)) => {
            question.find_option(text).map_or(0.0, |o| o.weight)
        }
        (QuestionType::Multiple, value) => value
            .selections()
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|v| *v != NONE_OPTION)
            .filter_map(|v| question.find_option(v))
            .map(|o| o.weight)
            .sum(),
        (QuestionType::Scale, value) => value.as_number().unwrap_or(0.0),
        _ => 0.0,
    };
    raw * question.weight
}

/// Sum of [`question_max`] over `questions`.
pub fn max_possible_score(questions: &[Question]) -> f64 {
    questions.iter().map(question_max).sum()
}

/// `round(score / max * 100)` clamped to `0..=100`; `0` when `max` is not positive.
pub fn percentage_of(score: f64, max_score: f64) -> u8 {
    if max_score <= 0.0 || !score.is_finite() {
        return 0;
    }
    (score / max_score * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Score `answers` against `questions`.
///
/// Answers to questions not in the list are ignored.
pub fn score_answers(questions: &[Question], answers: &[Answer]) -> ScoreSummary {
    let score: f64 = answers
        .iter()
        .filter_map(|answer| {
            questions
                .iter()
                .find(|q| q.id == answer.question_id)
                .map(|q| question_score(q, &answer.value))
        })
        .sum();
    let max_score = max_possible_score(questions);
    let percentage = percentage_of(score, max_score);

    debug!(score, max_score, percentage, answers = answers.len(), "Scored answers");

    ScoreSummary {
        score,
        max_score,
        percentage,
    }
}
