//! Built-in questionnaires.

use super::{AssessmentType, Question, QuestionType, Questionnaire};

/// Id of the built-in pain-impact questionnaire.
pub const PAIN_IMPACT_QUESTIONNAIRE_ID: &str = "pain_impact_v1";

fn title(id: &str) -> String {
    format!("painImpact.questions.{}.title", id)
}

fn single(id: &str, options: &[(&str, f64)]) -> Question {
    options.iter().fold(
        Question::new(id, QuestionType::Single, title(id)),
        |q, (value, weight)| {
            q.with_option(*value, format!("painImpact.questions.{}.options.{}", id, value), *weight)
        },
    )
}

fn multiple(id: &str, options: &[(&str, f64)]) -> Question {
    Question {
        question_type: QuestionType::Multiple,
        ..single(id, options)
    }
}

/// The period-pain impact questionnaire.
///
/// Maximum score is 20.5; the lowest option everywhere scores 0.
pub fn pain_impact_questionnaire() -> Questionnaire {
    Questionnaire::new(
        PAIN_IMPACT_QUESTIONNAIRE_ID,
        AssessmentType::PainImpact,
        vec![
            single(
                "pain_intensity",
                &[("low", 0.0), ("moderate", 1.0), ("high", 2.0), ("extreme", 3.0)],
            )
            .with_weight(2.0)
            .required(),
            single(
                "pain_duration",
                &[("less_than_day", 0.0), ("one_to_two_days", 1.0), ("more_than_two_days", 2.0)],
            )
            .required(),
            multiple(
                "symptoms",
                &[
                    ("none", 0.0),
                    ("nausea", 1.0),
                    ("headache", 1.0),
                    ("fatigue", 1.0),
                    ("diarrhea", 1.0),
                    ("dizziness", 2.0),
                ],
            )
            .required(),
            single(
                "work_impact",
                &[
                    ("no_impact", 0.0),
                    ("reduced_productivity", 1.0),
                    ("needed_breaks", 2.0),
                    ("missed_work", 3.0),
                ],
            )
            .with_weight(1.5)
            .required(),
            single(
                "medication_response",
                &[("effective", 0.0), ("partial", 1.0), ("ineffective", 2.0), ("not_taken", 0.0)],
            ),
            Question::new("stress_level", QuestionType::Range, title("stress_level")).with_range(0.0, 10.0),
            single(
                "exercise_frequency",
                &[("daily", 0.0), ("weekly", 0.0), ("rarely", 0.0), ("never", 0.0)],
            )
            .with_weight(0.0),
            Question::new("notes", QuestionType::Text, title("notes")),
        ],
    )
}
