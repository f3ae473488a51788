use serde::{Deserialize, Serialize};

use super::{Answer, AnswerValue, RiskLevel, Severity};

/// A recommendation, identified by id, rendered through its i18n keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title_key: String,
    pub description_key: String,
}

impl Recommendation {
    /// Create a recommendation with keys `recommendations.<id>.title|description`.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title_key: format!("recommendations.{}.title", id),
            description_key: format!("recommendations.{}.description", id),
            id,
        }
    }
}

/// Base recommendation ids for a severity band.
pub fn severity_recommendation_ids(severity: Severity) -> &'static [&'static str] {
    match severity {
        Severity::Mild => &["heat_therapy", "gentle_exercise", "hydration"],
        Severity::Moderate => &[
            "heat_therapy",
            "otc_pain_relief",
            "track_symptoms",
            "dietary_adjustments",
        ],
        Severity::Severe => &[
            "consult_gynecologist",
            "prescription_options",
            "track_symptoms",
            "work_accommodation",
        ],
        Severity::Emergency => &["seek_immediate_care", "emergency_contacts"],
    }
}

/// Recommendation ids for a symptom risk level.
pub fn risk_recommendation_ids(risk: RiskLevel) -> &'static [&'static str] {
    match risk {
        RiskLevel::Low => &["self_care", "track_symptoms"],
        RiskLevel::Medium => &["schedule_checkup", "track_symptoms", "lifestyle_adjustments"],
        RiskLevel::High => &["see_doctor_soon", "prepare_symptom_log", "pain_management_plan"],
        RiskLevel::Emergency => &["seek_immediate_care", "emergency_contacts", "do_not_wait"],
    }
}

/// Test applied to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Condition {
    /// Numeric answer strictly greater.
    GreaterThan(f64),
    /// Numeric answer strictly less.
    LessThan(f64),
    /// Text answer equal, or numeric answer equal when the value parses.
    Equals(String),
    /// Multi-select answer contains the value.
    Includes(String),
}

impl Condition {
    /// Whether `value` satisfies the condition.
    pub fn matches(&self, value: &AnswerValue) -> bool {
        match self {
            Condition::GreaterThan(limit) => value.as_number().map_or(false, |n| n > *limit),
            Condition::LessThan(limit) => value.as_number().map_or(false, |n| n < *limit),
            Condition::Equals(expected) => match value {
                AnswerValue::Text(text) => text == expected,
                AnswerValue::Number(n) => expected.parse::<f64>().map_or(false, |e| e == *n),
                AnswerValue::Flag(flag) => expected.parse::<bool>().map_or(false, |e| e == *flag),
                AnswerValue::Many(_) => false,
            },
            Condition::Includes(expected) => value.selections().iter().any(|v| v == expected),
        }
    }
}

/// Adds a recommendation when an answer meets a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub question_id: String,
    pub condition: Condition,
    pub recommendation: String,
}

impl RecommendationRule {
    pub fn new(
        question_id: impl Into<String>,
        condition: Condition,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            condition,
            recommendation: recommendation.into(),
        }
    }

    /// Whether any answer to this rule's question meets its condition.
    pub fn applies(&self, answers: &[Answer]) -> bool {
        answers
            .iter()
            .filter(|a| a.question_id == self.question_id)
            .any(|a| self.condition.matches(&a.value))
    }
}

/// Add-on rules for the pain-impact questionnaire.
pub fn default_rules() -> Vec<RecommendationRule> {
    vec![
        RecommendationRule::new("stress_level", Condition::GreaterThan(7.0), "stress_management"),
        RecommendationRule::new(
            "exercise_frequency",
            Condition::Equals("never".to_string()),
            "regular_exercise",
        ),
        RecommendationRule::new("symptoms", Condition::Includes("nausea".to_string()), "anti_nausea_care"),
        RecommendationRule::new(
            "work_impact",
            Condition::Equals("missed_work".to_string()),
            "workplace_accommodation",
        ),
    ]
}

fn push_unique(list: &mut Vec<Recommendation>, id: &str) {
    if !list.iter().any(|r| r.id == id) {
        list.push(Recommendation::new(id));
    }
}

/// Severity table first, then rule add-ons in rule order, without duplicates.
pub fn select_recommendations(
    severity: Severity,
    answers: &[Answer],
    rules: &[RecommendationRule],
) -> Vec<Recommendation> {
    let mut selected = Vec::new();
    for id in severity_recommendation_ids(severity) {
        push_unique(&mut selected, id);
    }
    for rule in rules.iter().filter(|rule| rule.applies(answers)) {
        push_unique(&mut selected, &rule.recommendation);
    }
    selected
}

/// Recommendations for a symptom risk level.
pub fn risk_recommendations(risk: RiskLevel) -> Vec<Recommendation> {
    risk_recommendation_ids(risk)
        .iter()
        .map(|id| Recommendation::new(*id))
        .collect()
}
