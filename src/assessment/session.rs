use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    classify_by_percentage, score_answers, select_recommendations, Answer, AssessmentType,
    Locale, Questionnaire, Recommendation, RecommendationRule, Severity,
};
use crate::error::{AssessmentError, EngineResult};

/// Outcome of a completed assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub score: f64,
    pub max_score: f64,
    pub percentage: u8,
    pub severity: Severity,
    pub recommendations: Vec<Recommendation>,
    /// Set exactly when `severity` is [`Severity::Emergency`].
    pub emergency: bool,
    /// i18n key of the summary message.
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl AssessmentResult {
    /// Score, classify and pick recommendations for `answers`.
    pub fn evaluate(
        questionnaire: &Questionnaire,
        answers: &[Answer],
        rules: &[RecommendationRule],
    ) -> Self {
        let summary = score_answers(&questionnaire.questions, answers);
        let severity = classify_by_percentage(summary.percentage);

        Self {
            score: summary.score,
            max_score: summary.max_score,
            percentage: summary.percentage,
            severity,
            recommendations: select_recommendations(severity, answers, rules),
            emergency: severity == Severity::Emergency,
            message: format!("assessment.results.{}.message", severity),
            created_at: Utc::now(),
        }
    }
}

/// One user's run through a questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: String,
    pub assessment_type: AssessmentType,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AssessmentResult>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub locale: Locale,
}

impl AssessmentSession {
    /// Start an empty session.
    pub fn new(assessment_type: AssessmentType, locale: Locale) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            assessment_type,
            answers: Vec::new(),
            result: None,
            started_at: Utc::now(),
            completed_at: None,
            locale,
        }
    }

    /// Whether the session has been sealed.
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Current answer to a question.
    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// Store an answer, replacing any earlier answer to the same question.
    pub fn record_answer(&mut self, answer: Answer) -> EngineResult<()> {
        self.ensure_open()?;
        match self
            .answers
            .iter_mut()
            .find(|a| a.question_id == answer.question_id)
        {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }
        Ok(())
    }

    /// Required questions of `questionnaire` this session has not answered.
    pub fn missing_required(&self, questionnaire: &Questionnaire) -> Vec<String> {
        questionnaire
            .required_ids()
            .filter(|id| self.answer(id).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Attach the result and mark the session completed.
    pub fn seal(&mut self, result: AssessmentResult) -> EngineResult<()> {
        self.ensure_open()?;
        self.completed_at = Some(result.created_at);
        self.result = Some(result);
        Ok(())
    }

    /// Copy with answers only: no result, not completed.
    pub fn without_result(&self) -> Self {
        Self {
            result: None,
            completed_at: None,
            ..self.clone()
        }
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.is_completed() {
            return Err(AssessmentError::SessionCompleted {
                session_id: self.id.clone(),
            });
        }
        Ok(())
    }
}
