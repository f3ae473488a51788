//! Questions, options and answers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AssessmentType;
use crate::error::{AssessmentError, EngineResult};

/// Value of the exclusive "none of these" option in multi-select questions.
pub const NONE_OPTION: &str = "none";

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Exactly one option.
    Single,
    /// Any number of options.
    Multiple,
    /// Integer scale `1..=N`, scored by value.
    Scale,
    /// Free text, never scored.
    Text,
    /// Numeric slider, never scored.
    Range,
    /// Yes/no, never scored.
    Boolean,
}

/// Stored value of an option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Number(i64),
    Text(String),
}

impl OptionValue {
    /// Whether a textual answer selects this option.
    ///
    /// Numeric options also match their decimal spelling.
    pub fn matches_text(&self, text: &str) -> bool {
        match self {
            OptionValue::Text(value) => value == text,
            OptionValue::Number(n) => text.trim().parse::<i64>().map_or(false, |t| t == *n),
        }
    }

    /// Whether a numeric answer selects this option.
    pub fn matches_number(&self, number: f64) -> bool {
        match self {
            OptionValue::Number(n) => (*n as f64 - number).abs() < f64::EPSILON,
            OptionValue::Text(value) => value.trim().parse::<f64>().map_or(false, |v| v == number),
        }
    }

    /// Whether this is the exclusive `"none"` option.
    pub fn is_none_sentinel(&self) -> bool {
        matches!(self, OptionValue::Text(value) if value == NONE_OPTION)
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Number(n) => write!(f, "{}", n),
            OptionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Number(value)
    }
}

/// One selectable option of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Value recorded in answers.
    pub value: OptionValue,
    /// i18n key of the option label.
    pub label: String,
    /// Score contributed when selected.
    pub weight: f64,
}

impl QuestionOption {
    /// Create an option.
    pub fn new(value: impl Into<OptionValue>, label: impl Into<String>, weight: f64) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            weight,
        }
    }

    /// Whether this is the exclusive `"none"` option.
    pub fn is_none_sentinel(&self) -> bool {
        self.value.is_none_sentinel()
    }
}

/// Answer constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

fn default_weight() -> f64 {
    1.0
}

/// A questionnaire question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique id within the questionnaire.
    pub id: String,
    /// Answer shape.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// i18n key of the question text.
    pub title: String,
    /// Multiplier applied to option weights.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Selectable options, empty for text/range/boolean.
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    /// Answer constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

impl Question {
    /// Create a question with weight 1 and no options.
    pub fn new(id: impl Into<String>, question_type: QuestionType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question_type,
            title: title.into(),
            weight: 1.0,
            options: Vec::new(),
            validation: None,
        }
    }

    /// Create a `1..=points` scale whose option weights equal their values.
    pub fn scale(id: impl Into<String>, title: impl Into<String>, points: i64) -> Self {
        let id = id.into();
        let options = (1..=points.max(1))
            .map(|value| {
                QuestionOption::new(value, format!("{}.scale.{}", id, value), value as f64)
            })
            .collect();
        Self {
            options,
            ..Self::new(id, QuestionType::Scale, title)
        }
    }

    /// Add an option.
    pub fn with_option(
        mut self,
        value: impl Into<OptionValue>,
        label: impl Into<String>,
        weight: f64,
    ) -> Self {
        self.options.push(QuestionOption::new(value, label, weight));
        self
    }

    /// Set the question weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Mark the question as required.
    pub fn required(mut self) -> Self {
        self.validation.get_or_insert_with(Validation::default).required = true;
        self
    }

    /// Constrain numeric answers to `[min, max]`.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        let validation = self.validation.get_or_insert_with(Validation::default);
        validation.min = Some(min);
        validation.max = Some(max);
        self
    }

    /// Whether an answer is mandatory.
    pub fn is_required(&self) -> bool {
        self.validation.as_ref().map_or(false, |v| v.required)
    }

    /// Option selected by a textual value.
    pub fn find_option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value.matches_text(value))
    }

    /// Option selected by a numeric value.
    pub fn find_option_by_number(&self, value: f64) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value.matches_number(value))
    }

    /// Largest single option weight, `0.0` without options.
    pub fn max_option_weight(&self) -> f64 {
        self.options.iter().map(|o| o.weight).fold(0.0, f64::max)
    }

    /// Numeric bounds: explicit validation first, then the option range for scales.
    pub fn numeric_bounds(&self) -> (Option<f64>, Option<f64>) {
        let explicit = self
            .validation
            .as_ref()
            .map(|v| (v.min, v.max))
            .unwrap_or((None, None));

        if self.question_type != QuestionType::Scale {
            return explicit;
        }

        let values: Vec<f64> = self
            .options
            .iter()
            .filter_map(|o| match o.value {
                OptionValue::Number(n) => Some(n as f64),
                OptionValue::Text(_) => None,
            })
            .collect();
        let option_min = values.iter().copied().reduce(f64::min);
        let option_max = values.iter().copied().reduce(f64::max);
        (explicit.0.or(option_min), explicit.1.or(option_max))
    }

    /// Check that `value` is an acceptable answer to this question.
    pub fn validate_answer(&self, value: &AnswerValue) -> EngineResult<()> {
        let invalid = |reason: String| Err(AssessmentError::validation(self.id.clone(), reason));

        match (self.question_type, value) {
            (QuestionType::Single, AnswerValue::Text(text)) => {
                if self.find_option(text).is_none() {
                    return invalid(format!("'{}' is not an option", text));
                }
            }
            (QuestionType::Single, AnswerValue::Number(n)) => {
                if self.find_option_by_number(*n).is_none() {
                    return invalid(format!("{} is not an option", n));
                }
            }
            (QuestionType::Multiple, AnswerValue::Many(values)) => {
                if values.is_empty() && self.is_required() {
                    return invalid("select at least one option".to_string());
                }
                if let Some(unknown) = values.iter().find(|v| self.find_option(v).is_none()) {
                    return invalid(format!("'{}' is not an option", unknown));
                }
                if values.iter().collect::<HashSet<_>>().len() != values.len() {
                    return invalid("options must not repeat".to_string());
                }
                if values.len() > 1 && values.iter().any(|v| v == NONE_OPTION) {
                    return invalid(format!("'{}' cannot be combined with other options", NONE_OPTION));
                }
            }
            (QuestionType::Scale | QuestionType::Range, value) => {
                let Some(n) = value.as_number() else {
                    return invalid("expected a number".to_string());
                };
                if !n.is_finite() {
                    return invalid("expected a finite number".to_string());
                }
                if self.question_type == QuestionType::Scale && n.fract() != 0.0 {
                    return invalid(format!("{} is not a whole scale point", n));
                }
                let (min, max) = self.numeric_bounds();
                if min.map_or(false, |min| n < min) || max.map_or(false, |max| n > max) {
                    return invalid(format!(
                        "{} is outside {}..={}",
                        n,
                        min.map_or("-inf".to_string(), |m| m.to_string()),
                        max.map_or("inf".to_string(), |m| m.to_string())
                    ));
                }
            }
            (QuestionType::Text, AnswerValue::Text(text)) => {
                if self.is_required() && text.trim().is_empty() {
                    return invalid("must not be empty".to_string());
                }
            }
            (QuestionType::Boolean, AnswerValue::Flag(_)) => {}
            (question_type, _) => {
                return invalid(format!("wrong answer shape for {:?} question", question_type));
            }
        }
        Ok(())
    }
}

/// A recorded answer value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Many(Vec<String>),
}

impl AnswerValue {
    /// Numeric reading of the answer; numeric strings count.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            AnswerValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Selected values: a list as-is, a single text as a one-element list.
    pub fn selections(&self) -> Vec<&str> {
        match self {
            AnswerValue::Many(values) => values.iter().map(String::as_str).collect(),
            AnswerValue::Text(text) => vec![text.as_str()],
            _ => Vec::new(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Flag(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        AnswerValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// An answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
    pub timestamp: DateTime<Utc>,
}

impl Answer {
    /// Create an answer timestamped now.
    pub fn new(question_id: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self {
            question_id: question_id.into(),
            value: value.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Toggle `value` in a multi-select, keeping `"none"` exclusive.
///
/// Selecting `"none"` clears everything else, selecting anything else drops
/// `"none"`, and selecting an already-selected value deselects it.
pub fn toggle_selection(current: &[String], value: &str) -> Vec<String> {
    if current.iter().any(|v| v == value) {
        return current.iter().filter(|v| *v != value).cloned().collect();
    }
    if value == NONE_OPTION {
        return vec![NONE_OPTION.to_string()];
    }
    current
        .iter()
        .filter(|v| *v != NONE_OPTION)
        .cloned()
        .chain(std::iter::once(value.to_string()))
        .collect()
}

/// An ordered set of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: String,
    pub assessment_type: AssessmentType,
    pub questions: Vec<Question>,
}

impl Questionnaire {
    /// Create a questionnaire.
    pub fn new(id: impl Into<String>, assessment_type: AssessmentType, questions: Vec<Question>) -> Self {
        Self {
            id: id.into(),
            assessment_type,
            questions,
        }
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Ids of required questions, in order.
    pub fn required_ids(&self) -> impl Iterator<Item = &str> {
        self.questions
            .iter()
            .filter(|q| q.is_required())
            .map(|q| q.id.as_str())
    }

    /// Check structural invariants: unique ids, non-negative weights and a
    /// zero-weight `"none"` option.
    pub fn validate(&self) -> EngineResult<()> {
        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(AssessmentError::validation(
                    question.id.clone(),
                    "duplicate question id",
                ));
            }
            if question.weight < 0.0 || !question.weight.is_finite() {
                return Err(AssessmentError::validation(
                    question.id.clone(),
                    "question weight must be non-negative",
                ));
            }
            for option in &question.options {
                if option.weight < 0.0 || !option.weight.is_finite() {
                    return Err(AssessmentError::validation(
                        question.id.clone(),
                        format!("option '{}' has a negative weight", option.value),
                    ));
                }
                if option.is_none_sentinel() && option.weight != 0.0 {
                    return Err(AssessmentError::validation(
                        question.id.clone(),
                        format!("'{}' option must have weight 0", NONE_OPTION),
                    ));
                }
            }
        }
        Ok(())
    }
}
