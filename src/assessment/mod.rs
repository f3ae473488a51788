//! Assessment engine.
//!
//! This module provides the scoring side of the product:
//! - [`Question`]/[`Answer`] model with the `"none"` sentinel for multi-selects
//! - [`score_answers`]: weighted scoring with a percentage of the maximum
//! - [`Severity`] and [`RiskLevel`]: two independent classification strategies
//! - [`select_recommendations`]: severity table plus answer-driven add-ons
//! - [`PainImpactCalculator`]: session lifecycle with tiered persistence
//! - [`analyze_symptoms`] and [`combine`]: symptom risk and the merged view
//!
//! Everything user-facing is an i18n key; rendering happens elsewhere.

mod builtins;
mod calculator;
mod comprehensive;
mod history;
mod questions;
mod recommendations;
mod scoring;
mod session;
mod severity;
mod symptoms;

pub use builtins::*;
pub use calculator::*;
pub use comprehensive::*;
pub use history::*;
pub use questions::*;
pub use recommendations::*;
pub use scoring::*;
pub use session::*;
pub use severity::*;
pub use symptoms::*;

use serde::{Deserialize, Serialize};

/// Interface language of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Simplified Chinese.
    Zh,
}

impl Locale {
    /// Get the locale code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "zh" => Ok(Locale::Zh),
            _ => Err(format!("Unknown locale: {}", s)),
        }
    }
}

/// Kind of assessment a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    /// Period-pain impact questionnaire.
    PainImpact,
    /// Symptom checklist.
    Symptom,
    /// Pain impact and symptoms together.
    Comprehensive,
}

impl AssessmentType {
    /// Get the assessment type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::PainImpact => "pain_impact",
            AssessmentType::Symptom => "symptom",
            AssessmentType::Comprehensive => "comprehensive",
        }
    }
}

impl std::fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssessmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pain_impact" => Ok(AssessmentType::PainImpact),
            "symptom" => Ok(AssessmentType::Symptom),
            "comprehensive" => Ok(AssessmentType::Comprehensive),
            _ => Err(format!("Unknown assessment type: {}", s)),
        }
    }
}
