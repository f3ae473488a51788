use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    classify_by_symptom_counts, risk_recommendations, Recommendation, RiskCounts, RiskLevel,
    SymptomRisk,
};

/// Body system a symptom belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomCategory {
    Pain,
    Bleeding,
    Systemic,
    Digestive,
}

/// One catalog symptom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SymptomItem {
    pub id: &'static str,
    pub risk: SymptomRisk,
    pub category: SymptomCategory,
}

impl SymptomItem {
    /// i18n key of the symptom label.
    pub fn label_key(&self) -> String {
        format!("medicalCareGuide.symptoms.{}", self.id)
    }
}

const fn item(id: &'static str, risk: SymptomRisk, category: SymptomCategory) -> SymptomItem {
    SymptomItem { id, risk, category }
}

/// Symptoms the checker knows about.
pub const SYMPTOM_CATALOG: &[SymptomItem] = &[
    item("severe_sudden_pain", SymptomRisk::Emergency, SymptomCategory::Pain),
    item("heavy_bleeding_soaking", SymptomRisk::Emergency, SymptomCategory::Bleeding),
    item("fainting", SymptomRisk::Emergency, SymptomCategory::Systemic),
    item("high_fever", SymptomRisk::Emergency, SymptomCategory::Systemic),
    item("pain_not_relieved_by_medication", SymptomRisk::High, SymptomCategory::Pain),
    item("pain_worsening_each_cycle", SymptomRisk::High, SymptomCategory::Pain),
    item("pain_during_intercourse", SymptomRisk::High, SymptomCategory::Pain),
    item("irregular_bleeding_between_periods", SymptomRisk::High, SymptomCategory::Bleeding),
    item("nausea_vomiting", SymptomRisk::Medium, SymptomCategory::Digestive),
    item("heavy_clots", SymptomRisk::Medium, SymptomCategory::Bleeding),
    item("fatigue_affecting_daily_life", SymptomRisk::Medium, SymptomCategory::Systemic),
    item("digestive_changes", SymptomRisk::Medium, SymptomCategory::Digestive),
    item("lower_back_pain", SymptomRisk::Medium, SymptomCategory::Pain),
];

/// Look up a catalog symptom.
pub fn find_symptom(id: &str) -> Option<&'static SymptomItem> {
    SYMPTOM_CATALOG.iter().find(|s| s.id == id)
}

/// How soon care should be sought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CareUrgency {
    Routine,
    Soon,
    Urgent,
    Immediate,
}

impl From<RiskLevel> for CareUrgency {
    fn from(risk: RiskLevel) -> Self {
        match risk {
            RiskLevel::Low => CareUrgency::Routine,
            RiskLevel::Medium => CareUrgency::Soon,
            RiskLevel::High => CareUrgency::Urgent,
            RiskLevel::Emergency => CareUrgency::Immediate,
        }
    }
}

/// Result of [`analyze_symptoms`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomAnalysis {
    pub risk_level: RiskLevel,
    pub should_see_doctor: bool,
    pub urgency: CareUrgency,
    pub emergency_symptoms: Vec<String>,
    pub high_risk_symptoms: Vec<String>,
    pub medium_risk_symptoms: Vec<String>,
    /// Selected ids not in the catalog.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

/// Classify a selection of catalog symptom ids.
///
/// Repeated ids count once; ids outside the catalog are reported in
/// `unrecognized` and do not affect the risk.
pub fn analyze_symptoms<S: AsRef<str>>(selected: &[S]) -> SymptomAnalysis {
    let mut emergency_symptoms = Vec::new();
    let mut high_risk_symptoms = Vec::new();
    let mut medium_risk_symptoms = Vec::new();
    let mut unrecognized = Vec::new();
    let mut counts = RiskCounts::default();

    for id in selected.iter().map(AsRef::as_ref) {
        let bucket = match find_symptom(id) {
            Some(symptom) => match symptom.risk {
                SymptomRisk::Emergency => &mut emergency_symptoms,
                SymptomRisk::High => &mut high_risk_symptoms,
                SymptomRisk::Medium => &mut medium_risk_symptoms,
            },
            None => &mut unrecognized,
        };
        if bucket.iter().any(|existing: &String| existing == id) {
            continue;
        }
        bucket.push(id.to_string());
        if let Some(symptom) = find_symptom(id) {
            counts.add(symptom.risk);
        }
    }

    let risk_level = classify_by_symptom_counts(counts);
    debug!(risk = %risk_level, ?counts, unrecognized = unrecognized.len(), "Analyzed symptoms");

    SymptomAnalysis {
        risk_level,
        should_see_doctor: risk_level != RiskLevel::Low,
        urgency: risk_level.into(),
        emergency_symptoms,
        high_risk_symptoms,
        medium_risk_symptoms,
        unrecognized,
        recommendations: risk_recommendations(risk_level),
    }
}
