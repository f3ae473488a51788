use serde::{Deserialize, Serialize};

use super::{AssessmentResult, CareUrgency, Recommendation, RiskLevel, Severity, SymptomAnalysis};

/// Pain-impact result and symptom analysis viewed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveAssessment {
    /// Merged band, see [`most_severe`].
    pub overall: Severity,
    pub pain_severity: Severity,
    pub pain_percentage: u8,
    pub symptom_risk: RiskLevel,
    pub emergency: bool,
    pub should_see_doctor: bool,
    pub urgency: CareUrgency,
    /// Symptom recommendations first, then pain-impact ones not already listed.
    pub recommendations: Vec<Recommendation>,
}

/// Band merge: the more severe of the two wins.
pub fn most_severe(pain: Severity, symptoms: RiskLevel) -> Severity {
    pain.max(symptoms.as_severity())
}

/// Combine a pain-impact result with a symptom analysis.
pub fn combine(pain: &AssessmentResult, symptoms: &SymptomAnalysis) -> ComprehensiveAssessment {
    let overall = most_severe(pain.severity, symptoms.risk_level);

    let mut recommendations = symptoms.recommendations.clone();
    for rec in &pain.recommendations {
        if !recommendations.iter().any(|r| r.id == rec.id) {
            recommendations.push(rec.clone());
        }
    }

    let urgency = match overall {
        Severity::Emergency => CareUrgency::Immediate,
        Severity::Severe => symptoms.urgency.max(CareUrgency::Urgent),
        _ => symptoms.urgency,
    };

    ComprehensiveAssessment {
        overall,
        pain_severity: pain.severity,
        pain_percentage: pain.percentage,
        symptom_risk: symptoms.risk_level,
        emergency: overall == Severity::Emergency,
        should_see_doctor: symptoms.should_see_doctor || overall >= Severity::Severe,
        urgency,
        recommendations,
    }
}
