//! Severity classification.
//!
//! Two strategies with different inputs: [`classify_by_percentage`] maps a
//! questionnaire percentage to a [`Severity`] band, and
//! [`classify_by_symptom_counts`] maps counts of catalog symptoms to a
//! [`RiskLevel`]. They are not interchangeable.

use serde::{Deserialize, Serialize};

/// Severity band of a scored assessment, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    Emergency,
}

impl Severity {
    /// Band for a percentage: `<40` mild, `40..60` moderate, `60..80` severe, `>=80` emergency.
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            0..=39 => Severity::Mild,
            40..=59 => Severity::Moderate,
            60..=79 => Severity::Severe,
            _ => Severity::Emergency,
        }
    }

    /// Band for a 0-10 pain level, read as `level * 10` percent.
    pub fn from_pain_level(level: u8) -> Self {
        Self::from_percentage(level.min(10) * 10)
    }

    /// Get the severity as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mild" => Ok(Severity::Mild),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            "emergency" => Ok(Severity::Emergency),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Risk attached to a catalog symptom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomRisk {
    Medium,
    High,
    Emergency,
}

/// Overall risk of a symptom selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Emergency,
}

impl RiskLevel {
    /// Position on the shared severity scale.
    pub fn as_severity(&self) -> Severity {
        match self {
            RiskLevel::Low => Severity::Mild,
            RiskLevel::Medium => Severity::Moderate,
            RiskLevel::High => Severity::Severe,
            RiskLevel::Emergency => Severity::Emergency,
        }
    }

    /// Get the risk level as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Selected symptoms counted per risk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub emergency: usize,
    pub high: usize,
    pub medium: usize,
}

impl RiskCounts {
    /// Count one symptom of the given risk.
    pub fn add(&mut self, risk: SymptomRisk) {
        match risk {
            SymptomRisk::Emergency => self.emergency += 1,
            SymptomRisk::High => self.high += 1,
            SymptomRisk::Medium => self.medium += 1,
        }
    }
}

impl FromIterator<SymptomRisk> for RiskCounts {
    fn from_iter<I: IntoIterator<Item = SymptomRisk>>(iter: I) -> Self {
        let mut counts = RiskCounts::default();
        for risk in iter {
            counts.add(risk);
        }
        counts
    }
}

/// Percentage strategy.
pub fn classify_by_percentage(percentage: u8) -> Severity {
    Severity::from_percentage(percentage)
}

/// Symptom-count strategy.
pub fn classify_by_symptom_counts(counts: RiskCounts) -> RiskLevel {
    if counts.emergency > 0 {
        RiskLevel::Emergency
    } else if counts.high >= 2 || (counts.high >= 1 && counts.medium >= 2) {
        RiskLevel::High
    } else if counts.high == 1 || counts.medium >= 2 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
