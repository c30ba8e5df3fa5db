//! Core domain vocabulary: treatment labels, risk levels, and soft lookups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Treatment label produced by the classifier.
///
/// Labels outside the four known treatments are carried as `Other` so that
/// downstream resolvers can degrade to empty results instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TreatmentLabel {
    Observation,
    Medication,
    Surgery,
    Referral,
    Other(String),
}

impl TreatmentLabel {
    pub const KNOWN: [TreatmentLabel; 4] = [
        TreatmentLabel::Observation,
        TreatmentLabel::Medication,
        TreatmentLabel::Surgery,
        TreatmentLabel::Referral,
    ];

    /// Parse a label name. Never fails; unknown names become `Other`.
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "Observation" => TreatmentLabel::Observation,
            "Medication"  => TreatmentLabel::Medication,
            "Surgery"     => TreatmentLabel::Surgery,
            "Referral"    => TreatmentLabel::Referral,
            other         => TreatmentLabel::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TreatmentLabel::Observation => "Observation",
            TreatmentLabel::Medication  => "Medication",
            TreatmentLabel::Surgery     => "Surgery",
            TreatmentLabel::Referral    => "Referral",
            TreatmentLabel::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TreatmentLabel::Other(_))
    }
}

impl From<String> for TreatmentLabel {
    fn from(s: String) -> Self {
        TreatmentLabel::parse(&s)
    }
}

impl From<TreatmentLabel> for String {
    fn from(label: TreatmentLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for TreatmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guideline risk level derived from the additive risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Score ≥ 6 is High, score ≥ 3 is Medium, anything lower is Low.
    pub fn from_score(score: u32) -> Self {
        if score >= 6 {
            RiskLevel::High
        } else if score >= 3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low    => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High   => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a soft table lookup. A miss is data, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::NotFound,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn as_ref(&self) -> Lookup<&T> {
        match self {
            Lookup::Found(v) => Lookup::Found(v),
            Lookup::NotFound => Lookup::NotFound,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(v) => Lookup::Found(f(v)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip_known_names() {
        for label in TreatmentLabel::KNOWN.iter() {
            assert_eq!(&TreatmentLabel::parse(label.as_str()), label);
            assert!(label.is_known());
        }
    }

    #[test]
    fn test_unknown_label_is_other() {
        let label = TreatmentLabel::parse("Chemotherapy");
        assert_eq!(label, TreatmentLabel::Other("Chemotherapy".to_string()));
        assert!(!label.is_known());
        assert_eq!(label.to_string(), "Chemotherapy");
    }

    #[test]
    fn test_label_serialises_as_plain_string() {
        let json = serde_json::to_string(&TreatmentLabel::Surgery).unwrap();
        assert_eq!(json, "\"Surgery\"");
        let back: TreatmentLabel = serde_json::from_str("\"Referral\"").unwrap();
        assert_eq!(back, TreatmentLabel::Referral);
    }

    #[test]
    fn test_risk_level_boundaries() {
        assert_eq!(RiskLevel::from_score(6), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
    }

    #[test]
    fn test_lookup_branches() {
        let hit: Lookup<u32> = Lookup::from_option(Some(3));
        assert!(hit.is_found());
        assert_eq!(hit.map(|v| v * 2).found(), Some(6));
        let miss: Lookup<u32> = Lookup::from_option(None);
        assert!(!miss.is_found());
        assert_eq!(miss.found(), None);
    }
}
