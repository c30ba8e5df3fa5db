//! Guideline risk scorer.
//!
//! Additive rules over the raw clinical fields, evaluated in a fixed order.
//! Cyst-size and CA-125 rules are tiered: only the highest tier that applies
//! contributes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use cystcare_common::entities::RiskLevel;
use cystcare_common::patient::PatientRecord;

/// Ultrasound findings treated as suspicious.
pub const SUSPICIOUS_FINDINGS: [&str; 2] = ["Solid mass", "Complex cyst"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    #[serde(rename = "risk_level")]
    pub level: RiskLevel,
    #[serde(rename = "risk_score")]
    pub score: u32,
    /// Triggered factors in rule order
    #[serde(rename = "risk_factors")]
    pub factors: Vec<String>,
}

/// One tier of a tiered rule: strictly above `above` scores `points`.
struct Tier {
    above: f64,
    points: u32,
    factor: &'static str,
}

/// Highest first.
static CYST_SIZE_TIERS: [Tier; 3] = [
    Tier { above: 10.0, points: 3, factor: "Large cyst (>10cm)" },
    Tier { above: 8.0,  points: 2, factor: "Moderate cyst size (8-10cm)" },
    Tier { above: 5.0,  points: 1, factor: "Cyst size >5cm" },
];

/// Highest first.
static BIOMARKER_TIERS: [Tier; 3] = [
    Tier { above: 500.0, points: 4, factor: "Very high CA-125 (>500)" },
    Tier { above: 200.0, points: 3, factor: "High CA-125 (200-500)" },
    Tier { above: 35.0,  points: 1, factor: "Elevated CA-125 (>35)" },
];

const AGE_THRESHOLD: f64 = 50.0;
const GROWTH_THRESHOLD: f64 = 1.0;

fn highest_tier(tiers: &'static [Tier], value: f64) -> Option<&'static Tier> {
    tiers.iter().find(|t| value > t.above)
}

#[derive(Default)]
struct Tally {
    score: u32,
    factors: Vec<String>,
}

impl Tally {
    fn add(&mut self, points: u32, factor: &str) {
        self.score += points;
        self.factors.push(factor.to_string());
    }
}

/// Score a validated record. Total and pure.
pub fn assess(record: &PatientRecord) -> RiskAssessment {
    let mut tally = Tally::default();

    if record.age > AGE_THRESHOLD {
        tally.add(2, "Post-menopausal age");
    }
    if let Some(tier) = highest_tier(&CYST_SIZE_TIERS, record.cyst_size_cm) {
        tally.add(tier.points, tier.factor);
    }
    if let Some(tier) = highest_tier(&BIOMARKER_TIERS, record.biomarker_level) {
        tally.add(tier.points, tier.factor);
    }
    if record.cyst_growth > GROWTH_THRESHOLD {
        tally.add(2, "Rapid cyst growth");
    }
    if SUSPICIOUS_FINDINGS.contains(&record.normalized_ultrasound_finding().as_str()) {
        tally.add(2, "Suspicious ultrasound features");
    }

    let level = RiskLevel::from_score(tally.score);
    debug!(score = tally.score, level = %level, "Risk assessed");

    RiskAssessment {
        level,
        score: tally.score,
        factors: tally.factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(age: f64, size: f64, growth: f64, ca125: f64, ultrasound: &str) -> PatientRecord {
        PatientRecord {
            age,
            menopause_stage: None,
            cyst_size_cm: size,
            cyst_growth: growth,
            biomarker_level: ca125,
            ultrasound_finding: Some(ultrasound.to_string()),
            symptoms: None,
        }
    }

    #[test]
    fn test_no_factors_is_low() {
        let r = assess(&record(30.0, 3.0, 0.1, 20.0, "Simple cyst"));
        assert_eq!(r.score, 0);
        assert_eq!(r.level, RiskLevel::Low);
        assert!(r.factors.is_empty());
    }

    #[test]
    fn test_cyst_tiers_are_exclusive() {
        assert_eq!(assess(&record(30.0, 5.0, 0.0, 0.0, "")).score, 0);
        assert_eq!(assess(&record(30.0, 5.1, 0.0, 0.0, "")).score, 1);
        assert_eq!(assess(&record(30.0, 8.5, 0.0, 0.0, "")).score, 2);
        let large = assess(&record(30.0, 10.5, 0.0, 0.0, ""));
        assert_eq!(large.score, 3);
        assert_eq!(large.factors, vec!["Large cyst (>10cm)".to_string()]);
    }

    #[test]
    fn test_biomarker_tiers() {
        let scores: Vec<u32> = [34.0, 36.0, 201.0, 501.0]
            .iter()
            .map(|ca| assess(&record(30.0, 1.0, 0.0, *ca, "")).score)
            .collect();
        assert_eq!(scores, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_factor_order_follows_rules() {
        let r = assess(&record(55.0, 11.0, 1.5, 550.0, "Solid mass"));
        assert_eq!(r.score, 13);
        assert_eq!(r.level, RiskLevel::High);
        assert_eq!(
            r.factors,
            vec![
                "Post-menopausal age",
                "Large cyst (>10cm)",
                "Very high CA-125 (>500)",
                "Rapid cyst growth",
                "Suspicious ultrasound features",
            ]
        );
    }

    #[test]
    fn test_ultrasound_is_normalised_before_matching() {
        let r = assess(&record(30.0, 1.0, 0.0, 0.0, " \"Complex cyst\" "));
        assert_eq!(r.score, 2);
    }

    #[test]
    fn test_level_boundaries() {
        // age + growth + ultrasound = 6
        assert_eq!(assess(&record(51.0, 1.0, 1.1, 0.0, "Solid mass")).level, RiskLevel::High);
        // age + ultrasound + cyst>5 = 5
        assert_eq!(assess(&record(51.0, 6.0, 0.0, 0.0, "Solid mass")).level, RiskLevel::Medium);
        // age only = 2
        assert_eq!(assess(&record(51.0, 1.0, 0.0, 0.0, "")).level, RiskLevel::Low);
    }
}
