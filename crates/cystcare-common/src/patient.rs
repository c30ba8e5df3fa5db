//! Patient input contract and validation.
//!
//! `PatientInput` is the raw record exactly as a caller submits it. Field
//! names accept both snake_case and the column names of the training
//! dataset. `PatientRecord` is the validated form the pipeline works on:
//! the four numeric fields are guaranteed present and finite.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CareError, Result};

/// Placeholder used when a categorical or symptom field is empty.
pub const UNKNOWN_TOKEN: &str = "Unknown";

pub const MENOPAUSE_STAGES: [&str; 2] = ["Pre-menopausal", "Post-menopausal"];

pub const ULTRASOUND_FINDINGS: [&str; 5] = [
    "Simple cyst",
    "Complex cyst",
    "Solid mass",
    "Septated cyst",
    "Hemorrhagic cyst",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    #[serde(default, alias = "Age")]
    pub age: Option<Value>,

    #[serde(default, alias = "Menopause Stage")]
    pub menopause_stage: Option<String>,

    #[serde(default, alias = "SI Cyst Size cm")]
    pub cyst_size_cm: Option<Value>,

    #[serde(default, alias = "Cyst Growth")]
    pub cyst_growth: Option<Value>,

    /// CA-125 level (U/mL)
    #[serde(default, alias = "fca 125 Level", alias = "ca125_level")]
    pub biomarker_level: Option<Value>,

    #[serde(default, alias = "Ultrasound Fe")]
    pub ultrasound_finding: Option<String>,

    /// Comma-delimited free text
    #[serde(default, alias = "Reported Sym")]
    pub symptoms: Option<String>,
}

/// Validated patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub age: f64,
    pub menopause_stage: Option<String>,
    pub cyst_size_cm: f64,
    pub cyst_growth: f64,
    pub biomarker_level: f64,
    pub ultrasound_finding: Option<String>,
    pub symptoms: Option<String>,
}

impl PatientRecord {
    pub fn normalized_menopause_stage(&self) -> String {
        normalize_token(self.menopause_stage.as_deref())
    }

    pub fn normalized_ultrasound_finding(&self) -> String {
        normalize_token(self.ultrasound_finding.as_deref())
    }

    /// Distinct symptom tokens in first-seen order.
    pub fn symptom_tokens(&self) -> Vec<String> {
        split_symptoms(self.symptoms.as_deref())
    }
}

impl TryFrom<&PatientInput> for PatientRecord {
    type Error = CareError;

    fn try_from(input: &PatientInput) -> Result<Self> {
        Ok(PatientRecord {
            age: require_number("age", input.age.as_ref())?,
            menopause_stage: input.menopause_stage.clone(),
            cyst_size_cm: require_number("cyst_size_cm", input.cyst_size_cm.as_ref())?,
            cyst_growth: require_number("cyst_growth", input.cyst_growth.as_ref())?,
            biomarker_level: require_number("biomarker_level", input.biomarker_level.as_ref())?,
            ultrasound_finding: input.ultrasound_finding.clone(),
            symptoms: input.symptoms.clone(),
        })
    }
}

impl TryFrom<PatientInput> for PatientRecord {
    type Error = CareError;

    fn try_from(input: PatientInput) -> Result<Self> {
        PatientRecord::try_from(&input)
    }
}

fn require_number(field: &str, value: Option<&Value>) -> Result<f64> {
    match value {
        None | Some(Value::Null) => Err(CareError::validation(field, "missing required field")),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(x) if x.is_finite() => Ok(x),
            _ => Err(CareError::validation(field, "must be a finite number")),
        },
        Some(_) => Err(CareError::validation(field, "must be a number")),
    }
}

/// Trim whitespace and strip double quotes; empty input becomes `Unknown`.
pub fn normalize_token(raw: Option<&str>) -> String {
    let cleaned = raw.map(|s| s.trim().replace('"', "")).unwrap_or_default();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        UNKNOWN_TOKEN.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Normalize the symptom field and split it on commas.
pub fn split_symptoms(raw: Option<&str>) -> Vec<String> {
    let normalized = normalize_token(raw);
    let mut tokens: Vec<String> = Vec::new();
    for token in normalized.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    if tokens.is_empty() {
        tokens.push(UNKNOWN_TOKEN.to_string());
    }
    tokens
}

/// Outcome of a pre-flight input check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check an input without running the pipeline.
/// Errors mirror the `ValidationError` contract; warnings are advisory only.
pub fn validate_input(input: &PatientInput) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let numerics: [(&str, Option<&Value>, f64, f64, &str); 4] = [
        ("age", input.age.as_ref(), 0.0, 120.0, "Age should be between 0 and 120"),
        ("cyst_size_cm", input.cyst_size_cm.as_ref(), 0.0, 20.0, "Cyst size should be between 0 and 20 cm"),
        ("cyst_growth", input.cyst_growth.as_ref(), f64::NEG_INFINITY, f64::INFINITY, ""),
        ("biomarker_level", input.biomarker_level.as_ref(), 0.0, 1000.0, "CA-125 level should be between 0 and 1000"),
    ];

    for (field, value, min, max, warning) in numerics {
        match require_number(field, value) {
            Ok(x) => {
                if (x < min || x > max) && !warning.is_empty() {
                    warnings.push(warning.to_string());
                }
            }
            Err(e) => errors.push(e.to_string()),
        }
    }

    if let Some(stage) = input.menopause_stage.as_deref() {
        let stage = normalize_token(Some(stage));
        if !MENOPAUSE_STAGES.contains(&stage.as_str()) {
            warnings.push(format!(
                "Menopause stage should be one of: {}",
                MENOPAUSE_STAGES.join(", ")
            ));
        }
    }

    if let Some(finding) = input.ultrasound_finding.as_deref() {
        let finding = normalize_token(Some(finding));
        if !ULTRASOUND_FINDINGS.contains(&finding.as_str()) {
            warnings.push(format!(
                "Ultrasound finding should be one of: {}",
                ULTRASOUND_FINDINGS.join(", ")
            ));
        }
    }

    if !warnings.is_empty() {
        debug!("Input validation raised {} warning(s)", warnings.len());
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn input(value: Value) -> PatientInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_accepts_training_column_names() {
        let raw = input(json!({
            "Age": 35,
            "Menopause Stage": "Pre-menopausal",
            "SI Cyst Size cm": 6.5,
            "Cyst Growth": 0.2,
            "fca 125 Level": 45,
            "Ultrasound Fe": "Complex cyst",
            "Reported Sym": "Pelvic pain, bloating"
        }));
        let record = PatientRecord::try_from(&raw).unwrap();
        assert_eq!(record.age, 35.0);
        assert_eq!(record.biomarker_level, 45.0);
        assert_eq!(record.normalized_ultrasound_finding(), "Complex cyst");
    }

    #[test]
    fn test_missing_biomarker_is_validation_error() {
        let raw = input(json!({"age": 40, "cyst_size_cm": 3.0, "cyst_growth": 0.1}));
        let err = PatientRecord::try_from(&raw).unwrap_err();
        match err {
            CareError::Validation { field, .. } => assert_eq!(field, "biomarker_level"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_string_number_is_rejected() {
        let raw = input(json!({"age": "forty", "cyst_size_cm": 3.0, "cyst_growth": 0.1, "biomarker_level": 20}));
        assert!(matches!(
            PatientRecord::try_from(&raw),
            Err(CareError::Validation { ref field, .. }) if field == "age"
        ));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let raw = input(json!({"age": 40, "cyst_size_cm": null, "cyst_growth": 0.1, "biomarker_level": 20}));
        assert!(PatientRecord::try_from(&raw).is_err());
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token(Some("  \"Solid mass\" ")), "Solid mass");
        assert_eq!(normalize_token(Some("   ")), UNKNOWN_TOKEN);
        assert_eq!(normalize_token(None), UNKNOWN_TOKEN);
    }

    #[test]
    fn test_split_symptoms_dedups_and_trims() {
        assert_eq!(
            split_symptoms(Some("\"Pelvic pain, bloating, Pelvic pain,\"")),
            vec!["Pelvic pain".to_string(), "bloating".to_string()]
        );
        assert_eq!(split_symptoms(Some("")), vec![UNKNOWN_TOKEN.to_string()]);
        assert_eq!(split_symptoms(Some(" , ")), vec![UNKNOWN_TOKEN.to_string()]);
    }

    #[test]
    fn test_validate_input_collects_errors_and_warnings() {
        let raw = input(json!({
            "age": 130,
            "cyst_size_cm": 3.0,
            "biomarker_level": "high",
            "menopause_stage": "Peri-menopausal"
        }));
        let report = validate_input(&raw);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2); // cyst_growth missing, biomarker non-numeric
        assert!(report.warnings.iter().any(|w| w.contains("Age")));
        assert!(report.warnings.iter().any(|w| w.contains("Menopause")));
    }

    #[test]
    fn test_validate_clean_input() {
        let raw = input(json!({
            "age": 35, "cyst_size_cm": 6.5, "cyst_growth": 0.2, "biomarker_level": 45,
            "menopause_stage": "Pre-menopausal", "ultrasound_finding": "Complex cyst"
        }));
        let report = validate_input(&raw);
        assert!(report.valid);
        assert!(report.warnings.is_empty());
    }
}
