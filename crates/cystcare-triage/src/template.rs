//! Care template assembly. Pure composition of the stage outputs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cystcare_common::entities::{RiskLevel, TreatmentLabel};
use cystcare_common::patient::PatientRecord;
use cystcare_common::reference::TreatmentProtocol;
use cystcare_model::{LabelProbability, Prediction};

use crate::cost::CostEstimate;
use crate::inventory::InventoryStatus;
use crate::risk::RiskAssessment;

pub const FOLLOW_UP_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub age: f64,
    pub menopause_stage: String,
    pub cyst_size: f64,
    pub ca125_level: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub treatment_plan: TreatmentLabel,
    pub confidence: f64,
    pub urgency: RiskLevel,
    pub rationale: String,
    pub probabilities: Vec<LabelProbability>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineCompliance {
    pub follows_guidelines: bool,
    pub guideline_reference: String,
    pub recommendation_basis: TreatmentProtocol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpPlan {
    pub next_appointment: DateTime<Utc>,
    pub required_tests: Vec<String>,
    pub warning_signs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub diagnostic_accuracy: f64,
    pub guideline_compliance: bool,
    pub cost_transparency: bool,
    pub inventory_availability: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareTemplate {
    pub patient_id: String,
    pub generated_at: DateTime<Utc>,
    pub patient_summary: PatientSummary,
    pub recommendation: Recommendation,
    pub guideline_compliance: GuidelineCompliance,
    pub risk_assessment: RiskAssessment,
    pub treatment_protocol: TreatmentProtocol,
    pub cost_estimation: CostEstimate,
    pub inventory_status: InventoryStatus,
    pub follow_up_plan: FollowUpPlan,
    pub quality_metrics: QualityMetrics,
}

/// Everything the assembler needs, produced by the upstream stages.
#[derive(Debug, Clone)]
pub struct TemplateParts {
    pub record: PatientRecord,
    pub prediction: Prediction,
    pub risk: RiskAssessment,
    pub protocol: TreatmentProtocol,
    pub cost: CostEstimate,
    pub inventory: InventoryStatus,
    pub guideline_reference: String,
}

/// Short upper-case report identifier.
pub fn new_patient_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

fn required_tests(label: &TreatmentLabel) -> Vec<String> {
    match label {
        TreatmentLabel::Surgery => vec!["Post-op ultrasound".to_string()],
        _ => vec!["Ultrasound".to_string(), "CA-125".to_string()],
    }
}

pub fn assemble(parts: TemplateParts, generated_at: DateTime<Utc>) -> CareTemplate {
    let TemplateParts { record, prediction, risk, protocol, cost, inventory, guideline_reference } = parts;

    let follows_guidelines = !protocol.is_empty();

    let patient_summary = PatientSummary {
        age: record.age,
        menopause_stage: record.normalized_menopause_stage(),
        cyst_size: record.cyst_size_cm,
        ca125_level: record.biomarker_level,
        risk_level: risk.level,
        risk_factors: risk.factors.clone(),
    };

    let recommendation = Recommendation {
        rationale: format!("Based on {} risk factors and model analysis", risk.factors.len()),
        urgency: risk.level,
        treatment_plan: prediction.label.clone(),
        confidence: prediction.confidence,
        probabilities: prediction.probabilities,
    };

    let follow_up_plan = FollowUpPlan {
        next_appointment: generated_at + Duration::days(FOLLOW_UP_DAYS),
        required_tests: required_tests(&prediction.label),
        warning_signs: protocol.warning_signs.clone(),
    };

    let quality_metrics = QualityMetrics {
        diagnostic_accuracy: prediction.confidence,
        guideline_compliance: follows_guidelines,
        cost_transparency: true,
        inventory_availability: !inventory.available.is_empty(),
    };

    CareTemplate {
        patient_id: new_patient_id(),
        generated_at,
        patient_summary,
        recommendation,
        guideline_compliance: GuidelineCompliance {
            follows_guidelines,
            guideline_reference,
            recommendation_basis: protocol.clone(),
        },
        risk_assessment: risk,
        treatment_protocol: protocol,
        cost_estimation: cost,
        inventory_status: inventory,
        follow_up_plan,
        quality_metrics,
    }
}
