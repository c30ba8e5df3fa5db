//! Request boundary. Each call takes one context snapshot, runs the stages
//! against it, and converts any panic inside a stage into an internal error
//! scoped to that request.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

use cystcare_common::error::{CareError, Result};
use cystcare_common::patient::{self, PatientInput, PatientRecord, ValidationReport};
use cystcare_model::Prediction;

use crate::context::{CareContext, ContextHandle};
use crate::cost::{self, CostEstimate};
use crate::inventory::{self, InventoryStatus};
use crate::protocol;
use crate::risk::{self, RiskAssessment};
use crate::template::{self, CareTemplate, TemplateParts};

#[derive(Debug, Clone)]
pub struct CarePipeline {
    handle: Arc<ContextHandle>,
}

impl CarePipeline {
    pub fn new(handle: Arc<ContextHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Arc<ContextHandle> {
        &self.handle
    }

    /// Full care template for one patient.
    pub fn generate_template(&self, input: &PatientInput) -> Result<CareTemplate> {
        self.generate_template_at(input, Utc::now())
    }

    pub fn generate_template_at(&self, input: &PatientInput, generated_at: DateTime<Utc>) -> Result<CareTemplate> {
        self.guarded("template", |ctx| {
            let record = PatientRecord::try_from(input)?;
            let risk = risk::assess(&record);
            let prediction = ctx.bundle().predict(&record)?;
            let label = &prediction.label;

            let parts = TemplateParts {
                protocol: protocol::resolve(ctx.tables(), label),
                cost: cost::estimate(label, &risk, ctx.tables(), ctx.charges()),
                inventory: inventory::resolve(label, ctx.tables(), ctx.inventory()),
                guideline_reference: ctx.tables().guideline_reference.clone(),
                record,
                prediction,
                risk,
            };
            Ok(template::assemble(parts, generated_at))
        })
    }

    pub fn predict(&self, input: &PatientInput) -> Result<Prediction> {
        self.guarded("predict", |ctx| {
            let record = PatientRecord::try_from(input)?;
            ctx.bundle().predict(&record)
        })
    }

    /// Guideline risk only; needs no model.
    pub fn assess_risk(&self, input: &PatientInput) -> Result<RiskAssessment> {
        let record = PatientRecord::try_from(input)?;
        catch_stage("risk", || Ok(risk::assess(&record)))
    }

    pub fn estimate_cost(&self, input: &PatientInput) -> Result<CostEstimate> {
        self.guarded("cost", |ctx| {
            let record = PatientRecord::try_from(input)?;
            let risk = risk::assess(&record);
            let prediction = ctx.bundle().predict(&record)?;
            Ok(cost::estimate(&prediction.label, &risk, ctx.tables(), ctx.charges()))
        })
    }

    pub fn inventory_status(&self, input: &PatientInput) -> Result<InventoryStatus> {
        self.guarded("inventory", |ctx| {
            let record = PatientRecord::try_from(input)?;
            let prediction = ctx.bundle().predict(&record)?;
            Ok(inventory::resolve(&prediction.label, ctx.tables(), ctx.inventory()))
        })
    }

    /// Pre-flight check of an input; never fails.
    pub fn validate(&self, input: &PatientInput) -> ValidationReport {
        let report = patient::validate_input(input);
        for w in &report.warnings {
            warn!("Input warning: {}", w);
        }
        report
    }

    fn guarded<T>(&self, stage: &str, f: impl FnOnce(&CareContext) -> Result<T>) -> Result<T> {
        let ctx = self.handle.current()?;
        catch_stage(stage, || f(ctx.as_ref()))
    }
}

fn catch_stage<T>(stage: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(CareError::Internal(format!(
            "{stage} stage panicked: {}",
            panic_message(payload.as_ref())
        ))),
    };
    if let Err(e) = &result {
        warn!(kind = ?e.kind(), "{} request failed: {}", stage, e);
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cystcare_common::error::FailureKind;

    #[test]
    fn test_panics_become_internal_errors() {
        let result: Result<()> = catch_stage("test", || panic!("boom"));
        let failure = result.unwrap_err().to_failure();
        assert_eq!(failure.kind, FailureKind::InternalError);
        assert!(failure.message.contains("boom"));
    }

    #[test]
    fn test_no_context_is_model_unavailable() {
        let pipeline = CarePipeline::new(Arc::new(ContextHandle::new()));
        let input = PatientInput::default();
        assert!(matches!(pipeline.predict(&input), Err(CareError::ModelUnavailable(_))));
    }

    #[test]
    fn test_risk_needs_no_context() {
        let pipeline = CarePipeline::new(Arc::new(ContextHandle::new()));
        let input: PatientInput = serde_json::from_value(serde_json::json!({
            "age": 55, "cyst_size_cm": 11, "cyst_growth": 1.5,
            "biomarker_level": 550, "ultrasound_finding": "Solid mass"
        }))
        .unwrap();
        assert_eq!(pipeline.assess_risk(&input).unwrap().score, 13);
    }
}
