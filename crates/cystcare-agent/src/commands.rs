//! Command implementations. Each renders the JSON to print and reports
//! whether the request succeeded.

use anyhow::Context;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use cystcare_common::error::{CareError, Result as CareResult};
use cystcare_common::patient::PatientInput;
use cystcare_model::{ModelBundle, ModelInfo};
use cystcare_triage::{CareContext, CarePipeline, ContextHandle, ContextSources};

/// Read one patient record from a JSON file, or stdin for `-`.
pub fn read_input(path: &Path) -> anyhow::Result<PatientInput> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("parsing patient record {}", path.display()))
}

/// Success -> the value itself; failure -> the structured failure object.
/// Field order follows the serialised types.
pub fn render<T: Serialize>(result: CareResult<T>, pretty: bool) -> CareResult<(String, bool)> {
    match result {
        Ok(v) => Ok((to_json(&v, pretty)?, true)),
        Err(e) => Ok((to_json(&e.to_failure(), pretty)?, false)),
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// One-line failure object that cannot itself fail to serialise.
fn failure_line(err: &CareError) -> String {
    let failure = err.to_failure();
    let mut object = Map::new();
    object.insert("kind".to_string(), Value::from(failure.kind.as_str()));
    object.insert("message".to_string(), Value::from(failure.message));
    if let Some(field) = failure.field {
        object.insert("field".to_string(), Value::from(field));
    }
    Value::Object(object).to_string()
}

/// Load the serving context. A load failure is returned as data so every
/// command can report it as a structured failure.
pub fn boot(sources: &ContextSources) -> CareResult<CarePipeline> {
    match CareContext::load(sources) {
        Ok(context) => Ok(CarePipeline::new(Arc::new(ContextHandle::with_context(context)))),
        Err(e) => {
            error!("Care context failed to load: {}", e);
            Err(e)
        }
    }
}

/// Pipeline without a model; serves the stages that need none.
pub fn offline_pipeline() -> CarePipeline {
    CarePipeline::new(Arc::new(ContextHandle::new()))
}

pub fn model_info(bundle: &Path) -> CareResult<ModelInfo> {
    ModelBundle::load(bundle).map(|b| b.info())
}

fn process_line(pipeline: &CarePipeline, line: &str) -> String {
    let parsed: CareResult<PatientInput> = serde_json::from_str(line)
        .map_err(|e| CareError::validation("record", format!("not a valid patient record: {e}")));
    match render(parsed.and_then(|input| pipeline.generate_template(&input)), false) {
        Ok((json, _)) => json,
        Err(e) => failure_line(&e),
    }
}

fn records(lines: Vec<String>) -> impl Iterator<Item = String> {
    lines.into_iter().filter(|l| !l.trim().is_empty())
}

/// Generate a template per JSON line on the blocking pool, at most `workers`
/// at a time. Output order matches input order; blank lines are skipped.
pub async fn run_batch(pipeline: CarePipeline, lines: Vec<String>, workers: usize) -> Vec<String> {
    let total = lines.len();
    let outputs: Vec<String> = stream::iter(records(lines))
        .map(|line| {
            let pipeline = pipeline.clone();
            async move {
                match tokio::task::spawn_blocking(move || process_line(&pipeline, &line)).await {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Batch worker failed: {}", e);
                        failure_line(&CareError::Internal(format!("worker failed: {e}")))
                    }
                }
            }
        })
        .buffered(workers.max(1))
        .collect()
        .await;

    info!("Batch finished: {} records from {} lines", outputs.len(), total);
    outputs
}

/// The same failure for every record, when no context could be loaded.
pub fn fail_batch(lines: Vec<String>, err: &CareError) -> Vec<String> {
    let line = failure_line(err);
    records(lines).map(|_| line.clone()).collect()
}

pub fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cystcare_common::reference::ReferenceTables;
    use cystcare_test_utils as fixtures;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn pipeline() -> CarePipeline {
        let ctx = CareContext::build(
            fixtures::model_bundle(),
            ReferenceTables::default(),
            fixtures::inventory_table(),
            fixtures::charges_table(),
        )
        .unwrap();
        CarePipeline::new(Arc::new(ContextHandle::with_context(ctx)))
    }

    fn line(input: &PatientInput) -> String {
        serde_json::to_string(input).unwrap()
    }

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    fn missing_bundle_sources() -> ContextSources {
        ContextSources {
            bundle: PathBuf::from("/nonexistent/cyst_bundle.json"),
            inventory_csv: PathBuf::from("/nonexistent/inventory.csv"),
            charges_csv: PathBuf::from("/nonexistent/charges.csv"),
            reference_tables: None,
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let lines = vec![
            line(&fixtures::scenario_a()),
            "{not json".to_string(),
            String::new(),
            line(&fixtures::scenario_c()),
            line(&fixtures::scenario_b()),
        ];
        let out: Vec<Value> = run_batch(pipeline(), lines, 2).await.iter().map(|l| parse(l)).collect();

        assert_eq!(out.len(), 4);
        assert_eq!(out[0]["recommendation"]["treatment_plan"], "Medication");
        assert_eq!(out[1]["kind"], "validation_error");
        assert_eq!(out[1]["field"], "record");
        assert_eq!(out[2]["kind"], "validation_error");
        assert_eq!(out[2]["field"], "biomarker_level");
        assert_eq!(out[3]["recommendation"]["treatment_plan"], "Surgery");
    }

    #[test]
    fn test_render_failure() {
        let (json, ok) = render::<()>(Err(CareError::ModelUnavailable("no bundle".to_string())), true).unwrap();
        assert!(!ok);
        assert_eq!(parse(&json)["kind"], "model_unavailable");
    }

    #[test]
    fn test_render_surfaces_serialization_error() {
        let mut unrepresentable = std::collections::HashMap::new();
        unrepresentable.insert((1u8, 2u8), 3u8);
        let err = render(Ok(unrepresentable), false).unwrap_err();
        assert!(matches!(err, CareError::Serialization(_)));
        assert_eq!(parse(&failure_line(&err))["kind"], "internal_error");
    }

    #[test]
    fn test_render_keeps_template_field_order() {
        let template = pipeline().generate_template(&fixtures::scenario_a());
        let (json, ok) = render(template, false).unwrap();
        assert!(ok);
        assert!(json.starts_with("{\"patient_id\":"));
        let summary = json.find("\"patient_summary\"").unwrap();
        let quality = json.find("\"quality_metrics\"").unwrap();
        assert!(summary < quality);
    }

    #[test]
    fn test_missing_bundle_is_structured_failure() {
        let err = boot(&missing_bundle_sources()).unwrap_err();
        let (json, ok) = render::<()>(Err(err), true).unwrap();
        assert!(!ok);
        assert_eq!(parse(&json)["kind"], "model_unavailable");
    }

    #[test]
    fn test_failed_boot_answers_every_batch_line() {
        let err = boot(&missing_bundle_sources()).unwrap_err();
        let lines = vec![line(&fixtures::scenario_a()), String::new(), "{not json".to_string()];
        let out = fail_batch(lines, &err);
        assert_eq!(out.len(), 2);
        for json in &out {
            assert_eq!(parse(json)["kind"], "model_unavailable");
        }
    }

    #[test]
    fn test_offline_pipeline_serves_risk_and_validation() {
        let pipeline = offline_pipeline();
        assert_eq!(pipeline.assess_risk(&fixtures::scenario_b()).unwrap().score, 13);
        assert!(!pipeline.validate(&fixtures::scenario_c()).valid);
        assert!(matches!(
            pipeline.predict(&fixtures::scenario_a()),
            Err(CareError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_model_info_from_bundle_file() {
        let file = fixtures::bundle_file();
        let info = model_info(file.path()).unwrap();
        assert_eq!(info.model_type, "random_forest");
        assert_eq!(info.feature_count, fixtures::FEATURE_COLUMNS.len());
        assert_eq!(info.treatment_classes, fixtures::LABELS.to_vec());

        let err = model_info(Path::new("/nonexistent/cyst_bundle.json")).unwrap_err();
        assert!(matches!(err, CareError::ModelUnavailable(_)));
    }

    #[test]
    fn test_read_input_accepts_dataset_columns() {
        let file = fixtures::write_temp(&serde_json::json!({
            "Age": 41, "SI Cyst Size cm": 4.0, "Cyst Growth": 0.1, "fca 125 Level": 22
        }).to_string());
        let input = read_input(file.path()).unwrap();
        assert_eq!(input.age, Some(serde_json::json!(41)));
    }
}
