//! Shared fixtures: a small trained-looking model bundle, sample charge and
//! inventory tables, and the reference patients used across test suites.
//!
//! Label order follows the training job's label encoder (alphabetical), not
//! the order of `TreatmentLabel::KNOWN`.

use std::io::Write;

use cystcare_common::entities::TreatmentLabel;
use cystcare_common::patient::PatientInput;
use cystcare_model::{
    ClassifierArtifact, ColumnStats, DecisionTree, FeatureSchema, FixedClassifier, ForestClassifier,
    LabelSchema, ModelArtifact, ModelBundle, Scaler, TreeNode,
};
use cystcare_tables::{ChargesTable, InventoryTable};

pub use pretty_assertions;

pub const SCHEMA_VERSION: &str = "fixture-2024.03";

pub const FEATURE_COLUMNS: [&str; 16] = [
    "Age",
    "SI Cyst Size cm",
    "Cyst Growth",
    "fca 125 Level",
    "Symptom_Pelvic pain",
    "Symptom_Bloating",
    "Symptom_Irregular periods",
    "Symptom_Nausea",
    "Symptom_Unknown",
    "Menopause Stage_Pre-menopausal",
    "Menopause Stage_Post-menopausal",
    "Ultrasound Fe_Simple cyst",
    "Ultrasound Fe_Complex cyst",
    "Ultrasound Fe_Solid mass",
    "Ultrasound Fe_Septated cyst",
    "Ultrasound Fe_Hemorrhagic cyst",
];

pub const LABELS: [&str; 4] = ["Medication", "Observation", "Referral", "Surgery"];

pub const CHARGES_CSV: &str = "\
Service,Base Cost (KES),Out-of-Pocket (KES)
Initial Consultation,1500,500
Ovarian Cystectomy (Laparoscopic),120000,30000
Ovarian Cystectomy (Open),90000,25000
Pain Management Clinic,2500,800
";

pub const INVENTORY_CSV: &str = "\
Item,Available Stock
Speculum (Graves),25
Speculum (Pederson),4
Laparoscope,0
Pain medications (Paracetamol),120
Hormonal therapy pack,6
Ultrasound gel,40
Examination Gloves,300
Referral forms,0
";

pub fn feature_schema() -> FeatureSchema {
    FeatureSchema::from_names(SCHEMA_VERSION, FEATURE_COLUMNS).expect("fixture schema")
}

pub fn scaler() -> Scaler {
    Scaler::new(vec![
        ColumnStats::new("Age", 40.0, 12.0),
        ColumnStats::new("SI Cyst Size cm", 6.0, 3.0),
        ColumnStats::new("Cyst Growth", 0.5, 0.4),
        ColumnStats::new("fca 125 Level", 100.0, 150.0),
    ])
}

pub fn label_schema() -> LabelSchema {
    LabelSchema::new(LABELS.iter().map(|l| TreatmentLabel::parse(l)).collect()).expect("fixture labels")
}

fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
    TreeNode::Split { feature, threshold, left, right }
}

fn leaf(value: [f64; 4]) -> TreeNode {
    TreeNode::Leaf { value: value.to_vec() }
}

/// Three-tree forest over the fixture schema (thresholds on scaled values).
///
/// * CA-125 above ~175 leans Referral; below it, cysts over 6 cm lean Medication.
/// * Cysts over 9 cm lean Surgery; complex cysts lean Medication.
/// * A solid mass leans Surgery.
pub fn forest() -> ForestClassifier {
    let ca125 = DecisionTree {
        nodes: vec![
            split(3, 0.5, 1, 4),
            split(1, 0.0, 2, 3),
            leaf([1.0, 8.0, 0.0, 1.0]),
            leaf([6.0, 3.0, 0.0, 1.0]),
            leaf([0.0, 0.0, 7.0, 3.0]),
        ],
    };
    let size = DecisionTree {
        nodes: vec![
            split(1, 1.0, 1, 4),
            split(12, 0.5, 2, 3),
            leaf([2.0, 7.0, 0.0, 1.0]),
            leaf([6.0, 2.0, 1.0, 1.0]),
            leaf([0.0, 0.0, 3.0, 7.0]),
        ],
    };
    let solid = DecisionTree {
        nodes: vec![
            split(13, 0.5, 1, 2),
            leaf([3.0, 5.0, 1.0, 1.0]),
            leaf([0.0, 0.0, 4.0, 6.0]),
        ],
    };
    ForestClassifier {
        n_features: FEATURE_COLUMNS.len(),
        n_classes: LABELS.len(),
        trees: vec![ca125, size, solid],
    }
}

pub fn model_artifact() -> ModelArtifact {
    ModelArtifact {
        version: SCHEMA_VERSION.to_string(),
        feature_schema: feature_schema(),
        scaler: scaler(),
        labels: label_schema(),
        classifier: ClassifierArtifact::Forest(forest()),
    }
}

pub fn model_bundle() -> ModelBundle {
    ModelBundle::from_artifact(model_artifact()).expect("fixture bundle")
}

/// Bundle whose classifier always favours `labels[favoured]`. Labels may
/// include names outside the known treatments.
pub fn fixed_bundle(labels: &[&str], favoured: usize, confidence: f64) -> ModelBundle {
    let labels = LabelSchema::new(labels.iter().map(|l| TreatmentLabel::parse(l)).collect())
        .expect("fixture labels");
    let classifier = FixedClassifier::favouring(labels.len(), favoured, confidence);
    ModelBundle::new("fixed", feature_schema(), scaler(), labels, Box::new(classifier))
        .expect("fixed bundle")
}

/// Write the forest bundle to a temp file, as the training job would.
pub fn bundle_file() -> tempfile::NamedTempFile {
    let json = serde_json::to_string_pretty(&model_artifact()).expect("serialize bundle");
    write_temp(&json)
}

pub fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

pub fn charges_table() -> ChargesTable {
    ChargesTable::from_reader(CHARGES_CSV.as_bytes()).expect("fixture charges")
}

pub fn inventory_table() -> InventoryTable {
    InventoryTable::from_reader(INVENTORY_CSV.as_bytes()).expect("fixture inventory")
}

fn input(value: serde_json::Value) -> PatientInput {
    serde_json::from_value(value).expect("fixture input")
}

/// Pre-menopausal, 6.5 cm complex cyst, mildly raised CA-125. Risk score 4.
pub fn scenario_a() -> PatientInput {
    input(serde_json::json!({
        "age": 35,
        "menopause_stage": "Pre-menopausal",
        "cyst_size_cm": 6.5,
        "cyst_growth": 0.2,
        "biomarker_level": 45,
        "ultrasound_finding": "Complex cyst",
        "symptoms": "Pelvic pain, bloating"
    }))
}

/// Post-menopausal, 11 cm solid mass, CA-125 550. Risk score 13.
pub fn scenario_b() -> PatientInput {
    input(serde_json::json!({
        "age": 55,
        "cyst_size_cm": 11,
        "cyst_growth": 1.5,
        "biomarker_level": 550,
        "ultrasound_finding": "Solid mass"
    }))
}

/// Scenario A without the biomarker level.
pub fn scenario_c() -> PatientInput {
    PatientInput { biomarker_level: None, ..scenario_a() }
}

/// Scenario A using the training-dataset column names.
pub fn scenario_a_dataset_columns() -> PatientInput {
    input(serde_json::json!({
        "Age": 35,
        "Menopause Stage": "Pre-menopausal",
        "SI Cyst Size cm": 6.5,
        "Cyst Growth": 0.2,
        "fca 125 Level": 45,
        "Ultrasound Fe": "Complex cyst",
        "Reported Sym": "Pelvic pain, bloating"
    }))
}
