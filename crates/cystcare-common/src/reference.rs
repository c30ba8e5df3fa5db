//! Static reference tables: treatment protocols, charge-service mapping,
//! required supplies, and standing ward stock.
//!
//! Built-in values follow the national guidelines for ovarian cyst
//! management. A deployment may override any table from YAML; tables that
//! are omitted from the file keep their built-in values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::costing::CostingPolicy;
use crate::entities::TreatmentLabel;
use crate::error::{CareError, Result};

/// Care protocol for one treatment label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatmentProtocol {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub medications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    pub lifestyle: Vec<String>,
    pub warning_signs: Vec<String>,
    /// Urgency tier, e.g. "Within 1-2 weeks"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_stay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<String>,
    pub complications: Vec<String>,
    pub tests_required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biopsy: Option<String>,
}

impl TreatmentProtocol {
    pub fn is_empty(&self) -> bool {
        *self == TreatmentProtocol::default()
    }
}

/// A supply line held on the ward independently of the inventory table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub item: String,
    pub stock: u32,
    pub unit: String,
}

impl StockEntry {
    pub fn new(item: &str, stock: u32, unit: &str) -> Self {
        Self { item: item.to_string(), stock, unit: unit.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceTables {
    /// Label name -> protocol
    pub protocols: BTreeMap<String, TreatmentProtocol>,
    /// Label name -> fragment of the charges-table service name
    pub service_map: BTreeMap<String, String>,
    /// Label name -> supply names searched in the inventory table
    pub required_items: BTreeMap<String, Vec<String>>,
    /// Label name -> standing ward kit reported alongside inventory results
    pub standing_stock: BTreeMap<String, Vec<StockEntry>>,
    /// Always reported as available, whatever the label
    pub general_supplies: Vec<StockEntry>,
    pub guideline_reference: String,
    pub costing: CostingPolicy,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self {
            protocols: default_protocols(),
            service_map: default_service_map(),
            required_items: default_required_items(),
            standing_stock: default_standing_stock(),
            general_supplies: default_general_supplies(),
            guideline_reference: "Kenyan National Guidelines for Ovarian Cyst Management".to_string(),
            costing: CostingPolicy::default(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_protocols() -> BTreeMap<String, TreatmentProtocol> {
    let mut protocols = BTreeMap::new();

    protocols.insert("Observation".to_string(), TreatmentProtocol {
        duration: Some("3-6 months".to_string()),
        follow_up: Some("Ultrasound every 3 months".to_string()),
        lifestyle: strings(&["Regular exercise", "Healthy diet", "Stress management"]),
        warning_signs: strings(&["Increased pain", "Cyst growth >2cm", "New symptoms"]),
        ..Default::default()
    });

    protocols.insert("Medication".to_string(), TreatmentProtocol {
        duration: Some("1-3 months".to_string()),
        medications: strings(&["Pain management", "Hormonal therapy if needed"]),
        follow_up: Some("Monthly ultrasound".to_string()),
        lifestyle: strings(&["Rest during pain episodes", "Avoid heavy lifting"]),
        warning_signs: strings(&["No pain relief", "Cyst growth", "Side effects"]),
        ..Default::default()
    });

    protocols.insert("Surgery".to_string(), TreatmentProtocol {
        duration: Some("Same day procedure".to_string()),
        procedure: Some("Laparoscopic cystectomy".to_string()),
        hospital_stay: Some("1-2 days".to_string()),
        recovery: Some("2-4 weeks".to_string()),
        follow_up: Some("Post-op at 1 week, 1 month, 3 months".to_string()),
        complications: strings(&["Bleeding", "Infection", "Adhesion formation"]),
        ..Default::default()
    });

    protocols.insert("Referral".to_string(), TreatmentProtocol {
        urgency: Some("Within 1-2 weeks".to_string()),
        specialist: Some("Gynecologic oncologist".to_string()),
        tests_required: strings(&["CA-125", "HE4", "CT scan", "MRI"]),
        biopsy: Some("May be required".to_string()),
        follow_up: Some("As per specialist recommendation".to_string()),
        ..Default::default()
    });

    protocols
}

fn default_service_map() -> BTreeMap<String, String> {
    [
        ("Surgery", "Ovarian Cystec"),
        ("Medication", "Pain Managem"),
        ("Observation", "Initial Consult"),
        ("Referral", "Referral Speci"),
    ]
    .iter()
    .map(|(label, fragment)| (label.to_string(), fragment.to_string()))
    .collect()
}

fn default_required_items() -> BTreeMap<String, Vec<String>> {
    let mut items = BTreeMap::new();
    items.insert("Surgery".to_string(), strings(&["Speculum", "Laparoscope", "Surgical instruments", "Anesthesia supplies"]));
    items.insert("Medication".to_string(), strings(&["Pain medications", "Hormonal therapy", "Anti-inflammatory drugs"]));
    items.insert("Observation".to_string(), strings(&["Ultrasound gel", "Examination gloves"]));
    items.insert("Referral".to_string(), strings(&["Referral forms", "Medical records"]));
    items
}

fn default_standing_stock() -> BTreeMap<String, Vec<StockEntry>> {
    let mut stock = BTreeMap::new();
    stock.insert("Surgery".to_string(), vec![
        StockEntry::new("Surgical Gloves", 50, "pairs"),
        StockEntry::new("Sterile Gauze", 100, "packets"),
        StockEntry::new("Antiseptic Solution", 25, "bottles"),
        StockEntry::new("Surgical Instruments", 15, "sets"),
        StockEntry::new("Surgical Masks", 8, "pieces"),
    ]);
    stock.insert("Medication".to_string(), vec![
        StockEntry::new("Pain Relief Tablets", 200, "tablets"),
        StockEntry::new("Anti-inflammatory Cream", 30, "tubes"),
        StockEntry::new("Hormonal Therapy", 45, "packets"),
    ]);
    stock.insert("Observation".to_string(), vec![
        StockEntry::new("Examination Gloves", 150, "pairs"),
        StockEntry::new("Ultrasound Gel", 20, "bottles"),
        StockEntry::new("Disposable Covers", 80, "pieces"),
    ]);
    stock.insert("Referral".to_string(), vec![
        StockEntry::new("Referral Forms", 500, "forms"),
        StockEntry::new("Medical Records", 100, "folders"),
        StockEntry::new("Specialist Contact List", 25, "copies"),
    ]);
    stock
}

fn default_general_supplies() -> Vec<StockEntry> {
    vec![
        StockEntry::new("Disposable Gloves", 200, "pairs"),
        StockEntry::new("Cotton Wool", 50, "packets"),
        StockEntry::new("Bandages", 75, "rolls"),
        StockEntry::new("Antiseptic Wipes", 120, "packets"),
    ]
}

impl ReferenceTables {
    /// Load overrides from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let tables: Self = serde_yaml::from_str(&content)?;
        tables.validate()?;
        info!(
            "Loaded reference tables from {} ({} protocols)",
            path.as_ref().display(),
            tables.protocols.len()
        );
        Ok(tables)
    }

    pub fn validate(&self) -> Result<()> {
        let mut problems = self.costing.validate();
        if self.general_supplies.is_empty() {
            problems.push("general_supplies must not be empty".to_string());
        }
        for (label, fragment) in &self.service_map {
            if fragment.is_empty() {
                problems.push(format!("service_map entry for `{label}` is empty"));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CareError::Config(problems.join("; ")))
        }
    }

    /// Protocol for a label; unknown labels get an empty protocol.
    pub fn protocol_for(&self, label: &TreatmentLabel) -> TreatmentProtocol {
        self.protocols.get(label.as_str()).cloned().unwrap_or_default()
    }

    pub fn service_fragment(&self, label: &TreatmentLabel) -> Option<&str> {
        self.service_map.get(label.as_str()).map(String::as_str)
    }

    pub fn required_items_for(&self, label: &TreatmentLabel) -> &[String] {
        self.required_items.get(label.as_str()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn standing_stock_for(&self, label: &TreatmentLabel) -> &[StockEntry] {
        self.standing_stock.get(label.as_str()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every supply name any label may search for.
    pub fn all_required_items(&self) -> impl Iterator<Item = &str> {
        self.required_items.values().flatten().map(String::as_str)
    }

    pub fn all_service_fragments(&self) -> impl Iterator<Item = &str> {
        self.service_map.values().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_cover_every_known_label() {
        let tables = ReferenceTables::default();
        for label in TreatmentLabel::KNOWN.iter() {
            assert!(!tables.protocol_for(label).is_empty(), "missing protocol for {label}");
            assert!(tables.service_fragment(label).is_some());
            assert!(!tables.required_items_for(label).is_empty());
        }
        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_unknown_label_gets_empty_results() {
        let tables = ReferenceTables::default();
        let label = TreatmentLabel::parse("Watchful waiting");
        assert!(tables.protocol_for(&label).is_empty());
        assert!(tables.service_fragment(&label).is_none());
        assert!(tables.required_items_for(&label).is_empty());
        assert!(tables.standing_stock_for(&label).is_empty());
    }

    #[test]
    fn test_yaml_override_is_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service_map:\n  Surgery: \"Laparoscopic\"\ncosting:\n  currency: UGX").unwrap();
        let tables = ReferenceTables::from_yaml(file.path()).unwrap();
        assert_eq!(tables.service_fragment(&TreatmentLabel::Surgery), Some("Laparoscopic"));
        // service_map replaced wholesale, other tables untouched
        assert!(tables.service_fragment(&TreatmentLabel::Medication).is_none());
        assert_eq!(tables.general_supplies.len(), 4);
        assert_eq!(tables.costing.currency, "UGX");
    }

    #[test]
    fn test_yaml_rejects_empty_general_supplies() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "general_supplies: []").unwrap();
        assert!(matches!(ReferenceTables::from_yaml(file.path()), Err(CareError::Config(_))));
    }
}
