//! Feature schema: the ordered, versioned column list fixed at training time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use cystcare_common::error::{CareError, Result};
use cystcare_common::patient::PatientRecord;

use crate::vector::FeatureVector;

/// Prefix of every symptom indicator column.
pub const SYMPTOM_PREFIX: &str = "Symptom_";

/// Numeric inputs, named as in the training dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Age,
    CystSize,
    CystGrowth,
    BiomarkerLevel,
}

impl NumericField {
    pub const ALL: [NumericField; 4] = [
        NumericField::Age,
        NumericField::CystSize,
        NumericField::CystGrowth,
        NumericField::BiomarkerLevel,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            NumericField::Age            => "Age",
            NumericField::CystSize       => "SI Cyst Size cm",
            NumericField::CystGrowth     => "Cyst Growth",
            NumericField::BiomarkerLevel => "fca 125 Level",
        }
    }

    pub fn value(&self, record: &PatientRecord) -> f64 {
        match self {
            NumericField::Age            => record.age,
            NumericField::CystSize       => record.cyst_size_cm,
            NumericField::CystGrowth     => record.cyst_growth,
            NumericField::BiomarkerLevel => record.biomarker_level,
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.column() == name)
    }
}

/// Categorical inputs that are one-hot encoded as `<column>_<value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    MenopauseStage,
    UltrasoundFinding,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 2] = [
        CategoricalField::MenopauseStage,
        CategoricalField::UltrasoundFinding,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            CategoricalField::MenopauseStage    => "Menopause Stage",
            CategoricalField::UltrasoundFinding => "Ultrasound Fe",
        }
    }

    /// Normalised category value for a record.
    pub fn value(&self, record: &PatientRecord) -> String {
        match self {
            CategoricalField::MenopauseStage    => record.normalized_menopause_stage(),
            CategoricalField::UltrasoundFinding => record.normalized_ultrasound_finding(),
        }
    }

    pub fn one_hot_column(&self, value: &str) -> String {
        format!("{}_{}", self.column(), value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Symptom,
    Categorical,
}

impl ColumnKind {
    /// Infer the kind from the column naming convention.
    pub fn infer(name: &str) -> Self {
        if name.starts_with(SYMPTOM_PREFIX) {
            ColumnKind::Symptom
        } else if CategoricalField::ALL
            .iter()
            .any(|f| name.starts_with(&format!("{}_", f.column())))
        {
            ColumnKind::Categorical
        } else {
            ColumnKind::Numeric
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ColumnKind::infer(&name);
        Self { name, kind }
    }
}

/// Artifacts may list bare column names or typed columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ColumnRepr {
    Name(String),
    Typed { name: String, kind: Option<ColumnKind> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaRepr {
    #[serde(default = "default_version")]
    version: String,
    columns: Vec<ColumnRepr>,
}

fn default_version() -> String { "unversioned".to_string() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaRepr", into = "SchemaRepr")]
pub struct FeatureSchema {
    version: String,
    columns: Vec<Column>,
    positions: HashMap<String, usize>,
}

/// What alignment had to do to fit a working row to the schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentReport {
    /// Schema columns absent from the working row
    pub zero_filled: usize,
    /// Working-row columns unknown to the schema
    pub dropped: Vec<String>,
}

impl FeatureSchema {
    pub fn new(version: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(CareError::ModelUnavailable("feature schema has no columns".to_string()));
        }
        let mut positions = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if positions.insert(col.name.clone(), i).is_some() {
                return Err(CareError::ModelUnavailable(format!(
                    "feature schema lists column `{}` twice",
                    col.name
                )));
            }
        }
        Ok(Self { version: version.into(), columns, positions })
    }

    /// Build from bare column names, inferring kinds.
    pub fn from_names<I, S>(version: impl Into<String>, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(version, names.into_iter().map(Column::new).collect())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Align a working row to this schema. Total: every schema column gets a
    /// value (copied or 0.0) and nothing outside the schema survives.
    pub fn align<'s>(&'s self, working: &HashMap<String, f64>) -> (FeatureVector<'s>, AlignmentReport) {
        let mut report = AlignmentReport::default();
        let values: Vec<f64> = self
            .columns
            .iter()
            .map(|col| match working.get(&col.name) {
                Some(v) => *v,
                None => {
                    report.zero_filled += 1;
                    0.0
                }
            })
            .collect();

        report.dropped = working
            .keys()
            .filter(|k| !self.contains(k))
            .cloned()
            .collect();
        report.dropped.sort();

        (FeatureVector::new(self, values), report)
    }
}

impl TryFrom<SchemaRepr> for FeatureSchema {
    type Error = CareError;

    fn try_from(repr: SchemaRepr) -> Result<Self> {
        let columns = repr
            .columns
            .into_iter()
            .map(|c| match c {
                ColumnRepr::Name(name) => Column::new(name),
                ColumnRepr::Typed { name, kind: Some(kind) } => Column { name, kind },
                ColumnRepr::Typed { name, kind: None } => Column::new(name),
            })
            .collect();
        FeatureSchema::new(repr.version, columns)
    }
}

impl From<FeatureSchema> for SchemaRepr {
    fn from(schema: FeatureSchema) -> Self {
        SchemaRepr {
            version: schema.version,
            columns: schema
                .columns
                .into_iter()
                .map(|c| ColumnRepr::Typed { name: c.name, kind: Some(c.kind) })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> FeatureSchema {
        FeatureSchema::from_names(
            "v1",
            ["Age", "Symptom_Bloating", "Menopause Stage_Post-menopausal", "Ultrasound Fe_Solid mass"],
        )
        .unwrap()
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(ColumnKind::infer("Symptom_Nausea"), ColumnKind::Symptom);
        assert_eq!(ColumnKind::infer("Ultrasound Fe_Simple cyst"), ColumnKind::Categorical);
        assert_eq!(ColumnKind::infer("Menopause Stage_Unknown"), ColumnKind::Categorical);
        assert_eq!(ColumnKind::infer("fca 125 Level"), ColumnKind::Numeric);
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = FeatureSchema::from_names("v1", ["Age", "Age"]).unwrap_err();
        assert!(matches!(err, CareError::ModelUnavailable(_)));
        assert!(FeatureSchema::from_names("v1", Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_align_copies_fills_and_drops() {
        let schema = schema();
        let mut working = HashMap::new();
        working.insert("Age".to_string(), 42.0);
        working.insert("Symptom_Bloating".to_string(), 1.0);
        working.insert("Symptom_Never seen".to_string(), 1.0);

        let (vector, report) = schema.align(&working);
        assert_eq!(vector.values(), &[42.0, 1.0, 0.0, 0.0]);
        assert_eq!(report.zero_filled, 2);
        assert_eq!(report.dropped, vec!["Symptom_Never seen".to_string()]);
        assert_eq!(vector.keys().collect::<Vec<_>>(), schema.names().collect::<Vec<_>>());
    }

    #[test]
    fn test_schema_json_accepts_bare_and_typed_columns() {
        let json = r#"{"version":"2024-06","columns":["Age",{"name":"Symptom_Fever","kind":"symptom"},{"name":"Cyst Growth"}]}"#;
        let schema: FeatureSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.version(), "2024-06");
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.columns()[1].kind, ColumnKind::Symptom);
        assert_eq!(schema.position("Cyst Growth"), Some(2));
    }

    #[test]
    fn test_numeric_field_columns() {
        assert_eq!(NumericField::from_column("fca 125 Level"), Some(NumericField::BiomarkerLevel));
        assert_eq!(NumericField::from_column("Symptom_Fever"), None);
        assert_eq!(
            CategoricalField::UltrasoundFinding.one_hot_column("Solid mass"),
            "Ultrasound Fe_Solid mass"
        );
    }
}
