//! Label schema: classifier output index <-> treatment label.

use serde::{Deserialize, Serialize};

use cystcare_common::entities::TreatmentLabel;
use cystcare_common::error::{CareError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSchema {
    labels: Vec<TreatmentLabel>,
}

impl LabelSchema {
    /// Labels must be non-empty and distinct so the mapping is a bijection.
    pub fn new(labels: Vec<TreatmentLabel>) -> Result<Self> {
        if labels.is_empty() {
            return Err(CareError::ModelUnavailable("label schema is empty".to_string()));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(CareError::ModelUnavailable(format!(
                    "label `{label}` appears more than once in the label schema"
                )));
            }
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&TreatmentLabel> {
        self.labels.get(index)
    }

    pub fn index_of(&self, label: &TreatmentLabel) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreatmentLabel> {
        self.labels.iter()
    }
}

impl TryFrom<Vec<String>> for LabelSchema {
    type Error = CareError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        LabelSchema::new(names.iter().map(|n| TreatmentLabel::parse(n)).collect())
    }
}

impl From<LabelSchema> for Vec<String> {
    fn from(schema: LabelSchema) -> Self {
        schema.labels.into_iter().map(String::from).collect()
    }
}
