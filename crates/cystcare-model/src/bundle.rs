//! The immutable model bundle: schema, scaler, labels and classifier,
//! produced together by the training job and replaced only as a whole.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use cystcare_common::error::{CareError, Result};
use cystcare_common::patient::PatientRecord;

use crate::classifier::{self, Classifier, FixedClassifier, Prediction};
use crate::encoder::FeatureEncoder;
use crate::forest::ForestClassifier;
use crate::labels::LabelSchema;
use crate::scaler::{ColumnStats, Scaler};
use crate::schema::FeatureSchema;
use crate::vector::FeatureVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    Forest(ForestClassifier),
    Fixed(FixedClassifier),
}

impl ClassifierArtifact {
    fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ClassifierArtifact::Forest(f) => Box::new(f),
            ClassifierArtifact::Fixed(f) => Box::new(f),
        }
    }
}

/// On-disk form of a bundle (one JSON document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub feature_schema: FeatureSchema,
    pub scaler: Scaler,
    pub labels: LabelSchema,
    pub classifier: ClassifierArtifact,
}

/// Summary of a loaded bundle for operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub version: String,
    pub schema_version: String,
    pub feature_count: usize,
    pub features: Vec<String>,
    pub treatment_classes: Vec<String>,
    pub class_count: usize,
    /// Training-time mean and deviation of the numeric inputs
    pub feature_statistics: Vec<ColumnStats>,
}

#[derive(Debug)]
pub struct ModelBundle {
    version: String,
    schema: FeatureSchema,
    scaler: Scaler,
    labels: LabelSchema,
    classifier: Box<dyn Classifier>,
}

impl ModelBundle {
    /// Assemble and cross-check the parts. Any inconsistency is reported as
    /// `ModelUnavailable`: the bundle is unusable as a whole.
    pub fn new(
        version: impl Into<String>,
        schema: FeatureSchema,
        scaler: Scaler,
        labels: LabelSchema,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self> {
        scaler.validate(&schema)?;
        if classifier.n_classes() != labels.len() {
            return Err(CareError::ModelUnavailable(format!(
                "classifier emits {} classes but the label schema has {}",
                classifier.n_classes(),
                labels.len()
            )));
        }
        classifier.validate(schema.len())?;

        Ok(Self {
            version: version.into(),
            schema,
            scaler,
            labels,
            classifier,
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        Self::new(
            artifact.version,
            artifact.feature_schema,
            artifact.scaler,
            artifact.labels,
            artifact.classifier.into_classifier(),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .map_err(|e| CareError::ModelUnavailable(format!("malformed model bundle: {e}")))?;
        Self::from_artifact(artifact)
    }

    /// Load a bundle file. Every failure, including I/O, is `ModelUnavailable`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CareError::ModelUnavailable(format!("cannot read model bundle {}: {e}", path.display()))
        })?;
        let bundle = Self::from_json_str(&json)?;
        info!(
            "Loaded model bundle {} ({} features, {} labels) from {}",
            bundle.version,
            bundle.schema.len(),
            bundle.labels.len(),
            path.display()
        );
        Ok(bundle)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn labels(&self) -> &LabelSchema {
        &self.labels
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            model_type: self.classifier.kind().to_string(),
            version: self.version.clone(),
            schema_version: self.schema.version().to_string(),
            feature_count: self.schema.len(),
            features: self.schema.names().map(str::to_string).collect(),
            treatment_classes: self.labels.iter().map(|l| l.to_string()).collect(),
            class_count: self.labels.len(),
            feature_statistics: self.scaler.columns.clone(),
        }
    }

    pub fn encoder(&self) -> FeatureEncoder<'_> {
        FeatureEncoder::new(&self.schema, &self.scaler)
    }

    pub fn encode(&self, record: &PatientRecord) -> FeatureVector<'_> {
        self.encoder().encode(record)
    }

    /// Encode the record and classify it.
    pub fn predict(&self, record: &PatientRecord) -> Result<Prediction> {
        let features = self.encode(record);
        let prediction = classifier::predict(self.classifier.as_ref(), &self.labels, &features)?;
        debug!(
            label = %prediction.label,
            confidence = prediction.confidence,
            "Classified record with bundle {}",
            self.version
        );
        Ok(prediction)
    }
}
