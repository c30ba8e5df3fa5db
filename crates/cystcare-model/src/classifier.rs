//! Classifier seam.
//!
//! The decision pipeline consumes a classifier; it never trains one. Any
//! implementation must be deterministic for a fixed artifact: identical
//! feature vectors yield identical distributions.

use serde::{Deserialize, Serialize};
use std::fmt;

use cystcare_common::entities::TreatmentLabel;
use cystcare_common::error::{CareError, Result};

use crate::labels::LabelSchema;
use crate::vector::FeatureVector;

pub trait Classifier: Send + Sync + fmt::Debug {
    /// Short model family name, reported by `ModelBundle::info`.
    fn kind(&self) -> &'static str;

    /// Width of the probability distribution this classifier emits.
    fn n_classes(&self) -> usize;

    /// Check the artifact against the feature width it will be fed.
    fn validate(&self, _n_features: usize) -> Result<()> {
        Ok(())
    }

    /// Probability distribution over label indices.
    fn predict_proba(&self, features: &FeatureVector<'_>) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelProbability {
    pub label: TreatmentLabel,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: TreatmentLabel,
    /// Maximum probability in the distribution
    pub confidence: f64,
    pub probabilities: Vec<LabelProbability>,
}

/// Run the classifier and resolve its output through the label schema.
/// Ties resolve to the lowest label index.
pub fn predict(
    classifier: &dyn Classifier,
    labels: &LabelSchema,
    features: &FeatureVector<'_>,
) -> Result<Prediction> {
    let distribution = classifier.predict_proba(features)?;

    if distribution.len() != labels.len() {
        return Err(CareError::Internal(format!(
            "classifier returned {} probabilities for {} labels",
            distribution.len(),
            labels.len()
        )));
    }
    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(CareError::Internal("classifier returned an invalid probability".to_string()));
    }

    let mut best = 0;
    for (i, p) in distribution.iter().enumerate() {
        if *p > distribution[best] {
            best = i;
        }
    }

    let probabilities = labels
        .iter()
        .zip(distribution.iter())
        .map(|(label, p)| LabelProbability { label: label.clone(), probability: *p })
        .collect();

    let label = labels
        .label(best)
        .cloned()
        .ok_or_else(|| CareError::Internal(format!("label index {best} out of range")))?;

    Ok(Prediction {
        label,
        confidence: distribution[best],
        probabilities,
    })
}

/// Classifier that returns the same distribution for every input.
/// Useful for smoke runs and for pinning a label in tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedClassifier {
    pub distribution: Vec<f64>,
}

impl FixedClassifier {
    pub fn new(distribution: Vec<f64>) -> Self {
        Self { distribution }
    }

    /// Put `confidence` on `index` and spread the rest evenly.
    pub fn favouring(n_classes: usize, index: usize, confidence: f64) -> Self {
        let rest = if n_classes > 1 {
            (1.0 - confidence) / (n_classes - 1) as f64
        } else {
            0.0
        };
        let distribution = (0..n_classes)
            .map(|i| if i == index { confidence } else { rest })
            .collect();
        Self { distribution }
    }
}

impl Classifier for FixedClassifier {
    fn kind(&self) -> &'static str {
        "fixed"
    }

    fn n_classes(&self) -> usize {
        self.distribution.len()
    }

    fn validate(&self, _n_features: usize) -> Result<()> {
        if self.distribution.is_empty() {
            return Err(CareError::ModelUnavailable("fixed distribution is empty".to_string()));
        }
        if self.distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(CareError::ModelUnavailable(
                "fixed distribution has a negative or non-finite probability".to_string(),
            ));
        }
        if self.distribution.iter().sum::<f64>() <= 0.0 {
            return Err(CareError::ModelUnavailable("fixed distribution sums to zero".to_string()));
        }
        Ok(())
    }

    fn predict_proba(&self, _features: &FeatureVector<'_>) -> Result<Vec<f64>> {
        Ok(self.distribution.clone())
    }
}
