//! Standard scaler with statistics persisted at training time.

use serde::{Deserialize, Serialize};

use cystcare_common::error::{CareError, Result};

use crate::schema::{FeatureSchema, NumericField};
use crate::vector::FeatureVector;

/// Per-column (mean, standard deviation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    pub fn new(column: impl Into<String>, mean: f64, std: f64) -> Self {
        Self { column: column.into(), mean, std }
    }

    /// A zero deviation scales by 1.0, matching how the scaler was fitted.
    fn scale(&self) -> f64 {
        if self.std == 0.0 { 1.0 } else { self.std }
    }

    pub fn transform(&self, x: f64) -> f64 {
        (x - self.mean) / self.scale()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub columns: Vec<ColumnStats>,
}

impl Scaler {
    pub fn new(columns: Vec<ColumnStats>) -> Self {
        Self { columns }
    }

    /// Only the fixed numeric inputs may be scaled, each at most once, and
    /// every numeric input present in the schema needs statistics.
    pub fn validate(&self, schema: &FeatureSchema) -> Result<()> {
        for (i, stats) in self.columns.iter().enumerate() {
            if NumericField::from_column(&stats.column).is_none() {
                return Err(CareError::ModelUnavailable(format!(
                    "scaler column `{}` is not a numeric input",
                    stats.column
                )));
            }
            if self.columns[..i].iter().any(|s| s.column == stats.column) {
                return Err(CareError::ModelUnavailable(format!(
                    "scaler lists `{}` twice",
                    stats.column
                )));
            }
            if !stats.mean.is_finite() || !stats.std.is_finite() || stats.std < 0.0 {
                return Err(CareError::ModelUnavailable(format!(
                    "scaler statistics for `{}` are not usable (mean={}, std={})",
                    stats.column, stats.mean, stats.std
                )));
            }
        }

        for field in NumericField::ALL {
            if schema.contains(field.column()) && self.stats_for(field.column()).is_none() {
                return Err(CareError::ModelUnavailable(format!(
                    "scaler has no statistics for numeric column `{}`",
                    field.column()
                )));
            }
        }
        Ok(())
    }

    pub fn stats_for(&self, column: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|s| s.column == column)
    }

    /// Standardise the numeric columns in place; other columns pass through.
    pub fn apply(&self, vector: &mut FeatureVector<'_>) {
        let schema = vector.schema();
        for stats in &self.columns {
            if let Some(pos) = schema.position(&stats.column) {
                let scaled = stats.transform(vector.values()[pos]);
                vector.set(pos, scaled);
            }
        }
    }
}
