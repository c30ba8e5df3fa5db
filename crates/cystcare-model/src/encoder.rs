//! Patient record -> feature vector, replicating the training-time encoding.

use std::collections::HashMap;
use tracing::debug;

use cystcare_common::error::Result;
use cystcare_common::patient::{PatientInput, PatientRecord};

use crate::scaler::Scaler;
use crate::schema::{CategoricalField, FeatureSchema, NumericField, SYMPTOM_PREFIX};
use crate::vector::FeatureVector;

/// Encoder bound to one schema/scaler pair from the same bundle.
#[derive(Debug, Clone, Copy)]
pub struct FeatureEncoder<'a> {
    schema: &'a FeatureSchema,
    scaler: &'a Scaler,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(schema: &'a FeatureSchema, scaler: &'a Scaler) -> Self {
        Self { schema, scaler }
    }

    /// Unaligned row: symptom indicators, one-hot categoricals, raw numerics.
    pub fn working_row(record: &PatientRecord) -> HashMap<String, f64> {
        let mut row = HashMap::new();

        for symptom in record.symptom_tokens() {
            row.insert(format!("{SYMPTOM_PREFIX}{symptom}"), 1.0);
        }

        for field in CategoricalField::ALL {
            row.insert(field.one_hot_column(&field.value(record)), 1.0);
        }

        for field in NumericField::ALL {
            row.insert(field.column().to_string(), field.value(record));
        }

        row
    }

    /// Encode a validated record. Never fails: unseen categories and
    /// symptoms are dropped by alignment, absent columns are zero.
    pub fn encode(&self, record: &PatientRecord) -> FeatureVector<'a> {
        let row = Self::working_row(record);
        let (mut vector, report) = self.schema.align(&row);
        if !report.dropped.is_empty() {
            debug!(
                dropped = ?report.dropped,
                "Encoded record carried columns unknown to schema {}",
                self.schema.version()
            );
        }
        self.scaler.apply(&mut vector);
        vector
    }

    /// Validate raw input, then encode it.
    pub fn encode_input(&self, input: &PatientInput) -> Result<FeatureVector<'a>> {
        let record = PatientRecord::try_from(input)?;
        Ok(self.encode(&record))
    }
}
