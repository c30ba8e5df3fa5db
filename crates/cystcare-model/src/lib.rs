//! cystcare-model: feature encoding and the immutable classifier bundle.
//!
//! The encoder reproduces, at inference time, the exact feature layout the
//! classifier was trained on: symptom and categorical one-hot columns are
//! built from the raw record, aligned to the persisted `FeatureSchema`
//! (present -> copy, absent -> 0.0, extra -> drop), and the numeric columns
//! are standardised with the persisted `Scaler` statistics.

pub mod schema;
pub mod vector;
pub mod labels;
pub mod scaler;
pub mod encoder;
pub mod classifier;
pub mod forest;
pub mod bundle;

pub use bundle::{ClassifierArtifact, ModelArtifact, ModelBundle, ModelInfo};
pub use classifier::{Classifier, FixedClassifier, LabelProbability, Prediction};
pub use encoder::FeatureEncoder;
pub use forest::{DecisionTree, ForestClassifier, TreeNode};
pub use labels::LabelSchema;
pub use scaler::{ColumnStats, Scaler};
pub use schema::{CategoricalField, Column, ColumnKind, FeatureSchema, NumericField};
pub use vector::FeatureVector;
