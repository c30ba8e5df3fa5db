use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CareError {
    /// A required numeric field is missing or not a number.
    #[error("Validation error on `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// The model bundle could not be loaded or is not installed.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, CareError>;

impl CareError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CareError::Validation { field: field.into(), reason: reason.into() }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CareError::Validation { .. } => FailureKind::ValidationError,
            CareError::ModelUnavailable(_) => FailureKind::ModelUnavailable,
            _ => FailureKind::InternalError,
        }
    }

    /// Structured failure object reported at the pipeline boundary.
    pub fn to_failure(&self) -> PipelineFailure {
        let field = match self {
            CareError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        PipelineFailure {
            kind: self.kind(),
            message: self.to_string(),
            field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ValidationError,
    ModelUnavailable,
    InternalError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ValidationError  => "validation_error",
            FailureKind::ModelUnavailable => "model_unavailable",
            FailureKind::InternalError    => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failure_keeps_field() {
        let err = CareError::validation("biomarker_level", "missing required field");
        let failure = err.to_failure();
        assert_eq!(failure.kind, FailureKind::ValidationError);
        assert_eq!(failure.field.as_deref(), Some("biomarker_level"));
        assert!(failure.message.contains("missing required field"));
    }

    #[test]
    fn test_load_errors_report_as_internal() {
        let err = CareError::Config("bad multiplier".to_string());
        assert_eq!(err.kind(), FailureKind::InternalError);
        assert_eq!(CareError::ModelUnavailable("x".into()).kind(), FailureKind::ModelUnavailable);
    }

    #[test]
    fn test_failure_serialises_snake_case() {
        let failure = CareError::ModelUnavailable("bundle missing".into()).to_failure();
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "model_unavailable");
        assert!(json.get("field").is_none());
        assert_eq!(json["kind"], failure.kind.as_str());
    }
}
