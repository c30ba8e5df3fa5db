//! cystcare-common: shared entities, errors and reference tables for the Cystcare crates.

pub mod error;
pub mod entities;
pub mod patient;
pub mod reference;
pub mod costing;

// Re-export commonly used types
pub use error::{CareError, FailureKind, PipelineFailure, Result};
pub use entities::{Lookup, RiskLevel, TreatmentLabel};
pub use patient::{PatientInput, PatientRecord, ValidationReport};
pub use reference::{ReferenceTables, StockEntry, TreatmentProtocol};
pub use costing::CostingPolicy;
