//! cystcare-triage: the per-request decision pipeline.
//!
//! Encoder -> classifier -> {protocol, cost, inventory} -> template, with the
//! guideline risk scorer running on the raw record alongside. Every stage
//! reads one immutable [`CareContext`] snapshot; nothing is mutated while a
//! request is in flight.

pub mod risk;
pub mod protocol;
pub mod cost;
pub mod inventory;
pub mod template;
pub mod context;
pub mod pipeline;

pub use context::{CareContext, ContextHandle, ContextSources};
pub use cost::{CostEstimate, CostStatus, FinancingOptions};
pub use inventory::{InventoryLine, InventoryStatus};
pub use pipeline::CarePipeline;
pub use risk::RiskAssessment;
pub use template::{CareTemplate, TemplateParts};
