//! Treatment protocol resolver.

use tracing::warn;

use cystcare_common::entities::TreatmentLabel;
use cystcare_common::reference::{ReferenceTables, TreatmentProtocol};

/// Protocol for the predicted label. Never fails: a label without a
/// protocol yields the empty record.
pub fn resolve(tables: &ReferenceTables, label: &TreatmentLabel) -> TreatmentProtocol {
    let protocol = tables.protocol_for(label);
    if protocol.is_empty() {
        warn!("No treatment protocol for label `{}`", label);
    }
    protocol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_resolve() {
        let tables = ReferenceTables::default();
        let referral = resolve(&tables, &TreatmentLabel::Referral);
        assert_eq!(referral.specialist.as_deref(), Some("Gynecologic oncologist"));
        assert_eq!(referral.tests_required, vec!["CA-125", "HE4", "CT scan", "MRI"]);

        let observation = resolve(&tables, &TreatmentLabel::Observation);
        assert_eq!(observation.warning_signs.len(), 3);
    }

    #[test]
    fn test_unknown_label_gets_empty_protocol() {
        let tables = ReferenceTables::default();
        let protocol = resolve(&tables, &TreatmentLabel::parse("Watchful waiting"));
        assert!(protocol.is_empty());
        assert_eq!(serde_json::to_value(&protocol).unwrap()["medications"], serde_json::json!([]));
    }
}
