//! Cost estimator: base charge, ancillary fees, risk adjustment, and the
//! financing table.

use serde::{Deserialize, Serialize};
use tracing::warn;

use cystcare_common::costing::{AncillaryFees, FinancingTerms};
use cystcare_common::entities::{Lookup, RiskLevel, TreatmentLabel};
use cystcare_common::reference::ReferenceTables;
use cystcare_tables::ChargesTable;

use crate::risk::RiskAssessment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostStatus {
    Available,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncillaryCosts {
    pub consultation: f64,
    pub ultrasound: f64,
    pub lab_tests: f64,
    /// Present only for the Medication plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<f64>,
    pub follow_up: f64,
}

impl AncillaryCosts {
    fn for_label(fees: &AncillaryFees, label: &TreatmentLabel) -> Self {
        Self {
            consultation: fees.consultation,
            ultrasound: fees.ultrasound,
            lab_tests: fees.lab_tests,
            medications: (*label == TreatmentLabel::Medication).then_some(fees.medications),
            follow_up: fees.follow_up,
        }
    }

    pub fn total(&self) -> f64 {
        self.consultation
            + self.ultrasound
            + self.lab_tests
            + self.medications.unwrap_or(0.0)
            + self.follow_up
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashPayment {
    pub amount: f64,
    pub discount: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveragePlan {
    pub coverage: f64,
    /// Patient share after coverage
    pub amount: f64,
    pub description: String,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub down_payment: f64,
    pub monthly_payment: f64,
    pub months: u32,
    pub interest_rate: f64,
    pub total_amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingOptions {
    pub cash_payment: CashPayment,
    pub public_coverage: CoveragePlan,
    pub private_insurance: CoveragePlan,
    pub installment: InstallmentPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub status: CostStatus,
    /// Matched charges-table service, if any
    pub service_name: Option<String>,
    pub base_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_pocket: Option<f64>,
    pub additional_costs: AncillaryCosts,
    pub total_base_cost: f64,
    pub risk_level: RiskLevel,
    pub risk_multiplier: f64,
    pub risk_adjusted_cost: f64,
    pub financing_options: FinancingOptions,
    pub currency: String,
}

fn percent(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).round())
}

/// Financing table for a risk-adjusted cost.
pub fn financing_options(cost: f64, terms: &FinancingTerms) -> FinancingOptions {
    let months = terms.installment_months.max(1);
    let rate = terms.installment_annual_interest;
    let down_payment = cost * terms.installment_down_payment;
    let financed = cost * (1.0 - terms.installment_down_payment);
    let monthly_payment = financed * (1.0 + rate * months as f64 / 12.0) / months as f64;

    FinancingOptions {
        cash_payment: CashPayment {
            amount: cost * (1.0 - terms.cash_discount),
            discount: terms.cash_discount,
            description: format!("Cash payment with {} discount", percent(terms.cash_discount)),
        },
        public_coverage: CoveragePlan {
            coverage: terms.public_coverage,
            amount: cost * (1.0 - terms.public_coverage),
            description: format!("NHIF coverage ({} of total cost)", percent(terms.public_coverage)),
            requirements: terms.public_requirements.clone(),
        },
        private_insurance: CoveragePlan {
            coverage: terms.insurance_coverage,
            amount: cost * (1.0 - terms.insurance_coverage),
            description: format!(
                "Private insurance coverage ({} of total cost)",
                percent(terms.insurance_coverage)
            ),
            requirements: terms.insurance_requirements.clone(),
        },
        installment: InstallmentPlan {
            down_payment,
            monthly_payment,
            months,
            interest_rate: rate,
            total_amount: down_payment + monthly_payment * months as f64,
            description: format!("{months}-month installment plan with {} interest", percent(rate)),
        },
    }
}

/// Estimate the cost of the plan for `label` at the assessed risk.
/// A missing charge is reported as `Not Available` with a zero base cost.
pub fn estimate(
    label: &TreatmentLabel,
    risk: &RiskAssessment,
    tables: &ReferenceTables,
    charges: &ChargesTable,
) -> CostEstimate {
    let policy = &tables.costing;

    let charge = match tables.service_fragment(label) {
        Some(fragment) => charges.find_service(fragment),
        None => Lookup::NotFound,
    };

    let (status, service_name, base_cost, out_of_pocket) = match charge {
        Lookup::Found(record) => (
            CostStatus::Available,
            Some(record.service.clone()),
            record.base_cost,
            Some(record.out_of_pocket),
        ),
        Lookup::NotFound => {
            warn!("No charge found for label `{}`; base cost set to 0", label);
            (CostStatus::NotAvailable, None, 0.0, None)
        }
    };

    let additional_costs = AncillaryCosts::for_label(&policy.ancillary, label);
    let total_base_cost = base_cost + additional_costs.total();
    let risk_multiplier = policy.risk_multipliers.for_level(risk.level);
    let risk_adjusted_cost = total_base_cost * risk_multiplier;

    CostEstimate {
        status,
        service_name,
        base_cost,
        out_of_pocket,
        additional_costs,
        total_base_cost,
        risk_level: risk.level,
        risk_multiplier,
        risk_adjusted_cost,
        financing_options: financing_options(risk_adjusted_cost, &policy.financing),
        currency: policy.currency.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CHARGES: &str = "\
Service,Base Cost (KES),Out-of-Pocket (KES)
Initial Consultation,1500,500
Ovarian Cystectomy (Laparoscopic),120000,30000
Pain Management Clinic,2500,800
";

    fn charges() -> ChargesTable {
        ChargesTable::from_reader(CHARGES.as_bytes()).unwrap()
    }

    fn risk(level: RiskLevel) -> RiskAssessment {
        RiskAssessment { level, score: 0, factors: vec![] }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_surgery_medium_risk() {
        let est = estimate(&TreatmentLabel::Surgery, &risk(RiskLevel::Medium), &ReferenceTables::default(), &charges());
        assert_eq!(est.status, CostStatus::Available);
        assert_eq!(est.service_name.as_deref(), Some("Ovarian Cystectomy (Laparoscopic)"));
        assert_eq!(est.out_of_pocket, Some(30000.0));
        assert_eq!(est.additional_costs.medications, None);
        assert!(close(est.total_base_cost, 128500.0));
        assert!(close(est.risk_adjusted_cost, 154200.0));

        let f = &est.financing_options;
        assert!(close(f.cash_payment.amount, 146490.0));
        assert!(close(f.public_coverage.amount, 30840.0));
        assert!(close(f.private_insurance.amount, 15420.0));
        assert!(close(f.installment.down_payment, 46260.0));
        assert!(close(f.installment.monthly_payment, 19069.4));
        assert!(close(f.installment.total_amount, 160676.4));
        assert_eq!(est.currency, "KES");
    }

    #[test]
    fn test_medication_adds_drug_cost() {
        let est = estimate(&TreatmentLabel::Medication, &risk(RiskLevel::Low), &ReferenceTables::default(), &charges());
        assert_eq!(est.additional_costs.medications, Some(5000.0));
        assert!(close(est.total_base_cost, 2500.0 + 13500.0));
        assert!(close(est.risk_adjusted_cost, est.total_base_cost));
    }

    #[test]
    fn test_missing_charge_is_not_available() {
        let est = estimate(&TreatmentLabel::Referral, &risk(RiskLevel::High), &ReferenceTables::default(), &charges());
        assert_eq!(est.status, CostStatus::NotAvailable);
        assert_eq!(est.base_cost, 0.0);
        assert!(close(est.risk_adjusted_cost, 8500.0 * 1.5));
    }

    #[test]
    fn test_unknown_label_is_not_available() {
        let est = estimate(&TreatmentLabel::parse("Watchful waiting"), &risk(RiskLevel::Low), &ReferenceTables::default(), &charges());
        assert_eq!(est.status, CostStatus::NotAvailable);
        assert_eq!(est.service_name, None);
        assert!(close(est.total_base_cost, 8500.0));
    }

    #[test]
    fn test_financing_invariants() {
        let terms = FinancingTerms::default();
        for cost in [0.0, 1.0, 8500.0, 154200.0, 1.0e7] {
            let f = financing_options(cost, &terms);
            assert!(close(f.cash_payment.amount, 0.95 * cost));
            assert!(close(f.public_coverage.amount, 0.20 * cost));
            assert!(close(f.private_insurance.amount, 0.10 * cost));
            assert!(f.installment.total_amount >= cost);
            if cost > 0.0 {
                assert!(f.installment.total_amount > f.cash_payment.amount);
            }
        }
    }

    #[test]
    fn test_descriptions_follow_terms() {
        let f = financing_options(100.0, &FinancingTerms::default());
        assert_eq!(f.cash_payment.description, "Cash payment with 5% discount");
        assert_eq!(f.installment.description, "6-month installment plan with 12% interest");
        assert_eq!(f.public_coverage.requirements, vec!["Valid NHIF card", "Referral letter"]);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&CostStatus::NotAvailable).unwrap(), "\"Not Available\"");
    }
}
