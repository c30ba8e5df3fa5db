//! Costing policy: ancillary fees, risk multipliers, and financing terms.
//! Values default to the national tariff used by the referral hospitals.

use serde::{Deserialize, Serialize};

use crate::entities::RiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostingPolicy {
    /// Deployment-wide currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub ancillary: AncillaryFees,

    #[serde(default)]
    pub risk_multipliers: RiskMultipliers,

    #[serde(default)]
    pub financing: FinancingTerms,
}

fn default_currency() -> String { "KES".to_string() }

impl Default for CostingPolicy {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            ancillary: AncillaryFees::default(),
            risk_multipliers: RiskMultipliers::default(),
            financing: FinancingTerms::default(),
        }
    }
}

/// Fixed fees added on top of the base service charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncillaryFees {
    #[serde(default = "default_consultation")]
    pub consultation: f64,
    #[serde(default = "default_ultrasound")]
    pub ultrasound: f64,
    #[serde(default = "default_lab_tests")]
    pub lab_tests: f64,
    /// Charged only for the Medication plan
    #[serde(default = "default_medications")]
    pub medications: f64,
    #[serde(default = "default_follow_up")]
    pub follow_up: f64,
}

fn default_consultation() -> f64 { 2000.0 }
fn default_ultrasound()   -> f64 { 3000.0 }
fn default_lab_tests()    -> f64 { 1500.0 }
fn default_medications()  -> f64 { 5000.0 }
fn default_follow_up()    -> f64 { 2000.0 }

impl Default for AncillaryFees {
    fn default() -> Self {
        Self {
            consultation: default_consultation(),
            ultrasound:   default_ultrasound(),
            lab_tests:    default_lab_tests(),
            medications:  default_medications(),
            follow_up:    default_follow_up(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMultipliers {
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_high")]
    pub high: f64,
}

fn default_low()    -> f64 { 1.0 }
fn default_medium() -> f64 { 1.2 }
fn default_high()   -> f64 { 1.5 }

impl Default for RiskMultipliers {
    fn default() -> Self {
        Self { low: default_low(), medium: default_medium(), high: default_high() }
    }
}

impl RiskMultipliers {
    pub fn for_level(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low    => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High   => self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingTerms {
    /// Discount for paying cash up front
    #[serde(default = "default_cash_discount")]
    pub cash_discount: f64,
    /// Share of the cost covered by the national health insurance fund
    #[serde(default = "default_public_coverage")]
    pub public_coverage: f64,
    #[serde(default = "default_public_requirements")]
    pub public_requirements: Vec<String>,
    /// Share of the cost covered by private insurance
    #[serde(default = "default_insurance_coverage")]
    pub insurance_coverage: f64,
    #[serde(default = "default_insurance_requirements")]
    pub insurance_requirements: Vec<String>,
    #[serde(default = "default_down_payment")]
    pub installment_down_payment: f64,
    #[serde(default = "default_months")]
    pub installment_months: u32,
    /// Simple annual interest applied to the financed remainder
    #[serde(default = "default_annual_interest")]
    pub installment_annual_interest: f64,
}

fn default_cash_discount()     -> f64 { 0.05 }
fn default_public_coverage()   -> f64 { 0.80 }
fn default_insurance_coverage() -> f64 { 0.90 }
fn default_down_payment()      -> f64 { 0.30 }
fn default_months()            -> u32 { 6 }
fn default_annual_interest()   -> f64 { 0.12 }

fn default_public_requirements() -> Vec<String> {
    vec!["Valid NHIF card".to_string(), "Referral letter".to_string()]
}

fn default_insurance_requirements() -> Vec<String> {
    vec!["Insurance card".to_string(), "Pre-authorization".to_string()]
}

impl Default for FinancingTerms {
    fn default() -> Self {
        Self {
            cash_discount: default_cash_discount(),
            public_coverage: default_public_coverage(),
            public_requirements: default_public_requirements(),
            insurance_coverage: default_insurance_coverage(),
            insurance_requirements: default_insurance_requirements(),
            installment_down_payment: default_down_payment(),
            installment_months: default_months(),
            installment_annual_interest: default_annual_interest(),
        }
    }
}

impl CostingPolicy {
    /// Returns a list of problems; empty means the policy is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let fees = [
            ("consultation", self.ancillary.consultation),
            ("ultrasound", self.ancillary.ultrasound),
            ("lab_tests", self.ancillary.lab_tests),
            ("medications", self.ancillary.medications),
            ("follow_up", self.ancillary.follow_up),
        ];
        for (name, fee) in fees {
            if !fee.is_finite() || fee < 0.0 {
                problems.push(format!("ancillary fee `{name}` must be a non-negative number"));
            }
        }

        let m = &self.risk_multipliers;
        if !(m.low >= 1.0 && m.low <= m.medium && m.medium <= m.high && m.high.is_finite()) {
            problems.push("risk multipliers must satisfy 1.0 <= low <= medium <= high".to_string());
        }

        let f = &self.financing;
        let fractions = [
            ("cash_discount", f.cash_discount),
            ("public_coverage", f.public_coverage),
            ("insurance_coverage", f.insurance_coverage),
            ("installment_down_payment", f.installment_down_payment),
        ];
        for (name, v) in fractions {
            if !(0.0..=1.0).contains(&v) {
                problems.push(format!("financing `{name}` must be within [0, 1]"));
            }
        }
        if f.installment_months == 0 {
            problems.push("installment_months must be at least 1".to_string());
        }
        if !f.installment_annual_interest.is_finite() || f.installment_annual_interest < 0.0 {
            problems.push("installment_annual_interest must be non-negative".to_string());
        }

        if self.currency.trim().is_empty() {
            problems.push("currency must not be empty".to_string());
        }

        problems
    }
}
