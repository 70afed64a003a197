//! Lease inputs and tenant profiles

use serde::{Deserialize, Serialize};

use crate::assumptions::ReplacementTenantAssumptions;
use crate::financing::Financing;

/// The seven lease inputs a projection is a pure function of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseTerms {
    /// Tenant name; `None` models a vacant unit that does not reimburse expenses
    pub name: Option<String>,

    /// Rent per sqm in the first lease year
    pub initial_rent_per_sqm: f64,

    /// Lease term in years
    pub term_years: u32,

    /// Annual rent escalation
    pub annual_increase: f64,

    /// Whether the tenant is contractually bound to complete the term
    pub is_guarantee: bool,

    /// Rent-free months at lease start
    pub abatement_months: u32,

    /// Tenant improvement allowance per sqm
    pub ti_per_sqm: f64,

    /// Exit cap rate used to price a terminal sale
    pub cap_rate: f64,
}

impl LeaseTerms {
    pub fn reimburses_expenses(&self) -> bool {
        self.name.is_some()
    }

    /// Same lease with a different term
    pub fn with_term(&self, term_years: u32) -> Self {
        Self { term_years, ..self.clone() }
    }

    /// Same lease with a different exit cap rate
    pub fn with_cap_rate(&self, cap_rate: f64) -> Self {
        Self { cap_rate, ..self.clone() }
    }

    /// Lease for the tenant who re-lets the space `years_elapsed` years after base year,
    /// with rent escalated from base-year terms
    pub fn replacement(assumptions: &ReplacementTenantAssumptions, years_elapsed: f64) -> Self {
        Self {
            name: assumptions.name.clone(),
            initial_rent_per_sqm: assumptions.base_rent_per_sqm
                * (1.0 + assumptions.annual_increase).powf(years_elapsed),
            term_years: assumptions.term_years,
            annual_increase: assumptions.annual_increase,
            is_guarantee: assumptions.is_guarantee,
            abatement_months: assumptions.abatement_months,
            ti_per_sqm: assumptions.ti_per_sqm,
            cap_rate: assumptions.cap_rate,
        }
    }
}

/// Published figures for a financing structure, for comparison only
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancingBenchmarks {
    pub unleveraged: f64,
    pub lender_a: f64,
    pub lender_b: f64,
}

impl FinancingBenchmarks {
    pub fn for_financing(&self, financing: Financing) -> f64 {
        match financing {
            Financing::Unleveraged => self.unleveraged,
            Financing::LenderA => self.lender_a,
            Financing::LenderB => self.lender_b,
        }
    }
}

/// Tenant parameters as supplied by the leasing team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantProfile {
    pub name: String,
    pub total_sqm: f64,
    pub term_months: u32,
    pub is_guaranteed: bool,
    pub initial_rent: f64,
    pub initial_rent_per_sqm: f64,
    pub annual_increase: f64,
    pub abatement_months: u32,
    pub ti_per_sqm: f64,
    pub exit_cap_rate: f64,
    #[serde(default)]
    pub benchmark_equity_multiple: Option<FinancingBenchmarks>,
    #[serde(default)]
    pub benchmark_irr: Option<FinancingBenchmarks>,
}

impl TenantProfile {
    pub fn term_years(&self) -> u32 {
        self.term_months / 12
    }

    pub fn lease_terms(&self) -> LeaseTerms {
        LeaseTerms {
            name: Some(self.name.clone()),
            initial_rent_per_sqm: self.initial_rent_per_sqm,
            term_years: self.term_years(),
            annual_increase: self.annual_increase,
            is_guarantee: self.is_guaranteed,
            abatement_months: self.abatement_months,
            ti_per_sqm: self.ti_per_sqm,
            cap_rate: self.exit_cap_rate,
        }
    }

    pub fn topshop() -> Self {
        Self {
            name: "Topshop".into(),
            total_sqm: 2400.0,
            term_months: 120,
            is_guaranteed: false,
            initial_rent: 2_000_000.0,
            initial_rent_per_sqm: 833.0,
            annual_increase: 0.025,
            abatement_months: 0,
            ti_per_sqm: 200.0,
            exit_cap_rate: 0.08,
            benchmark_equity_multiple: Some(FinancingBenchmarks { unleveraged: 2.92, lender_a: 2.11, lender_b: 2.52 }),
            benchmark_irr: Some(FinancingBenchmarks { unleveraged: 0.51, lender_a: 0.66, lender_b: 0.49 }),
        }
    }

    pub fn zara() -> Self {
        Self {
            name: "Zara".into(),
            total_sqm: 2400.0,
            term_months: 144,
            is_guaranteed: true,
            initial_rent: 1_400_000.0,
            initial_rent_per_sqm: 583.0,
            annual_increase: 0.025,
            abatement_months: 12,
            ti_per_sqm: 600.0,
            exit_cap_rate: 0.055,
            benchmark_equity_multiple: Some(FinancingBenchmarks { unleveraged: 2.62, lender_a: 1.93, lender_b: 2.25 }),
            benchmark_irr: Some(FinancingBenchmarks { unleveraged: 0.41, lender_a: 0.53, lender_b: 0.37 }),
        }
    }

    pub fn decathlon() -> Self {
        Self {
            name: "Decathlon".into(),
            total_sqm: 2400.0,
            term_months: 120,
            is_guaranteed: true,
            initial_rent: 1_700_000.0,
            initial_rent_per_sqm: 708.0,
            annual_increase: 0.025,
            abatement_months: 9,
            ti_per_sqm: 400.0,
            exit_cap_rate: 0.055,
            benchmark_equity_multiple: Some(FinancingBenchmarks { unleveraged: 3.28, lender_a: 2.32, lender_b: 2.72 }),
            benchmark_irr: Some(FinancingBenchmarks { unleveraged: 0.53, lender_a: 0.67, lender_b: 0.46 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_to_lease_terms() {
        let terms = TenantProfile::zara().lease_terms();
        assert_eq!(terms.term_years, 12);
        assert_eq!(terms.abatement_months, 12);
        assert_eq!(terms.cap_rate, 0.055);
        assert!(terms.reimburses_expenses());
    }

    #[test]
    fn test_with_term_leaves_original_untouched() {
        let terms = TenantProfile::topshop().lease_terms();
        let shorter = terms.with_term(6).with_cap_rate(0.07);
        assert_eq!(terms.term_years, 10);
        assert_eq!(terms.cap_rate, 0.08);
        assert_eq!(shorter.term_years, 6);
        assert_eq!(shorter.cap_rate, 0.07);
    }

    #[test]
    fn test_benchmark_lookup() {
        let irr = TenantProfile::decathlon().benchmark_irr.unwrap();
        assert_eq!(irr.for_financing(Financing::Unleveraged), 0.53);
        assert_eq!(irr.for_financing(Financing::LenderA), 0.67);
        assert_eq!(irr.for_financing(Financing::LenderB), 0.46);
    }

    #[test]
    fn test_replacement_rent_uses_fractional_years() {
        let assumptions = ReplacementTenantAssumptions::default();
        let terms = LeaseTerms::replacement(&assumptions, 10.25);
        let expected = 708.0 * 1.025f64.powf(10.25);
        assert!((terms.initial_rent_per_sqm - expected).abs() < 1e-9);
        assert_eq!(terms.term_years, 10);
    }
}
