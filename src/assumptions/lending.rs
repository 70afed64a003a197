//! Terms of the two structured-loan products on offer

use serde::{Deserialize, Serialize};

/// Lender A: level amortizing payments, extension and exit fees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderATerms {
    /// Loan-to-value applied to deposit + purchase price
    pub ltv: f64,

    /// Initial term in years; each year past it up to `max_term_years` is an extension
    pub initial_term_years: u32,

    /// Last year debt service is paid and the year the exit fee falls at the latest
    pub max_term_years: u32,

    /// Amortization period (months)
    pub amortization_months: u32,

    /// Annual interest rate
    pub interest_rate: f64,

    /// Entry fee as a share of loan proceeds
    pub entry_fee: f64,

    /// Fee per extension year as a share of loan proceeds
    pub per_extension_fee: f64,

    /// Exit fee as a share of loan proceeds
    pub exit_fee: f64,
}

impl Default for LenderATerms {
    fn default() -> Self {
        Self {
            ltv: 0.7,
            initial_term_years: 2,
            max_term_years: 4,
            amortization_months: 240,
            interest_rate: 0.05,
            entry_fee: 0.01,
            per_extension_fee: 0.005,
            exit_fee: 0.01,
        }
    }
}

/// Lender B: interest-only start, amortizing to year 5, yield-maintenance prepayment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderBTerms {
    /// Loan-to-value applied to deposit + purchase price
    pub ltv: f64,

    /// Years of interest-only payments at the start of the loan
    pub interest_only_years: u32,

    /// Debt service stops after this year; the balance is repaid here
    pub amortizing_through_year: u32,

    /// Earliest permitted exit; exiting exactly here triggers the prepayment penalty
    pub minimum_exit_year: u32,

    /// Amortization period (months)
    pub amortization_months: u32,

    /// Annual interest rate
    pub interest_rate: f64,

    /// Flat entry fee as a share of loan proceeds
    pub entry_fee: f64,

    /// Treasury benchmark for the prepayment penalty
    pub treasury_yield: f64,
}

impl Default for LenderBTerms {
    fn default() -> Self {
        Self {
            ltv: 0.6,
            interest_only_years: 2,
            amortizing_through_year: 5,
            minimum_exit_year: 4,
            amortization_months: 240,
            interest_rate: 0.035,
            entry_fee: 0.005,
            treasury_yield: 0.0014,
        }
    }
}
