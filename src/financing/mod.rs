//! Financing structures layered on top of a lease projection
//!
//! Every structure turns the projected cash flow before debt service into the
//! investor's annual series, period 0 being acquisition. Amounts are signed
//! from the investor's side: outflows negative, inflows positive.

pub mod lender_a;
pub mod lender_b;
pub mod unleveraged;

pub use lender_a::LenderA;
pub use lender_b::LenderB;
pub use unleveraged::{future_unleveraged_cash_flow, unleveraged_cash_flow};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::projection::LeaseProjection;

/// Capital structure used to buy the property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Financing {
    Unleveraged,
    LenderA,
    LenderB,
}

impl Financing {
    pub const ALL: [Financing; 3] = [Financing::Unleveraged, Financing::LenderA, Financing::LenderB];
}

impl fmt::Display for Financing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Financing::Unleveraged => "Unleveraged",
            Financing::LenderA => "Lender A",
            Financing::LenderB => "Lender B",
        };
        f.write_str(label)
    }
}

/// Net cash flow after debt service and fees, with the coverage ratio per serviced year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanCashFlow {
    pub net_cash_flow: Vec<f64>,

    /// NOI / debt service for each year debt service is paid
    pub dscr: Vec<f64>,
}

/// A structured loan product
pub trait LoanModel: Sync {
    fn name(&self) -> &'static str;

    /// Loan amount advanced at closing
    fn loan_proceeds(&self) -> f64;

    /// Lease cash flow net of debt service and lender fees, one entry per year
    /// through `exit_year` inclusive. `None` uses the product's default exit.
    fn net_cash_flow(&self, projection: &LeaseProjection, exit_year: Option<u32>) -> ModelResult<LoanCashFlow>;

    /// Investor series: net cash flow plus acquisition funding, loan payoff and,
    /// when `include_sale` is set, a terminal sale in the final period
    fn leveraged_cash_flow(
        &self,
        net_cash_flow: &[f64],
        projection: &LeaseProjection,
        exit_year: u32,
        include_sale: bool,
    ) -> ModelResult<Vec<f64>>;

    /// Balance still owed at `sale_year` that the leveraged series does not already repay
    fn unrepaid_balance(&self, sale_year: u32) -> ModelResult<f64>;
}

/// Periodic payment of a level annuity.
///
/// Same sign convention as a spreadsheet PMT: a positive `present_value`
/// (money received) gives a negative payment.
pub fn pmt(rate: f64, nper: u32, present_value: f64) -> ModelResult<f64> {
    if nper == 0 {
        return Err(ModelError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate == 0.0 {
        return Ok(-present_value / nper as f64);
    }

    let factor = (1.0 + rate).powi(nper as i32);
    let annuity_factor = (factor - 1.0) / rate;

    if annuity_factor == 0.0 || !annuity_factor.is_finite() {
        return Err(ModelError::InvalidInput {
            field: "rate".into(),
            reason: format!("PMT annuity factor undefined at rate {}", rate),
        });
    }

    Ok(-present_value * factor / annuity_factor)
}

/// Present value of `nper` level payments; a negative payment gives a positive value
pub fn pv(rate: f64, nper: u32, payment: f64) -> f64 {
    if rate == 0.0 {
        return -payment * nper as f64;
    }
    let factor = (1.0 + rate).powi(nper as i32);
    -payment * (1.0 - 1.0 / factor) / rate
}

/// Property value from capitalizing NOI of `period`, clamped to the final NOI
pub(crate) fn terminal_sale_price(net_operating_income: &[f64], period: usize, cap_rate: f64) -> ModelResult<f64> {
    let noi = net_operating_income
        .get(period)
        .or_else(|| net_operating_income.last())
        .copied()
        .ok_or_else(|| ModelError::InvalidInput {
            field: "net_operating_income".into(),
            reason: "lease has no projected years to price a sale from".into(),
        })?;
    Ok(noi / cap_rate)
}

/// Investor period 0: net cash flow less purchase price plus loan proceeds
pub(crate) fn fund_acquisition(net_cash_flow: &[f64], purchase_price: f64, loan_proceeds: f64) -> ModelResult<Vec<f64>> {
    let (first, rest) = net_cash_flow.split_first().ok_or_else(|| ModelError::InvalidInput {
        field: "net_cash_flow".into(),
        reason: "empty series".into(),
    })?;
    let mut leveraged = Vec::with_capacity(net_cash_flow.len());
    leveraged.push(first - purchase_price + loan_proceeds);
    leveraged.extend_from_slice(rest);
    Ok(leveraged)
}

/// `-NOI / debt service` for each year in `years`
pub(crate) fn coverage_ratios(net_operating_income: &[f64], debt_service: &[f64], years: usize) -> Vec<f64> {
    (0..years)
        .map(|i| -net_operating_income.get(i).copied().unwrap_or(0.0) / debt_service[i])
        .collect()
}
