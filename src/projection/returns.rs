//! Investor return metrics: IRR and equity multiple, with and without the sunk deposit

use serde::{Deserialize, Serialize};

use super::cashflows::DatedCashFlows;
use super::irr::{irr_with_sunk_cost, irr_without_sunk_cost, IrrSolver};
use crate::assumptions::Assumptions;

/// Sum of strictly positive cash flows
pub fn total_distributions(amounts: &[f64]) -> f64 {
    amounts.iter().filter(|&&cf| cf > 0.0).sum()
}

/// `seed` plus the magnitude of every non-positive cash flow
pub fn total_invested(amounts: &[f64], seed: f64) -> f64 {
    amounts.iter().filter(|&&cf| cf <= 0.0).fold(seed, |acc, cf| acc - cf)
}

fn ratio(amounts: &[f64], seed: f64) -> Option<f64> {
    let invested = total_invested(amounts, seed);
    if invested == 0.0 {
        return None;
    }
    Some(total_distributions(amounts) / invested)
}

/// Equity multiple counting the deposit as capital invested
pub fn equity_multiple(amounts: &[f64], deposit: f64) -> Option<f64> {
    ratio(amounts, deposit)
}

/// Equity multiple over the supplied series only
pub fn equity_multiple_no_sunk_cost(amounts: &[f64]) -> Option<f64> {
    ratio(amounts, 0.0)
}

/// The four headline return figures for one outcome.
///
/// Any figure is `None` when it is undefined for the series: no IRR
/// root was found, or the multiple has nothing invested to divide by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub irr: Option<f64>,
    pub irr_no_sunk_cost: Option<f64>,
    pub equity_multiple: Option<f64>,
    pub equity_multiple_no_sunk_cost: Option<f64>,
}

impl ReturnMetrics {
    pub fn compute(cash_flows: &DatedCashFlows, assumptions: &Assumptions, solver: IrrSolver) -> Self {
        let deposit = assumptions.property.deposit;
        let amounts = cash_flows.amounts();

        Self {
            irr: irr_with_sunk_cost(cash_flows, deposit, &assumptions.dates, solver),
            irr_no_sunk_cost: irr_without_sunk_cost(cash_flows, &assumptions.dates, solver),
            equity_multiple: equity_multiple(&amounts, deposit),
            equity_multiple_no_sunk_cost: equity_multiple_no_sunk_cost(&amounts),
        }
    }

    /// Probability-weighted expectation over scenarios.
    ///
    /// A figure is `None` if it is `None` in any scenario; the partial
    /// expectation over the remaining scenarios would be biased.
    pub fn expectation(weighted: &[(f64, ReturnMetrics)]) -> Self {
        fn expect(weighted: &[(f64, ReturnMetrics)], field: impl Fn(&ReturnMetrics) -> Option<f64>) -> Option<f64> {
            weighted
                .iter()
                .try_fold(0.0, |acc, (p, m)| field(m).map(|x| acc + p * x))
        }

        if weighted.is_empty() {
            return Self::default();
        }

        Self {
            irr: expect(weighted, |m| m.irr),
            irr_no_sunk_cost: expect(weighted, |m| m.irr_no_sunk_cost),
            equity_multiple: expect(weighted, |m| m.equity_multiple),
            equity_multiple_no_sunk_cost: expect(weighted, |m| m.equity_multiple_no_sunk_cost),
        }
    }

    /// True if every figure is defined
    pub fn is_complete(&self) -> bool {
        self.irr.is_some()
            && self.irr_no_sunk_cost.is_some()
            && self.equity_multiple.is_some()
            && self.equity_multiple_no_sunk_cost.is_some()
    }
}
