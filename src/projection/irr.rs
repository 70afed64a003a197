//! Internal Rate of Return on date-stamped cash flows
//!
//! Discount exponents are elapsed days since the first cash flow divided by
//! the day-count denominator, so irregular dates (vacancy re-letting,
//! pre-closing deposits) are priced exactly.

use serde::{Deserialize, Serialize};

use super::cashflows::{DatedCashFlow, DatedCashFlows};
use crate::assumptions::DateConvention;

/// Starting discount base (1 + rate) for the step-halving search
pub const INITIAL_GUESS: f64 = 0.05;
/// Starting step for the step-halving search
pub const INITIAL_STEP: f64 = 0.05;
/// Absolute NPV residual accepted as a root
pub const TOLERANCE: f64 = 1e-4;
/// Iteration budget for the step-halving search
pub const MAX_ITERATIONS: u32 = 10_000;

/// Root finder used for IRR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum IrrSolver {
    /// Step search on the discount base with step halving on every downward move.
    /// Matches the figures the deal team has always produced.
    #[default]
    StepHalving,
    /// Newton-Raphson on the rate with a bracketing bisection fallback.
    /// More robust, but can land on a different root than `StepHalving`
    /// when the series changes sign more than once.
    Newton,
}

impl IrrSolver {
    pub fn solve(self, flows: &[DatedCashFlow], days_per_year: f64) -> Option<f64> {
        match self {
            IrrSolver::StepHalving => xirr(flows, days_per_year),
            IrrSolver::Newton => xirr_newton(flows, days_per_year),
        }
    }
}

fn year_fractions(flows: &[DatedCashFlow], days_per_year: f64) -> Vec<f64> {
    let first = flows.first().map(|f| f.date);
    flows
        .iter()
        .map(|f| match first {
            Some(start) => (f.date - start).num_days() as f64 / days_per_year,
            None => 0.0,
        })
        .collect()
}

/// XIRR by step search on the discount base `g = 1 + r`.
///
/// Starting at `g = 0.05` with step `0.05`: a positive NPV residual moves `g`
/// up by the step; otherwise `g` moves down by the step and the step halves.
/// Stops once `|residual| <= 1e-4`.
///
/// # Returns
/// * `Some(g - 1)` on convergence
/// * `None` if a discount factor `g^t` is zero or not finite, or the
///   10,000-iteration budget runs out
///
/// The search is not bracketed. With more than one sign change in the
/// series it can stall or settle on the wrong root.
pub fn xirr(flows: &[DatedCashFlow], days_per_year: f64) -> Option<f64> {
    if flows.is_empty() {
        return None;
    }
    let years = year_fractions(flows, days_per_year);

    let mut residual = 1.0_f64;
    let mut step = INITIAL_STEP;
    let mut guess = INITIAL_GUESS;
    let mut remaining = MAX_ITERATIONS;

    while residual.abs() > TOLERANCE && remaining > 0 {
        remaining -= 1;
        residual = 0.0;
        for (flow, &t) in flows.iter().zip(&years) {
            let factor = guess.powf(t);
            if factor == 0.0 || !factor.is_finite() {
                return None;
            }
            residual += flow.amount / factor;
        }

        if residual.abs() > TOLERANCE {
            if residual > 0.0 {
                guess += step;
            } else {
                guess -= step;
                step /= 2.0;
            }
        }
    }

    if !residual.is_finite() || residual.abs() > TOLERANCE {
        return None;
    }
    Some(guess - 1.0)
}

/// NPV and its derivative with respect to the annual rate
fn npv_and_derivative(flows: &[DatedCashFlow], years: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (flow, &t) in flows.iter().zip(years) {
        npv += flow.amount / (1.0 + rate).powf(t);
        if t > 0.0 {
            dnpv -= t * flow.amount / (1.0 + rate).powf(t + 1.0);
        }
    }

    (npv, dnpv)
}

fn npv_at_rate(flows: &[DatedCashFlow], years: &[f64], rate: f64) -> f64 {
    npv_and_derivative(flows, years, rate).0
}

/// XIRR by Newton-Raphson, falling back to bisection on [-99%, 1000%]
pub fn xirr_newton(flows: &[DatedCashFlow], days_per_year: f64) -> Option<f64> {
    if flows.is_empty() {
        return None;
    }

    // No sign change means no IRR
    let has_positive = flows.iter().any(|f| f.amount > 1e-10);
    let has_negative = flows.iter().any(|f| f.amount < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    let years = year_fractions(flows, days_per_year);
    let mut rate = INITIAL_GUESS;
    let tolerance = 1e-10;

    for _ in 0..1000 {
        let (npv, dnpv) = npv_and_derivative(flows, &years, rate);

        if dnpv.abs() < 1e-20 || !dnpv.is_finite() {
            return xirr_bisection(flows, &years);
        }

        let new_rate = (rate - npv / dnpv).max(-0.99).min(10.0);

        if (new_rate - rate).abs() < tolerance {
            return Some(new_rate);
        }

        rate = new_rate;
    }

    xirr_bisection(flows, &years)
}

fn xirr_bisection(flows: &[DatedCashFlow], years: &[f64]) -> Option<f64> {
    let mut low = -0.99_f64;
    let mut high = 10.0_f64;
    let tolerance = 1e-10;

    if npv_at_rate(flows, years, low) * npv_at_rate(flows, years, high) > 0.0 {
        return None;
    }

    for _ in 0..1000 {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(flows, years, mid);

        if npv_mid.abs() < tolerance || (high - low) / 2.0 < tolerance {
            return Some(mid);
        }

        if npv_mid * npv_at_rate(flows, years, low) < 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    None
}

/// IRR counting the pre-closing deposit as an outflow.
///
/// Two points are placed ahead of the series: the deposit on the deposit
/// date and a zero placeholder on the closing date.
pub fn irr_with_sunk_cost(
    cash_flows: &DatedCashFlows,
    deposit: f64,
    dates: &DateConvention,
    solver: IrrSolver,
) -> Option<f64> {
    let mut flows = Vec::with_capacity(cash_flows.len() + 2);
    flows.push(DatedCashFlow { date: dates.deposit_date, amount: -deposit });
    flows.push(DatedCashFlow { date: dates.closing_date, amount: 0.0 });
    flows.extend_from_slice(cash_flows.flows());
    solver.solve(&flows, dates.days_per_year)
}

/// IRR of the series exactly as supplied, treating the deposit as sunk
pub fn irr_without_sunk_cost(cash_flows: &DatedCashFlows, dates: &DateConvention, solver: IrrSolver) -> Option<f64> {
    solver.solve(cash_flows.flows(), dates.days_per_year)
}
