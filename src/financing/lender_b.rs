//! Lender B: interest-only start, amortizing payments through
//! `amortizing_through_year`, and a yield-maintenance penalty when the
//! borrower exits in the earliest permitted year

use super::{coverage_ratios, fund_acquisition, pmt, pv, terminal_sale_price, LoanCashFlow, LoanModel};
use crate::assumptions::{LenderBTerms, PropertyAssumptions};
use crate::error::{ModelError, ModelResult};
use crate::projection::LeaseProjection;

#[derive(Debug, Clone)]
pub struct LenderB<'a> {
    terms: &'a LenderBTerms,
    property: &'a PropertyAssumptions,
}

impl<'a> LenderB<'a> {
    pub fn new(terms: &'a LenderBTerms, property: &'a PropertyAssumptions) -> Self {
        Self { terms, property }
    }

    /// Interest-only annual payment (negative)
    pub fn interest_only_payment(&self) -> f64 {
        -self.terms.interest_rate * self.loan_proceeds()
    }

    /// Amortizing annual payment (negative)
    pub fn annual_payment(&self) -> ModelResult<f64> {
        let monthly = pmt(
            self.terms.interest_rate / 12.0,
            self.terms.amortization_months,
            self.loan_proceeds(),
        )?;
        Ok(monthly * 12.0)
    }

    /// Year the loan is repaid when exiting in `exit_year`
    fn expiry_year(&self, exit_year: u32) -> u32 {
        exit_year.min(self.terms.amortizing_through_year)
    }

    /// Balance outstanding at `year`, amortization having started after the interest-only years
    pub fn balance_at(&self, year: u32) -> ModelResult<f64> {
        let amortized_months = 12 * year.saturating_sub(self.terms.interest_only_years);
        let remaining = self.terms.amortization_months.saturating_sub(amortized_months);
        Ok(pv(self.terms.interest_rate / 12.0, remaining, self.annual_payment()? / 12.0))
    }

    /// Yield-maintenance charge for exiting in the minimum exit year (negative)
    pub fn prepayment_penalty(&self) -> ModelResult<f64> {
        let treasury = self.terms.treasury_yield;
        let treasury_factor = if treasury == 0.0 {
            -1.0
        } else {
            (1.0 - (1.0 + treasury)) / treasury
        };
        let balance = self.balance_at(self.terms.minimum_exit_year)?;
        Ok((self.terms.interest_rate - treasury) * treasury_factor * balance)
    }

    /// Debt service for years `0..exit_year` (negative amounts)
    pub fn debt_service(&self, exit_year: u32) -> ModelResult<Vec<f64>> {
        let interest_only = self.interest_only_payment();
        let amortizing = self.annual_payment()?;
        let expiry = self.expiry_year(exit_year);

        Ok((0..exit_year)
            .map(|year| {
                if year < self.terms.interest_only_years {
                    interest_only
                } else if year < expiry {
                    amortizing
                } else {
                    0.0
                }
            })
            .collect())
    }
}

impl LoanModel for LenderB<'_> {
    fn name(&self) -> &'static str {
        "Lender B"
    }

    fn loan_proceeds(&self) -> f64 {
        self.property.total_cost() * self.terms.ltv
    }

    /// Defaults to exiting at the end of the lease term.
    ///
    /// # Errors
    /// `ExitYearTooEarly` if the exit year is below the minimum exit year.
    fn net_cash_flow(&self, projection: &LeaseProjection, exit_year: Option<u32>) -> ModelResult<LoanCashFlow> {
        let exit = exit_year.unwrap_or(projection.term_years() as u32);
        if exit < self.terms.minimum_exit_year {
            return Err(ModelError::ExitYearTooEarly {
                lender: self.name(),
                exit_year: exit,
                minimum: self.terms.minimum_exit_year,
            });
        }

        let cfbds = &projection.cash_flow_before_debt_service;
        let debt_service = self.debt_service(exit)?;

        let mut net_cash_flow: Vec<f64> = debt_service
            .iter()
            .enumerate()
            .map(|(i, debt)| cfbds.get(i).copied().unwrap_or(0.0) + debt)
            .collect();
        net_cash_flow.push(0.0);
        net_cash_flow[0] -= self.terms.entry_fee * self.loan_proceeds();

        if exit == self.terms.minimum_exit_year {
            net_cash_flow[exit as usize] = self.prepayment_penalty()?;
        }

        let serviced = self.expiry_year(exit) as usize;
        let dscr = coverage_ratios(&projection.net_operating_income, &debt_service, serviced);
        log::debug!("{}: exit year {}, {} serviced years", self.name(), exit, serviced);

        Ok(LoanCashFlow { net_cash_flow, dscr })
    }

    /// Repays the outstanding balance in the expiry year
    fn leveraged_cash_flow(
        &self,
        net_cash_flow: &[f64],
        projection: &LeaseProjection,
        exit_year: u32,
        include_sale: bool,
    ) -> ModelResult<Vec<f64>> {
        let mut leveraged = fund_acquisition(net_cash_flow, self.property.purchase_price, self.loan_proceeds())?;

        let expiry = self.expiry_year(exit_year);
        let balance = self.balance_at(expiry)?;
        let len = leveraged.len();
        let payoff_period = leveraged.get_mut(expiry as usize).ok_or_else(|| ModelError::InvalidInput {
            field: "exit_year".into(),
            reason: format!("loan expires in year {} but the series has {} periods", expiry, len),
        })?;
        *payoff_period -= balance;

        if include_sale {
            let sale = terminal_sale_price(
                &projection.net_operating_income,
                net_cash_flow.len() - 1,
                projection.terms.cap_rate,
            )?;
            if let Some(last) = leveraged.last_mut() {
                *last += sale;
            }
        }
        Ok(leveraged)
    }

    /// Already repaid by [`LoanModel::leveraged_cash_flow`]
    fn unrepaid_balance(&self, _sale_year: u32) -> ModelResult<f64> {
        Ok(0.0)
    }
}
