//! Lender A: level amortizing payments for up to `max_term_years`, with
//! entry, extension and exit fees on the loan proceeds

use super::{coverage_ratios, fund_acquisition, pmt, pv, terminal_sale_price, LoanCashFlow, LoanModel};
use crate::assumptions::{LenderATerms, PropertyAssumptions};
use crate::error::ModelResult;
use crate::projection::LeaseProjection;

#[derive(Debug, Clone)]
pub struct LenderA<'a> {
    terms: &'a LenderATerms,
    property: &'a PropertyAssumptions,
}

impl<'a> LenderA<'a> {
    pub fn new(terms: &'a LenderATerms, property: &'a PropertyAssumptions) -> Self {
        Self { terms, property }
    }

    /// Annual debt service (negative)
    pub fn annual_payment(&self) -> ModelResult<f64> {
        let monthly = pmt(
            self.terms.interest_rate / 12.0,
            self.terms.amortization_months,
            self.loan_proceeds(),
        )?;
        Ok(monthly * 12.0)
    }

    /// Last year debt service is paid before exiting in `exit_year`
    fn serviced_years(&self, exit_year: u32) -> u32 {
        exit_year.min(self.terms.max_term_years)
    }

    /// Fees charged in each year `0..=exit_year` (positive amounts)
    pub fn fee_schedule(&self, exit_year: u32) -> Vec<f64> {
        let proceeds = self.loan_proceeds();
        let mut fees = vec![0.0; exit_year as usize + 1];
        fees[0] = self.terms.entry_fee * proceeds;

        let expiry = self.serviced_years(exit_year);
        for year in self.terms.initial_term_years..expiry {
            fees[year as usize] = self.terms.per_extension_fee * proceeds;
        }
        if expiry > 0 {
            fees[expiry as usize] = self.terms.exit_fee * proceeds;
        }
        fees
    }
}

impl LoanModel for LenderA<'_> {
    fn name(&self) -> &'static str {
        "Lender A"
    }

    fn loan_proceeds(&self) -> f64 {
        self.property.total_cost() * self.terms.ltv
    }

    /// Defaults to exiting in the final lease year.
    ///
    /// The lease cash flow of the exit year itself is dropped; only that
    /// year's fees remain.
    fn net_cash_flow(&self, projection: &LeaseProjection, exit_year: Option<u32>) -> ModelResult<LoanCashFlow> {
        let exit = exit_year.unwrap_or_else(|| (projection.term_years() as u32).saturating_sub(1));
        let cfbds = &projection.cash_flow_before_debt_service;
        let payment = self.annual_payment()?;
        let serviced = self.serviced_years(exit) as usize;

        let debt_service: Vec<f64> = (0..=exit as usize)
            .map(|i| if i < serviced { payment } else { 0.0 })
            .collect();
        let fees = self.fee_schedule(exit);

        let mut net_cash_flow: Vec<f64> = (0..=exit as usize)
            .map(|i| {
                let lease = cfbds.get(i).copied().unwrap_or(0.0);
                let debt = if i < exit as usize { debt_service[i] } else { 0.0 };
                lease + debt - fees[i]
            })
            .collect();
        if let (Some(last), Some(exit_year_lease)) = (net_cash_flow.last_mut(), cfbds.get(exit as usize)) {
            *last -= exit_year_lease;
        }

        let dscr = coverage_ratios(&projection.net_operating_income, &debt_service, serviced);
        log::debug!("{}: exit year {}, {} serviced years", self.name(), exit, serviced);

        Ok(LoanCashFlow { net_cash_flow, dscr })
    }

    /// The loan balance is not repaid here; callers extending the series
    /// past the departing tenant subtract [`LoanModel::unrepaid_balance`].
    fn leveraged_cash_flow(
        &self,
        net_cash_flow: &[f64],
        projection: &LeaseProjection,
        _exit_year: u32,
        include_sale: bool,
    ) -> ModelResult<Vec<f64>> {
        let mut leveraged = fund_acquisition(net_cash_flow, self.property.purchase_price, self.loan_proceeds())?;
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

    fn unrepaid_balance(&self, sale_year: u32) -> ModelResult<f64> {
        let remaining = self.terms.amortization_months.saturating_sub(12 * sale_year);
        Ok(pv(self.terms.interest_rate / 12.0, remaining, self.annual_payment()? / 12.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantProfile;
    use approx::assert_relative_eq;

    fn setup() -> (LenderATerms, PropertyAssumptions) {
        (LenderATerms::default(), PropertyAssumptions::default())
    }

    fn decathlon(property: &PropertyAssumptions) -> LeaseProjection {
        LeaseProjection::project(&TenantProfile::decathlon().lease_terms(), property)
    }

    #[test]
    fn test_proceeds_and_payment() {
        let (terms, property) = setup();
        let lender = LenderA::new(&terms, &property);
        assert_relative_eq!(lender.loan_proceeds(), 14_000_000.0, max_relative = 1e-12);
        assert_relative_eq!(lender.annual_payment().unwrap(), -92_393.803 * 12.0, epsilon = 0.05);
    }

    #[test]
    fn test_fee_schedule() {
        let (terms, property) = setup();
        let lender = LenderA::new(&terms, &property);
        let p = lender.loan_proceeds();

        assert_eq!(lender.fee_schedule(0), vec![0.01 * p]);
        assert_eq!(lender.fee_schedule(1), vec![0.01 * p, 0.01 * p]);
        assert_eq!(lender.fee_schedule(2), vec![0.01 * p, 0.0, 0.01 * p]);
        assert_eq!(lender.fee_schedule(3), vec![0.01 * p, 0.0, 0.005 * p, 0.01 * p]);
        assert_eq!(
            lender.fee_schedule(6),
            vec![0.01 * p, 0.0, 0.005 * p, 0.005 * p, 0.01 * p, 0.0, 0.0]
        );
    }

    #[test]
    fn test_net_cash_flow_structure() {
        let (terms, property) = setup();
        let lender = LenderA::new(&terms, &property);
        let projection = decathlon(&property);
        let payment = lender.annual_payment().unwrap();
        let fees = lender.fee_schedule(6);

        let loan = lender.net_cash_flow(&projection, Some(6)).unwrap();
        let cfbds = &projection.cash_flow_before_debt_service;
        assert_eq!(loan.net_cash_flow.len(), 7);
        assert_relative_eq!(loan.net_cash_flow[0], cfbds[0] + payment - fees[0], max_relative = 1e-12);
        assert_relative_eq!(loan.net_cash_flow[3], cfbds[3] + payment - fees[3], max_relative = 1e-12);
        // Debt service stops after year 4
        assert_eq!(loan.net_cash_flow[5], cfbds[5]);
        // Exit year keeps only its fees
        assert_relative_eq!(loan.net_cash_flow[6], -fees[6], epsilon = 1e-6);

        assert_eq!(loan.dscr.len(), 4);
        assert_relative_eq!(loan.dscr[1], -projection.net_operating_income[1] / payment, max_relative = 1e-12);
    }

    #[test]
    fn test_default_exit_is_last_lease_year() {
        let (terms, property) = setup();
        let lender = LenderA::new(&terms, &property);
        let projection = decathlon(&property);
        let loan = lender.net_cash_flow(&projection, None).unwrap();
        assert_eq!(loan.net_cash_flow.len(), 10);
    }

    #[test]
    fn test_exit_beyond_lease_pads_with_zero_lease_cash() {
        let (terms, property) = setup();
        let lender = LenderA::new(&terms, &property);
        let projection = LeaseProjection::project(&TenantProfile::topshop().lease_terms().with_term(3), &property);
        let loan = lender.net_cash_flow(&projection, Some(6)).unwrap();
        assert_eq!(loan.net_cash_flow.len(), 7);
        // Year 3 has no lease cash but still pays debt service and an extension fee
        let expected = lender.annual_payment().unwrap() - lender.fee_schedule(6)[3];
        assert_relative_eq!(loan.net_cash_flow[3], expected, max_relative = 1e-12);
        assert_eq!(loan.net_cash_flow[6], 0.0);
    }

    #[test]
    fn test_leveraged_cash_flow_adds_sale_and_funding() {
        let (terms, property) = setup();
        let lender = LenderA::new(&terms, &property);
        let projection = decathlon(&property);
        let net = lender.net_cash_flow(&projection, Some(6)).unwrap().net_cash_flow;

        let lev = lender.leveraged_cash_flow(&net, &projection, 6, true).unwrap();
        assert_eq!(lev.len(), net.len());
        assert_relative_eq!(lev[0], net[0] - 15_000_000.0 + 14_000_000.0, max_relative = 1e-12);
        assert_relative_eq!(lev[6], net[6] + projection.net_operating_income[6] / 0.055, max_relative = 1e-12);

        let held = lender.leveraged_cash_flow(&net, &projection, 6, false).unwrap();
        assert_eq!(held[6], net[6]);
    }

    #[test]
    fn test_unrepaid_balance_shrinks_with_time() {
        let (terms, property) = setup();
        let lender = LenderA::new(&terms, &property);
        let at_start = lender.unrepaid_balance(0).unwrap();
        let at_five = lender.unrepaid_balance(5).unwrap();
        assert_relative_eq!(at_start, 14_000_000.0, max_relative = 1e-9);
        assert!(at_five > 0.0 && at_five < at_start);
        assert_eq!(lender.unrepaid_balance(25).unwrap(), 0.0);
    }
}
