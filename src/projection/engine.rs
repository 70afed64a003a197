//! Outcome engine: investor returns for a tenant, financing structure and exit plan

use serde::{Deserialize, Serialize};

use super::cashflows::DatedCashFlows;
use super::irr::IrrSolver;
use super::lease::LeaseProjection;
use super::returns::ReturnMetrics;
use super::vacancy::{DepartingTenant, VacancyScenario, VacancySimulator};
use crate::assumptions::{Assumptions, VacancyDistribution};
use crate::error::ModelResult;
use crate::financing::{unleveraged_cash_flow, Financing, LenderA, LenderB, LoanModel};
use crate::tenant::LeaseTerms;

/// Configuration for an engine run
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Root finder for every IRR
    pub solver: IrrSolver,

    /// Keep cash-flow series on the outcome, including each vacancy scenario's
    pub detailed_output: bool,
}

/// When the tenant leaves and when the building is sold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRequest {
    /// Years after acquisition the tenant leaves; `None` runs the full lease term
    pub renter_exit_year: Option<u32>,

    /// Years after acquisition the building is sold
    pub sale_year: u32,

    /// Exit cap rate for the terminal sale
    pub cap_rate: f64,
}

impl OutcomeRequest {
    pub fn new(sale_year: u32, cap_rate: f64) -> Self {
        Self {
            renter_exit_year: None,
            sale_year,
            cap_rate,
        }
    }

    pub fn with_renter_exit(mut self, year: u32) -> Self {
        self.renter_exit_year = Some(year);
        self
    }
}

/// Result of evaluating one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub financing: Financing,
    pub renter_exit_year: u32,
    pub sale_year: u32,
    pub cap_rate: f64,
    pub metrics: ReturnMetrics,

    /// Debt-service coverage per serviced year; empty when unleveraged
    pub dscr: Vec<f64>,

    /// Investor series of the direct path, or of the departing tenant when
    /// the space is re-let (detailed output only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_flows: Option<DatedCashFlows>,

    /// One entry per vacancy bucket; empty when the sale precedes the departure
    pub vacancy: Vec<VacancyScenario>,
}

impl Outcome {
    pub fn is_vacancy_path(&self) -> bool {
        !self.vacancy.is_empty()
    }
}

pub struct OutcomeEngine {
    assumptions: Assumptions,
    config: EngineConfig,
    distribution: VacancyDistribution,
}

impl OutcomeEngine {
    /// Build the engine and its vacancy distribution
    pub fn new(assumptions: Assumptions, config: EngineConfig) -> ModelResult<Self> {
        let distribution = VacancyDistribution::truncated_poisson(&assumptions.vacancy)?;
        Ok(Self::with_distribution(assumptions, config, distribution))
    }

    /// Build the engine with an explicit vacancy distribution
    pub fn with_distribution(assumptions: Assumptions, config: EngineConfig, distribution: VacancyDistribution) -> Self {
        Self {
            assumptions,
            config,
            distribution,
        }
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn distribution(&self) -> &VacancyDistribution {
        &self.distribution
    }

    fn loan_model(&self, financing: Financing) -> Option<Box<dyn LoanModel + '_>> {
        let property = &self.assumptions.property;
        match financing {
            Financing::Unleveraged => None,
            Financing::LenderA => Some(Box::new(LenderA::new(&self.assumptions.lender_a, property))),
            Financing::LenderB => Some(Box::new(LenderB::new(&self.assumptions.lender_b, property))),
        }
    }

    /// Evaluate one outcome.
    ///
    /// The lease is cut to the renter exit year and priced at the requested
    /// cap rate. A sale no later than the departure is priced directly;
    /// otherwise the space is re-let and returns are the expectation over
    /// vacancy durations.
    pub fn evaluate(&self, lease: &LeaseTerms, financing: Financing, request: &OutcomeRequest) -> ModelResult<Outcome> {
        let exit_year = request.renter_exit_year.unwrap_or(lease.term_years);
        let terms = lease.with_term(exit_year).with_cap_rate(request.cap_rate);
        let projection = LeaseProjection::project(&terms, &self.assumptions.property);
        let loan = self.loan_model(financing);

        let outcome = if request.sale_year <= exit_year {
            self.direct(&projection, financing, loan.as_deref(), exit_year, request)?
        } else {
            self.with_vacancy(&projection, financing, loan.as_deref(), exit_year, request)?
        };

        log::info!(
            "{} {}: exit {} sale {} cap {:.4} -> IRR {:?}, EM {:?}",
            terms.name.as_deref().unwrap_or("vacant"),
            financing,
            exit_year,
            request.sale_year,
            request.cap_rate,
            outcome.metrics.irr,
            outcome.metrics.equity_multiple
        );
        Ok(outcome)
    }

    /// Sale while the tenant is still in place
    fn direct(
        &self,
        projection: &LeaseProjection,
        financing: Financing,
        loan: Option<&dyn LoanModel>,
        exit_year: u32,
        request: &OutcomeRequest,
    ) -> ModelResult<Outcome> {
        let sale_year = request.sale_year;
        let (amounts, dscr) = match loan {
            None => (
                unleveraged_cash_flow(projection, Some(sale_year), self.assumptions.property.purchase_price)?,
                Vec::new(),
            ),
            Some(loan) => {
                let loan_cash_flow = loan.net_cash_flow(projection, Some(sale_year))?;
                let leveraged = loan.leveraged_cash_flow(&loan_cash_flow.net_cash_flow, projection, sale_year, true)?;
                (leveraged, loan_cash_flow.dscr)
            }
        };

        let cash_flows = DatedCashFlows::annual(&amounts, &self.assumptions.dates)?;
        let metrics = ReturnMetrics::compute(&cash_flows, &self.assumptions, self.config.solver);

        Ok(Outcome {
            financing,
            renter_exit_year: exit_year,
            sale_year,
            cap_rate: request.cap_rate,
            metrics,
            dscr,
            cash_flows: self.config.detailed_output.then_some(cash_flows),
            vacancy: Vec::new(),
        })
    }

    /// Sale after the tenant leaves: re-let the space under every vacancy duration
    fn with_vacancy(
        &self,
        projection: &LeaseProjection,
        financing: Financing,
        loan: Option<&dyn LoanModel>,
        exit_year: u32,
        request: &OutcomeRequest,
    ) -> ModelResult<Outcome> {
        let sale_year = request.sale_year;
        let (amounts, dscr) = match loan {
            None => (
                unleveraged_cash_flow(projection, None, self.assumptions.property.purchase_price)?,
                Vec::new(),
            ),
            Some(loan) => {
                // Debt runs to the sale; no terminal sale on the departing lease
                let loan_cash_flow = loan.net_cash_flow(projection, Some(sale_year))?;
                let leveraged = loan.leveraged_cash_flow(&loan_cash_flow.net_cash_flow, projection, sale_year, false)?;
                (leveraged, loan_cash_flow.dscr)
            }
        };

        let departing = DepartingTenant {
            projection,
            cash_flows: DatedCashFlows::annual(&amounts, &self.assumptions.dates)?,
            exit_year,
        };

        let simulator = VacancySimulator::new(&self.assumptions, &self.distribution, self.config.solver)
            .keep_cash_flows(self.config.detailed_output);
        let vacancy = simulator.simulate(&departing, sale_year, loan)?;

        if !vacancy.expected.is_complete() {
            log::warn!(
                "{}: expected returns incomplete for exit {} sale {}",
                financing,
                exit_year,
                sale_year
            );
        }

        Ok(Outcome {
            financing,
            renter_exit_year: exit_year,
            sale_year,
            cap_rate: request.cap_rate,
            metrics: vacancy.expected,
            dscr,
            cash_flows: self.config.detailed_output.then_some(departing.cash_flows),
            vacancy: vacancy.scenarios,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::VacancyBucket;
    use crate::error::ModelError;
    use crate::tenant::TenantProfile;
    use approx::assert_relative_eq;

    fn engine(detailed_output: bool) -> OutcomeEngine {
        let config = EngineConfig {
            detailed_output,
            ..Default::default()
        };
        OutcomeEngine::new(Assumptions::default_deal(), config).unwrap()
    }

    #[test]
    fn test_decathlon_unleveraged_sale_in_year_eight() {
        let engine = engine(true);
        let lease = TenantProfile::decathlon().lease_terms();
        let request = OutcomeRequest::new(8, 0.055).with_renter_exit(10);
        let outcome = engine.evaluate(&lease, Financing::Unleveraged, &request).unwrap();

        let projection = LeaseProjection::project(&lease, &engine.assumptions().property);
        let amounts = outcome.cash_flows.as_ref().unwrap().amounts();
        assert!(!outcome.is_vacancy_path());
        assert_eq!(amounts.len(), 9);
        assert_eq!(amounts[0], projection.cash_flow_before_debt_service[0] - 15_000_000.0);
        assert_relative_eq!(amounts[8], projection.net_operating_income[8] / 0.055, max_relative = 1e-12);
        assert!(outcome.metrics.is_complete());
        assert!(outcome.dscr.is_empty());
    }

    #[test]
    fn test_sunk_cost_lowers_returns() {
        let engine = engine(false);
        let lease = TenantProfile::decathlon().lease_terms();
        let outcome = engine
            .evaluate(&lease, Financing::Unleveraged, &OutcomeRequest::new(8, 0.055))
            .unwrap();
        let m = outcome.metrics;
        assert!(m.irr.unwrap() < m.irr_no_sunk_cost.unwrap());
        assert!(m.equity_multiple.unwrap() < m.equity_multiple_no_sunk_cost.unwrap());
        assert!(outcome.cash_flows.is_none());
    }

    #[test]
    fn test_leveraged_direct_paths() {
        let engine = engine(true);
        let lease = TenantProfile::zara().lease_terms();
        let request = OutcomeRequest::new(8, 0.055);

        let a = engine.evaluate(&lease, Financing::LenderA, &request).unwrap();
        assert_eq!(a.dscr.len(), 4);
        assert_eq!(a.cash_flows.as_ref().unwrap().len(), 9);
        assert!(a.metrics.irr.is_some());

        let b = engine.evaluate(&lease, Financing::LenderB, &request).unwrap();
        assert_eq!(b.dscr.len(), 5);
        assert_eq!(b.cash_flows.as_ref().unwrap().len(), 9);
        assert!(b.metrics.irr.is_some());
    }

    #[test]
    fn test_lender_b_early_sale_is_an_error() {
        let engine = engine(false);
        let lease = TenantProfile::decathlon().lease_terms();
        let err = engine
            .evaluate(&lease, Financing::LenderB, &OutcomeRequest::new(3, 0.055))
            .unwrap_err();
        assert!(matches!(err, ModelError::ExitYearTooEarly { .. }));
    }

    #[test]
    fn test_vacancy_path_expectation() {
        let engine = engine(false);
        let lease = TenantProfile::decathlon().lease_terms();
        let request = OutcomeRequest::new(12, 0.055).with_renter_exit(10);
        let outcome = engine.evaluate(&lease, Financing::Unleveraged, &request).unwrap();

        assert!(outcome.is_vacancy_path());
        assert_eq!(outcome.vacancy.len(), engine.distribution().buckets().len());

        let weighted = |metric: fn(&ReturnMetrics) -> Option<f64>| -> f64 {
            outcome.vacancy.iter().map(|s| s.probability * metric(&s.metrics).unwrap()).sum()
        };
        let m = &outcome.metrics;
        assert_relative_eq!(m.irr.unwrap(), weighted(|r| r.irr), max_relative = 1e-12);
        assert_relative_eq!(m.irr_no_sunk_cost.unwrap(), weighted(|r| r.irr_no_sunk_cost), max_relative = 1e-12);
        assert_relative_eq!(m.equity_multiple.unwrap(), weighted(|r| r.equity_multiple), max_relative = 1e-12);
        assert_relative_eq!(
            m.equity_multiple_no_sunk_cost.unwrap(),
            weighted(|r| r.equity_multiple_no_sunk_cost),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_leveraged_vacancy_paths() {
        let engine = engine(false);
        let lease = TenantProfile::topshop().lease_terms();
        let request = OutcomeRequest::new(10, 0.08).with_renter_exit(6);

        for financing in [Financing::LenderA, Financing::LenderB] {
            let outcome = engine.evaluate(&lease, financing, &request).unwrap();
            assert_eq!(outcome.vacancy.len(), 7);
            assert!(outcome.metrics.equity_multiple.is_some());
            assert!(!outcome.dscr.is_empty());
        }
    }

    #[test]
    fn test_explicit_distribution() {
        let distribution = VacancyDistribution::from_buckets(vec![
            VacancyBucket { quarters: 0, probability: 0.5 },
            VacancyBucket { quarters: 2, probability: 0.5 },
        ]);
        let engine =
            OutcomeEngine::with_distribution(Assumptions::default_deal(), EngineConfig::default(), distribution);
        let lease = TenantProfile::topshop().lease_terms();
        let request = OutcomeRequest::new(10, 0.08).with_renter_exit(6);
        let outcome = engine.evaluate(&lease, Financing::Unleveraged, &request).unwrap();

        assert_eq!(outcome.vacancy.len(), 2);
        let em = 0.5 * outcome.vacancy[0].metrics.equity_multiple.unwrap()
            + 0.5 * outcome.vacancy[1].metrics.equity_multiple.unwrap();
        assert_relative_eq!(outcome.metrics.equity_multiple.unwrap(), em, max_relative = 1e-12);
    }

    #[test]
    fn test_default_renter_exit_is_lease_term() {
        let engine = engine(false);
        let lease = TenantProfile::zara().lease_terms();
        // Zara's 12-year lease outlasts a year-10 sale
        let outcome = engine
            .evaluate(&lease, Financing::Unleveraged, &OutcomeRequest::new(10, 0.055))
            .unwrap();
        assert_eq!(outcome.renter_exit_year, 12);
        assert!(!outcome.is_vacancy_path());
    }
}
