//! Re-tenanting after the current tenant leaves before the building is sold
//!
//! Each vacancy bucket is an independent scenario: the space sits empty for
//! `q` quarters, a replacement tenant signs at a rent escalated to that
//! date, and the building is sold at the end of the replacement's truncated
//! term. Scenario returns are combined into a probability-weighted
//! expectation.

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::cashflows::{calendar_date, DatedCashFlows};
use super::irr::IrrSolver;
use super::lease::LeaseProjection;
use super::returns::ReturnMetrics;
use crate::assumptions::{Assumptions, VacancyBucket, VacancyDistribution};
use crate::error::{ModelError, ModelResult};
use crate::financing::{future_unleveraged_cash_flow, LoanModel};
use crate::tenant::LeaseTerms;

/// The tenant whose lease ends before the sale
#[derive(Debug, Clone)]
pub struct DepartingTenant<'a> {
    pub projection: &'a LeaseProjection,

    /// Investor series up to the departure, dated mid-year from the base year
    pub cash_flows: DatedCashFlows,

    /// Years after acquisition the tenant leaves
    pub exit_year: u32,
}

/// Returns for one vacancy duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyScenario {
    pub quarters: u32,
    pub probability: f64,
    pub replacement_start: NaiveDate,
    pub replacement_term_years: u32,
    pub metrics: ReturnMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_flows: Option<DatedCashFlows>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyOutcome {
    pub scenarios: Vec<VacancyScenario>,
    pub expected: ReturnMetrics,
}

pub struct VacancySimulator<'a> {
    assumptions: &'a Assumptions,
    distribution: &'a VacancyDistribution,
    solver: IrrSolver,
    keep_cash_flows: bool,
}

impl<'a> VacancySimulator<'a> {
    pub fn new(assumptions: &'a Assumptions, distribution: &'a VacancyDistribution, solver: IrrSolver) -> Self {
        Self {
            assumptions,
            distribution,
            solver,
            keep_cash_flows: false,
        }
    }

    /// Keep each scenario's merged cash-flow series on the outcome
    pub fn keep_cash_flows(mut self, keep: bool) -> Self {
        self.keep_cash_flows = keep;
        self
    }

    fn vacant_months(&self, quarters: u32) -> u32 {
        quarters * self.assumptions.vacancy.months_per_bucket
    }

    /// Cost of carrying the empty space, booked at the departure date.
    ///
    /// Enters the investor series with a positive sign.
    pub fn maintenance_cost(&self, departing: &DepartingTenant<'_>, quarters: u32) -> f64 {
        self.vacant_months(quarters) as f64 / 12.0
            * departing.projection.final_operating_expense()
            * departing.projection.terms.annual_increase
    }

    /// Date the replacement lease starts: the departure date pushed out by the vacancy
    pub fn replacement_start(&self, exit_year: u32, quarters: u32) -> ModelResult<NaiveDate> {
        let dates = &self.assumptions.dates;
        let month_index = dates.mid_year_month.checked_sub(1).ok_or(ModelError::InvalidDate {
            year: dates.base_year + exit_year as i32,
            month: dates.mid_year_month,
            day: dates.mid_year_day,
        })?;
        let months_from_january = month_index + self.vacant_months(quarters);
        let year = dates.base_year + exit_year as i32 + (months_from_january / 12) as i32;
        calendar_date(year, months_from_january % 12 + 1, dates.mid_year_day)
    }

    /// Years the replacement holds the space before the sale; at least one.
    ///
    /// Only whole years of vacancy shorten the term.
    pub fn replacement_term(&self, exit_year: u32, sale_year: u32, quarters: u32) -> u32 {
        let whole_vacant_years = (self.vacant_months(quarters) / 12) as i64;
        (sale_year as i64 - exit_year as i64 - whole_vacant_years).max(1) as u32
    }

    /// Replacement tenant's unleveraged series, dated annually from its start
    fn replacement_cash_flows(
        &self,
        exit_year: u32,
        sale_year: u32,
        quarters: u32,
    ) -> ModelResult<(NaiveDate, u32, DatedCashFlows)> {
        let start = self.replacement_start(exit_year, quarters)?;
        let term = self.replacement_term(exit_year, sale_year, quarters);
        let years_elapsed = exit_year as f64 + self.vacant_months(quarters) as f64 / 12.0;

        let terms = LeaseTerms::replacement(&self.assumptions.replacement, years_elapsed);
        let projection = LeaseProjection::project(&terms, &self.assumptions.property);
        let amounts = future_unleveraged_cash_flow(&projection, Some(term))?;

        let dates = (0..amounts.len())
            .map(|i| calendar_date(start.year() + i as i32, start.month(), start.day()))
            .collect::<ModelResult<Vec<_>>>()?;

        Ok((start, term, DatedCashFlows::from_parts(&dates, &amounts)?))
    }

    /// Full investor series for one vacancy duration.
    ///
    /// The departing series, the maintenance cost and the replacement series
    /// are merged by date. With no vacancy the replacement's first period
    /// lands on the departure date and is added to it.
    pub fn scenario_cash_flows(
        &self,
        departing: &DepartingTenant<'_>,
        sale_year: u32,
        quarters: u32,
        loan: Option<&dyn LoanModel>,
    ) -> ModelResult<(NaiveDate, u32, DatedCashFlows)> {
        let departure = self.assumptions.dates.mid_year(departing.exit_year as i32)?;
        let mut maintenance = DatedCashFlows::new();
        maintenance.push(departure, self.maintenance_cost(departing, quarters));

        let (start, term, replacement) = self.replacement_cash_flows(departing.exit_year, sale_year, quarters)?;
        let mut merged = departing.cash_flows.merge(&maintenance).merge(&replacement);

        if let Some(loan) = loan {
            merged.add_to_last(-loan.unrepaid_balance(sale_year)?);
        }
        Ok((start, term, merged))
    }

    fn run_bucket(
        &self,
        departing: &DepartingTenant<'_>,
        sale_year: u32,
        bucket: &VacancyBucket,
        loan: Option<&dyn LoanModel>,
    ) -> ModelResult<VacancyScenario> {
        let (start, term, cash_flows) = self.scenario_cash_flows(departing, sale_year, bucket.quarters, loan)?;
        let metrics = ReturnMetrics::compute(&cash_flows, self.assumptions, self.solver);

        log::debug!(
            "Vacancy {} quarters (p={:.4}): replacement from {} for {} years, {} periods",
            bucket.quarters,
            bucket.probability,
            start,
            term,
            cash_flows.len()
        );
        if metrics.irr.is_none() || metrics.irr_no_sunk_cost.is_none() {
            log::warn!("No IRR found for vacancy of {} quarters", bucket.quarters);
        }

        Ok(VacancyScenario {
            quarters: bucket.quarters,
            probability: bucket.probability,
            replacement_start: start,
            replacement_term_years: term,
            metrics,
            cash_flows: self.keep_cash_flows.then_some(cash_flows),
        })
    }

    /// Evaluate every bucket in parallel and take the expectation in bucket order
    pub fn simulate(
        &self,
        departing: &DepartingTenant<'_>,
        sale_year: u32,
        loan: Option<&dyn LoanModel>,
    ) -> ModelResult<VacancyOutcome> {
        let scenarios = self
            .distribution
            .buckets()
            .par_iter()
            .map(|bucket| self.run_bucket(departing, sale_year, bucket, loan))
            .collect::<ModelResult<Vec<_>>>()?;

        let weighted: Vec<(f64, ReturnMetrics)> = scenarios.iter().map(|s| (s.probability, s.metrics)).collect();
        let expected = ReturnMetrics::expectation(&weighted);

        Ok(VacancyOutcome { scenarios, expected })
    }
}
