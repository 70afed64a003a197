//! Scenario runner for grids of exit plans
//!
//! Builds the engine once, then evaluates every combination of renter exit
//! year, sale year, cap rate and financing structure in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::assumptions::Assumptions;
use crate::error::ModelResult;
use crate::financing::Financing;
use crate::projection::{EngineConfig, Outcome, OutcomeEngine, OutcomeRequest};
use crate::tenant::LeaseTerms;

/// Axes of a grid run; the grid is their cartesian product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    /// `None` keeps the tenant's full lease term
    pub renter_exit_years: Vec<Option<u32>>,
    pub sale_years: Vec<u32>,
    pub cap_rates: Vec<f64>,
    pub financings: Vec<Financing>,
}

impl GridSpec {
    fn cells(&self) -> Vec<(Financing, OutcomeRequest)> {
        let mut cells = Vec::new();
        for &financing in &self.financings {
            for &renter_exit_year in &self.renter_exit_years {
                for &sale_year in &self.sale_years {
                    for &cap_rate in &self.cap_rates {
                        cells.push((
                            financing,
                            OutcomeRequest {
                                renter_exit_year,
                                sale_year,
                                cap_rate,
                            },
                        ));
                    }
                }
            }
        }
        cells
    }

    pub fn len(&self) -> usize {
        self.financings.len() * self.renter_exit_years.len() * self.sale_years.len() * self.cap_rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One grid cell, flattened for CSV output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub tenant: String,
    pub financing: Financing,
    pub renter_exit_year: u32,
    pub sale_year: u32,
    pub cap_rate: f64,
    pub irr: Option<f64>,
    pub irr_no_sunk_cost: Option<f64>,
    pub equity_multiple: Option<f64>,
    pub equity_multiple_no_sunk_cost: Option<f64>,
    pub vacancy_path: bool,

    /// Set when the cell is not a valid request, e.g. a Lender B exit before its minimum
    pub error: Option<String>,
}

impl GridRow {
    fn from_outcome(tenant: &str, outcome: &Outcome) -> Self {
        Self {
            tenant: tenant.to_string(),
            financing: outcome.financing,
            renter_exit_year: outcome.renter_exit_year,
            sale_year: outcome.sale_year,
            cap_rate: outcome.cap_rate,
            irr: outcome.metrics.irr,
            irr_no_sunk_cost: outcome.metrics.irr_no_sunk_cost,
            equity_multiple: outcome.metrics.equity_multiple,
            equity_multiple_no_sunk_cost: outcome.metrics.equity_multiple_no_sunk_cost,
            vacancy_path: outcome.is_vacancy_path(),
            error: None,
        }
    }

    fn failed(tenant: &str, lease: &LeaseTerms, financing: Financing, request: &OutcomeRequest, error: String) -> Self {
        Self {
            tenant: tenant.to_string(),
            financing,
            renter_exit_year: request.renter_exit_year.unwrap_or(lease.term_years),
            sale_year: request.sale_year,
            cap_rate: request.cap_rate,
            irr: None,
            irr_no_sunk_cost: None,
            equity_multiple: None,
            equity_multiple_no_sunk_cost: None,
            vacancy_path: false,
            error: Some(error),
        }
    }
}

/// Pre-built engine for batch evaluation
pub struct ScenarioRunner {
    engine: OutcomeEngine,
}

impl ScenarioRunner {
    /// Runner over the reference deal
    pub fn new() -> ModelResult<Self> {
        Self::with_assumptions(Assumptions::default_deal(), EngineConfig::default())
    }

    pub fn with_assumptions(assumptions: Assumptions, config: EngineConfig) -> ModelResult<Self> {
        Ok(Self {
            engine: OutcomeEngine::new(assumptions, config)?,
        })
    }

    pub fn engine(&self) -> &OutcomeEngine {
        &self.engine
    }

    /// Evaluate a single outcome
    pub fn run(&self, lease: &LeaseTerms, financing: Financing, request: &OutcomeRequest) -> ModelResult<Outcome> {
        self.engine.evaluate(lease, financing, request)
    }

    /// Evaluate every grid cell in parallel.
    ///
    /// Rows come back in grid order. Invalid cells produce a row with `error`
    /// set instead of failing the whole grid.
    pub fn run_grid(&self, lease: &LeaseTerms, spec: &GridSpec) -> Vec<GridRow> {
        let tenant = lease.name.as_deref().unwrap_or("vacant");
        log::info!("Running {} grid cells for {}", spec.len(), tenant);

        spec.cells()
            .par_iter()
            .map(|(financing, request)| match self.engine.evaluate(lease, *financing, request) {
                Ok(outcome) => GridRow::from_outcome(tenant, &outcome),
                Err(e) => {
                    log::debug!("Grid cell {} {:?} skipped: {}", financing, request, e);
                    GridRow::failed(tenant, lease, *financing, request, e.to_string())
                }
            })
            .collect()
    }
}

/// Write grid rows as CSV with a header line
pub fn write_grid_csv<W: Write>(rows: &[GridRow], writer: W) -> ModelResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantProfile;

    fn spec() -> GridSpec {
        GridSpec {
            renter_exit_years: vec![Some(6), None],
            sale_years: vec![3, 8, 12],
            cap_rates: vec![0.055, 0.08],
            financings: vec![Financing::Unleveraged, Financing::LenderB],
        }
    }

    #[test]
    fn test_grid_covers_every_cell_in_order() {
        let runner = ScenarioRunner::new().unwrap();
        let lease = TenantProfile::topshop().lease_terms();
        let spec = spec();
        let rows = runner.run_grid(&lease, &spec);

        assert_eq!(rows.len(), spec.len());
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0].financing, Financing::Unleveraged);
        assert_eq!(rows[0].renter_exit_year, 6);
        assert_eq!(rows[0].sale_year, 3);
        assert_eq!(rows[1].cap_rate, 0.08);
        assert_eq!(rows[6].renter_exit_year, 10);
        assert_eq!(rows[12].financing, Financing::LenderB);
    }

    #[test]
    fn test_invalid_cells_are_reported_not_fatal() {
        let runner = ScenarioRunner::new().unwrap();
        let lease = TenantProfile::topshop().lease_terms();
        let rows = runner.run_grid(&lease, &spec());

        let lender_b_year_three: Vec<_> = rows
            .iter()
            .filter(|r| r.financing == Financing::LenderB && r.sale_year == 3)
            .collect();
        assert_eq!(lender_b_year_three.len(), 4);
        assert!(lender_b_year_three.iter().all(|r| r.error.is_some() && r.irr.is_none()));

        let vacancy_rows = rows.iter().filter(|r| r.vacancy_path).count();
        // Exit at 6, sale at 8 or 12, two cap rates, two financings; exit at 10, sale at 12
        assert_eq!(vacancy_rows, 2 * 2 * 2 + 2 * 2);
    }

    #[test]
    fn test_grid_csv_has_header_and_rows() {
        let runner = ScenarioRunner::new().unwrap();
        let lease = TenantProfile::decathlon().lease_terms();
        let spec = GridSpec {
            renter_exit_years: vec![None],
            sale_years: vec![8],
            cap_rates: vec![0.055],
            financings: vec![Financing::Unleveraged],
        };
        let rows = runner.run_grid(&lease, &spec);

        let mut buffer = Vec::new();
        write_grid_csv(&rows, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("tenant,financing,renter_exit_year,sale_year,cap_rate,irr"));
        assert!(lines.next().unwrap().starts_with("Decathlon,unleveraged,10,8,0.055,"));
        assert!(lines.next().is_none());
    }
}
