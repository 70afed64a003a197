//! Lease projection, dated cash flows, return solvers and the outcome engine

mod cashflows;
mod engine;
mod irr;
mod lease;
mod returns;
mod vacancy;

pub use cashflows::{calendar_date, DatedCashFlow, DatedCashFlows};
pub use engine::{EngineConfig, Outcome, OutcomeEngine, OutcomeRequest};
pub use irr::{irr_with_sunk_cost, irr_without_sunk_cost, xirr, xirr_newton, IrrSolver};
pub use lease::LeaseProjection;
pub use returns::{
    equity_multiple, equity_multiple_no_sunk_cost, total_distributions, total_invested, ReturnMetrics,
};
pub use vacancy::{DepartingTenant, VacancyOutcome, VacancyScenario, VacancySimulator};
