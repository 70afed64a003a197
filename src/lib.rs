//! CRE Returns - cash-flow projection and investor returns for a single-tenant commercial property
//!
//! This library provides:
//! - Year-by-year lease projections (rent, expenses, NOI, cash flow before debt service)
//! - Unleveraged and structured-loan investor series with DSCR
//! - Re-tenanting simulation over a truncated Poisson vacancy distribution
//! - XIRR and equity multiple, with and without the sunk deposit
//! - Grid runs over exit plans

pub mod assumptions;
pub mod error;
pub mod financing;
pub mod projection;
pub mod scenario;
pub mod tenant;

// Re-export commonly used types
pub use assumptions::{Assumptions, VacancyDistribution};
pub use error::{ModelError, ModelResult};
pub use financing::Financing;
pub use projection::{EngineConfig, IrrSolver, LeaseProjection, Outcome, OutcomeEngine, OutcomeRequest, ReturnMetrics};
pub use scenario::{GridRow, GridSpec, ScenarioRunner};
pub use tenant::{LeaseTerms, TenantProfile};
