//! Error type shared by the projection, financing and loader modules

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Caller asked a lender model for an exit year its product does not allow
    #[error("{lender}: exit year must be at least {minimum} (got {exit_year})")]
    ExitYearTooEarly {
        lender: &'static str,
        exit_year: u32,
        minimum: u32,
    },

    #[error("Invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
