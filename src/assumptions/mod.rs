//! Deal assumptions: property constants, date convention, lender terms and vacancy model

mod lending;
mod vacancy;

pub use lending::{LenderATerms, LenderBTerms};
pub use vacancy::{ReplacementTenantAssumptions, VacancyAssumptions, VacancyBucket, VacancyDistribution};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::projection::calendar_date;

/// Default path to a deal assumptions override file
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions.json";

/// Physical and acquisition constants for the property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyAssumptions {
    /// Total leasable area (sqm)
    pub total_area_sqm: f64,

    /// Annual growth of operating expense
    pub operating_expense_growth: f64,

    /// Leasing commission as a share of first-year base rent
    pub leasing_commission_rate: f64,

    /// Capital reserve per sqm per year
    pub capital_reserve_per_sqm: f64,

    /// First-year operating expense for the whole building
    pub initial_operating_expense: f64,

    /// Deposit paid before closing
    pub deposit: f64,

    /// Purchase price paid at closing
    pub purchase_price: f64,
}

impl Default for PropertyAssumptions {
    fn default() -> Self {
        Self {
            total_area_sqm: 2400.0,
            operating_expense_growth: 0.03,
            leasing_commission_rate: 0.05,
            capital_reserve_per_sqm: 2.26,
            // 12.8 per sqft converted to sqm
            initial_operating_expense: 12.8 * 10.7639 * 2400.0,
            deposit: 5_000_000.0,
            purchase_price: 15_000_000.0,
        }
    }
}

impl PropertyAssumptions {
    /// Deposit plus purchase price, the base lenders size their loans against
    pub fn total_cost(&self) -> f64 {
        self.deposit + self.purchase_price
    }
}

const REFERENCE_DEPOSIT_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2013, 4, 1) {
    Some(date) => date,
    None => panic!("invalid reference deposit date"),
};

const REFERENCE_CLOSING_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2014, 7, 1) {
    Some(date) => date,
    None => panic!("invalid reference closing date"),
};

/// Calendar convention used to stamp annual cash flows for XIRR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateConvention {
    /// Calendar year of period 0 (acquisition)
    pub base_year: i32,

    /// Month every annual cash flow is pegged to
    pub mid_year_month: u32,

    /// Day of month every annual cash flow is pegged to
    pub mid_year_day: u32,

    /// Date the deposit was paid (sunk-cost IRR only)
    pub deposit_date: NaiveDate,

    /// Date the acquisition closed (sunk-cost IRR only)
    pub closing_date: NaiveDate,

    /// Day-count denominator for discount exponents
    pub days_per_year: f64,
}

impl Default for DateConvention {
    fn default() -> Self {
        Self {
            base_year: 2015,
            mid_year_month: 7,
            mid_year_day: 1,
            deposit_date: REFERENCE_DEPOSIT_DATE,
            closing_date: REFERENCE_CLOSING_DATE,
            days_per_year: 365.0,
        }
    }
}

impl DateConvention {
    /// Reject conventions that cannot stamp a calendar date
    pub fn validate(&self) -> ModelResult<()> {
        if !(1..=12).contains(&self.mid_year_month) {
            return Err(ModelError::InvalidInput {
                field: "dates.mid_year_month".into(),
                reason: format!("must be 1-12, got {}", self.mid_year_month),
            });
        }
        if !self.days_per_year.is_finite() || self.days_per_year <= 0.0 {
            return Err(ModelError::InvalidInput {
                field: "dates.days_per_year".into(),
                reason: format!("must be positive, got {}", self.days_per_year),
            });
        }
        self.mid_year(0).map(|_| ())
    }

    /// Mid-year date `year_offset` years after the base year
    pub fn mid_year(&self, year_offset: i32) -> ModelResult<NaiveDate> {
        calendar_date(self.base_year + year_offset, self.mid_year_month, self.mid_year_day)
    }

    /// One mid-year date per period, starting at the base year
    pub fn annual_dates(&self, periods: usize) -> ModelResult<Vec<NaiveDate>> {
        (0..periods).map(|i| self.mid_year(i as i32)).collect()
    }
}

/// Container for all deal assumptions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assumptions {
    #[serde(default)]
    pub property: PropertyAssumptions,
    #[serde(default)]
    pub dates: DateConvention,
    #[serde(default)]
    pub lender_a: LenderATerms,
    #[serde(default)]
    pub lender_b: LenderBTerms,
    #[serde(default)]
    pub vacancy: VacancyAssumptions,
    #[serde(default)]
    pub replacement: ReplacementTenantAssumptions,
}

impl Assumptions {
    /// Assumptions for the reference deal
    pub fn default_deal() -> Self {
        Self::default()
    }

    /// Load assumptions from a JSON file; omitted sections keep their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let assumptions: Self = serde_json::from_reader(reader)?;
        assumptions.dates.validate()?;
        Ok(assumptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_deal_constants() {
        let a = Assumptions::default_deal();
        assert_eq!(a.property.total_area_sqm, 2400.0);
        assert_eq!(a.property.total_cost(), 20_000_000.0);
        assert_relative_eq!(a.property.initial_operating_expense, 330_667.008, epsilon = 1e-6);
        assert_eq!(a.dates.deposit_date, NaiveDate::from_ymd_opt(2013, 4, 1).unwrap());
        assert_eq!(a.dates.closing_date, NaiveDate::from_ymd_opt(2014, 7, 1).unwrap());
    }

    #[test]
    fn test_annual_dates_are_mid_year() {
        let dates = DateConvention::default().annual_dates(3).unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2015, 7, 1).unwrap());
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2017, 7, 1).unwrap());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "property": { "total_area_sqm": 1000.0, "operating_expense_growth": 0.02,
            "leasing_commission_rate": 0.05, "capital_reserve_per_sqm": 2.0,
            "initial_operating_expense": 100000.0, "deposit": 1.0, "purchase_price": 2.0 } }"#;
        let a: Assumptions = serde_json::from_str(json).unwrap();
        assert_eq!(a.property.total_area_sqm, 1000.0);
        assert_eq!(a.lender_a.ltv, 0.7);
        assert_eq!(a.vacancy.poisson_mean, 4.0);
    }

    #[test]
    fn test_zero_month_convention_is_rejected() {
        let dates = DateConvention {
            mid_year_month: 0,
            ..Default::default()
        };
        let err = dates.validate().unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput { ref field, .. } if field == "dates.mid_year_month"));

        let bad_day = DateConvention {
            mid_year_day: 31,
            mid_year_month: 6,
            ..Default::default()
        };
        assert!(matches!(bad_day.validate(), Err(ModelError::InvalidDate { .. })));
        assert!(DateConvention::default().validate().is_ok());
    }

    #[test]
    fn test_json_with_invalid_month_fails_to_load() {
        let path = std::env::temp_dir().join(format!("cre_returns_bad_month_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "dates": { "base_year": 2015, "mid_year_month": 0, "mid_year_day": 1,
            "deposit_date": "2013-04-01", "closing_date": "2014-07-01", "days_per_year": 365.0 } }"#)
            .unwrap();
        let result = Assumptions::from_json_path(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ModelError::InvalidInput { .. })));
    }

    #[test]
    fn test_shipped_override_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_ASSUMPTIONS_PATH);
        let a = Assumptions::from_json_path(path).unwrap();
        let reference = Assumptions::default_deal();
        assert_eq!(a.dates.closing_date, reference.dates.closing_date);
        assert_eq!(a.property.purchase_price, reference.property.purchase_price);
        assert_eq!(a.lender_a.ltv, reference.lender_a.ltv);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Assumptions::from_json_path("does/not/exist.json").unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
