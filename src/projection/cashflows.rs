//! Date-stamped cash-flow series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assumptions::DateConvention;
use crate::error::{ModelError, ModelResult};

/// Build a calendar date, rejecting impossible ones
pub fn calendar_date(year: i32, month: u32, day: u32) -> ModelResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ModelError::InvalidDate { year, month, day })
}

/// A single signed amount on a date (positive = inflow to the investor)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedCashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Ordered cash-flow series with one date per amount
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatedCashFlows {
    flows: Vec<DatedCashFlow>,
}

impl DatedCashFlows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair dates with amounts; both must have the same length
    pub fn from_parts(dates: &[NaiveDate], amounts: &[f64]) -> ModelResult<Self> {
        if dates.len() != amounts.len() {
            return Err(ModelError::InvalidInput {
                field: "dates".into(),
                reason: format!("{} dates for {} cash flows", dates.len(), amounts.len()),
            });
        }
        Ok(Self {
            flows: dates
                .iter()
                .zip(amounts)
                .map(|(&date, &amount)| DatedCashFlow { date, amount })
                .collect(),
        })
    }

    /// Stamp an annual series with the mid-year convention, period 0 at the base year
    pub fn annual(amounts: &[f64], convention: &DateConvention) -> ModelResult<Self> {
        Self::from_parts(&convention.annual_dates(amounts.len())?, amounts)
    }

    pub fn push(&mut self, date: NaiveDate, amount: f64) {
        self.flows.push(DatedCashFlow { date, amount });
    }

    pub fn flows(&self) -> &[DatedCashFlow] {
        &self.flows
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.flows.iter().map(|f| f.amount).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.flows.iter().map(|f| f.date).collect()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Add `amount` to the final entry; no-op on an empty series
    pub fn add_to_last(&mut self, amount: f64) {
        if let Some(last) = self.flows.last_mut() {
            last.amount += amount;
        }
    }

    /// Merge two series chronologically.
    ///
    /// Amounts landing on the same date are summed into a single entry, `self`
    /// first. Distinct dates are kept as separate entries, so a series that
    /// resumes strictly after another one ends is simply appended.
    pub fn merge(&self, other: &Self) -> Self {
        let mut flows: Vec<DatedCashFlow> = self.flows.iter().chain(&other.flows).copied().collect();
        // Stable: ties keep `self` ahead of `other`
        flows.sort_by_key(|f| f.date);

        let mut merged: Vec<DatedCashFlow> = Vec::with_capacity(flows.len());
        for flow in flows {
            match merged.last_mut() {
                Some(last) if last.date == flow.date => last.amount += flow.amount,
                _ => merged.push(flow),
            }
        }
        Self { flows: merged }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_calendar_date_rejects_month_zero() {
        assert!(matches!(calendar_date(2020, 0, 1), Err(ModelError::InvalidDate { .. })));
        assert_eq!(calendar_date(2020, 2, 29).unwrap(), NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        assert!(DatedCashFlows::from_parts(&[d(2015, 7)], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_annual_uses_mid_year_dates() {
        let cf = DatedCashFlows::annual(&[-1.0, 2.0, 3.0], &DateConvention::default()).unwrap();
        assert_eq!(cf.dates(), vec![d(2015, 7), d(2016, 7), d(2017, 7)]);
        assert_eq!(cf.amounts(), vec![-1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_merge_sums_shared_date() {
        let a = DatedCashFlows::from_parts(&[d(2015, 7), d(2016, 7)], &[-10.0, 1.0]).unwrap();
        let b = DatedCashFlows::from_parts(&[d(2016, 7), d(2017, 7)], &[5.0, 7.0]).unwrap();
        let merged = a.merge(&b);
        assert_eq!(merged.dates(), vec![d(2015, 7), d(2016, 7), d(2017, 7)]);
        assert_eq!(merged.amounts(), vec![-10.0, 6.0, 7.0]);
    }

    #[test]
    fn test_merge_appends_later_series() {
        let a = DatedCashFlows::from_parts(&[d(2015, 7), d(2016, 7)], &[-10.0, 0.0]).unwrap();
        let b = DatedCashFlows::from_parts(&[d(2016, 10), d(2017, 10)], &[5.0, 7.0]).unwrap();
        let merged = a.merge(&b);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.amounts(), vec![-10.0, 0.0, 5.0, 7.0]);
    }

    #[test]
    fn test_merge_interleaves_overlapping_series() {
        let a = DatedCashFlows::from_parts(&[d(2015, 7), d(2017, 7)], &[1.0, 3.0]).unwrap();
        let b = DatedCashFlows::from_parts(&[d(2016, 1)], &[2.0]).unwrap();
        assert_eq!(a.merge(&b).amounts(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_add_to_last() {
        let mut cf = DatedCashFlows::new();
        cf.add_to_last(5.0);
        assert!(cf.is_empty());
        cf.push(d(2015, 7), 1.0);
        cf.add_to_last(5.0);
        assert_eq!(cf.amounts(), vec![6.0]);
    }
}
