//! Vacancy duration distribution and the assumed replacement tenant
//!
//! Vacancy after a departing tenant is measured in quarters. The raw
//! Poisson distribution is folded into a small table:
//! - bucket 0 holds the mass of outcomes `0..=lower_truncate`
//! - each outcome in `lower_truncate+1..upper_truncate` gets its own bucket
//! - the last bucket holds the remaining upper tail

use serde::{Deserialize, Serialize};
use statrs::distribution::{Discrete, Poisson};

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyAssumptions {
    /// Mean of the untruncated Poisson distribution
    pub poisson_mean: f64,

    /// Raw outcomes up to and including this value collapse into bucket 0
    pub lower_truncate: u64,

    /// Raw outcomes from this value upwards collapse into the tail bucket
    pub upper_truncate: u64,

    /// Months per vacancy bucket step
    pub months_per_bucket: u32,
}

impl Default for VacancyAssumptions {
    fn default() -> Self {
        Self {
            poisson_mean: 4.0,
            lower_truncate: 2,
            upper_truncate: 8,
            months_per_bucket: 3,
        }
    }
}

/// Lease terms assumed for whoever takes the space after a vacancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementTenantAssumptions {
    /// Tenant name; `None` models a unit that does not reimburse expenses
    pub name: Option<String>,

    /// Rent per sqm in base-year terms, escalated to the re-letting date
    pub base_rent_per_sqm: f64,
    pub annual_increase: f64,
    pub is_guarantee: bool,
    pub abatement_months: u32,
    pub ti_per_sqm: f64,
    pub cap_rate: f64,
    pub term_years: u32,
}

impl Default for ReplacementTenantAssumptions {
    fn default() -> Self {
        Self {
            name: Some("unknown".to_string()),
            base_rent_per_sqm: 708.0,
            annual_increase: 0.025,
            is_guarantee: true,
            abatement_months: 9,
            ti_per_sqm: 400.0,
            cap_rate: 0.055,
            term_years: 10,
        }
    }
}

/// One vacancy scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VacancyBucket {
    /// Vacancy duration in buckets (quarters by default)
    pub quarters: u32,
    pub probability: f64,
}

/// Discrete distribution over vacancy duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyDistribution {
    buckets: Vec<VacancyBucket>,
}

impl VacancyDistribution {
    /// Fold a Poisson distribution into truncated buckets
    pub fn truncated_poisson(assumptions: &VacancyAssumptions) -> ModelResult<Self> {
        let lower = assumptions.lower_truncate;
        let upper = assumptions.upper_truncate;
        if lower >= upper {
            return Err(ModelError::InvalidInput {
                field: "vacancy.lower_truncate".into(),
                reason: format!("must be below upper_truncate ({} >= {})", lower, upper),
            });
        }

        let poisson = Poisson::new(assumptions.poisson_mean).map_err(|e| ModelError::InvalidInput {
            field: "vacancy.poisson_mean".into(),
            reason: e.to_string(),
        })?;
        let masses: Vec<f64> = (0..upper).map(|k| poisson.pmf(k)).collect();

        let mut buckets = Vec::with_capacity((upper - lower + 1) as usize);
        buckets.push(VacancyBucket {
            quarters: 0,
            probability: masses[..=lower as usize].iter().sum(),
        });
        for k in (lower + 1)..upper {
            buckets.push(VacancyBucket {
                quarters: (k - lower) as u32,
                probability: masses[k as usize],
            });
        }
        buckets.push(VacancyBucket {
            quarters: (upper - lower) as u32,
            probability: 1.0 - masses.iter().sum::<f64>(),
        });

        Ok(Self { buckets })
    }

    /// Re-letting is certain to happen without a full quarter of vacancy
    pub fn immediate() -> Self {
        Self {
            buckets: vec![VacancyBucket { quarters: 0, probability: 1.0 }],
        }
    }

    pub fn from_buckets(buckets: Vec<VacancyBucket>) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> &[VacancyBucket] {
        &self.buckets
    }

    pub fn total_probability(&self) -> f64 {
        self.buckets.iter().map(|b| b.probability).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_truncated_poisson_sums_to_one() {
        let dist = VacancyDistribution::truncated_poisson(&VacancyAssumptions::default()).unwrap();
        assert_eq!(dist.buckets().len(), 7);
        assert_abs_diff_eq!(dist.total_probability(), 1.0, epsilon = 1e-9);
        assert!(dist.buckets().iter().all(|b| b.probability >= 0.0));
    }

    #[test]
    fn test_truncated_poisson_bucket_values() {
        let dist = VacancyDistribution::truncated_poisson(&VacancyAssumptions::default()).unwrap();
        let e4 = (-4.0f64).exp();
        let b = dist.buckets();

        // P(0) + P(1) + P(2) = e^-4 (1 + 4 + 8)
        assert_abs_diff_eq!(b[0].probability, 13.0 * e4, epsilon = 1e-12);
        // P(3) = e^-4 4^3 / 3!
        assert_abs_diff_eq!(b[1].probability, 64.0 / 6.0 * e4, epsilon = 1e-12);
        // P(7) = e^-4 4^7 / 7!
        assert_abs_diff_eq!(b[5].probability, 16384.0 / 5040.0 * e4, epsilon = 1e-12);
        assert_eq!(b[6].quarters, 6);
    }

    #[test]
    fn test_rejects_inverted_truncation() {
        let assumptions = VacancyAssumptions {
            lower_truncate: 8,
            upper_truncate: 2,
            ..Default::default()
        };
        assert!(VacancyDistribution::truncated_poisson(&assumptions).is_err());
    }

    #[test]
    fn test_rejects_invalid_mean() {
        let assumptions = VacancyAssumptions {
            poisson_mean: -1.0,
            ..Default::default()
        };
        assert!(VacancyDistribution::truncated_poisson(&assumptions).is_err());
    }

    #[test]
    fn test_immediate() {
        let dist = VacancyDistribution::immediate();
        assert_eq!(dist.buckets().len(), 1);
        assert_eq!(dist.total_probability(), 1.0);
    }
}
