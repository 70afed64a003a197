//! Load tenant profiles from a roster CSV

use csv::Reader;
use std::io::Read;
use std::path::Path;

use super::TenantProfile;
use crate::assumptions::PropertyAssumptions;
use crate::error::{ModelError, ModelResult};

/// Quoted rent may differ from rent per sqm times the property area by this share
const RENT_TOLERANCE: f64 = 0.01;

/// Raw CSV row matching the roster columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    name: String,
    total_sqm: f64,
    term_months: u32,
    is_guaranteed: String,
    initial_rent: f64,
    initial_rent_per_sqm: f64,
    annual_increase: f64,
    abatement: u32,
    ti: f64,
    exit_cap_rate: f64,
}

impl CsvRow {
    fn into_profile(self) -> ModelResult<TenantProfile> {
        let is_guaranteed = match self.is_guaranteed.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" => false,
            other => {
                return Err(ModelError::InvalidInput {
                    field: "is_guaranteed".into(),
                    reason: format!("unrecognised flag '{}' for {}", other, self.name),
                })
            }
        };

        if self.exit_cap_rate <= 0.0 {
            return Err(ModelError::InvalidInput {
                field: "exit_cap_rate".into(),
                reason: format!("must be positive for {}", self.name),
            });
        }

        Ok(TenantProfile {
            name: self.name,
            total_sqm: self.total_sqm,
            term_months: self.term_months,
            is_guaranteed,
            initial_rent: self.initial_rent,
            initial_rent_per_sqm: self.initial_rent_per_sqm,
            annual_increase: self.annual_increase,
            abatement_months: self.abatement,
            ti_per_sqm: self.ti,
            exit_cap_rate: self.exit_cap_rate,
            benchmark_equity_multiple: None,
            benchmark_irr: None,
        })
    }
}

/// Load all tenant profiles from a CSV file
pub fn load_roster<P: AsRef<Path>>(path: P) -> ModelResult<Vec<TenantProfile>> {
    load_roster_from_reader(Reader::from_path(path)?)
}

/// Load tenant profiles from any CSV reader
pub fn load_roster_from_reader<R: Read>(mut reader: Reader<R>) -> ModelResult<Vec<TenantProfile>> {
    let mut profiles = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        profiles.push(row.into_profile()?);
    }
    log::debug!("Loaded {} tenant profiles", profiles.len());
    Ok(profiles)
}

/// Names of profiles whose area or quoted rent disagree with the property.
///
/// Projections always use the property's area and the rent per sqm, so a
/// mismatch is logged and otherwise ignored.
pub fn roster_mismatches<'a>(profiles: &'a [TenantProfile], property: &PropertyAssumptions) -> Vec<&'a str> {
    let area = property.total_area_sqm;
    profiles
        .iter()
        .filter(|p| {
            let mut mismatch = false;
            if (p.total_sqm - area).abs() > 1e-6 {
                log::warn!("{}: roster area {} sqm, property area {} sqm", p.name, p.total_sqm, area);
                mismatch = true;
            }
            let implied_rent = p.initial_rent_per_sqm * area;
            if (p.initial_rent - implied_rent).abs() > RENT_TOLERANCE * implied_rent.abs() {
                log::warn!(
                    "{}: quoted rent {:.0} but {} per sqm over {} sqm is {:.0}",
                    p.name,
                    p.initial_rent,
                    p.initial_rent_per_sqm,
                    area,
                    implied_rent
                );
                mismatch = true;
            }
            mismatch
        })
        .map(|p| p.name.as_str())
        .collect()
}
