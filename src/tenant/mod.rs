//! Tenants: lease inputs, profiles and the built-in roster

mod data;
pub mod loader;

pub use data::{FinancingBenchmarks, LeaseTerms, TenantProfile};
pub use loader::{load_roster, load_roster_from_reader, roster_mismatches};

use crate::error::{ModelError, ModelResult};

/// Tenants bidding for the space in the reference deal
pub fn builtin_roster() -> Vec<TenantProfile> {
    vec![TenantProfile::topshop(), TenantProfile::zara(), TenantProfile::decathlon()]
}

/// Case-insensitive lookup by tenant name
pub fn find_profile<'a>(roster: &'a [TenantProfile], name: &str) -> ModelResult<&'a TenantProfile> {
    roster
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| ModelError::UnknownTenant(name.to_string()))
}
