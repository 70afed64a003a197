//! All-equity purchase

use super::terminal_sale_price;
use crate::error::{ModelError, ModelResult};
use crate::projection::LeaseProjection;

fn overlay(projection: &LeaseProjection, sale_year: Option<u32>, purchase_price: f64) -> ModelResult<Vec<f64>> {
    let cfbds = &projection.cash_flow_before_debt_service;
    let first = cfbds.first().ok_or_else(|| ModelError::InvalidInput {
        field: "term_years".into(),
        reason: "lease has no projected years".into(),
    })?;

    let mut cash_flow = vec![first - purchase_price];
    match sale_year {
        Some(year) if year as usize <= cfbds.len() => {
            let year = year as usize;
            cash_flow.extend(cfbds.iter().take(year).skip(1));
            cash_flow.push(terminal_sale_price(
                &projection.net_operating_income,
                year,
                projection.terms.cap_rate,
            )?);
        }
        // No sale inside the lease: hold through the term
        _ => cash_flow.extend(cfbds.iter().skip(1)),
    }
    Ok(cash_flow)
}

/// Investor series for an all-equity purchase.
///
/// With a sale year `y` inside the lease the series runs `y + 1` periods:
/// the purchase in period 0, cash flow before debt service through year
/// `y - 1`, then the sale at year-`y` NOI over the cap rate.
pub fn unleveraged_cash_flow(
    projection: &LeaseProjection,
    sale_year: Option<u32>,
    purchase_price: f64,
) -> ModelResult<Vec<f64>> {
    overlay(projection, sale_year, purchase_price)
}

/// Same as [`unleveraged_cash_flow`] with no purchase, for a replacement tenant on a building already owned
pub fn future_unleveraged_cash_flow(projection: &LeaseProjection, sale_year: Option<u32>) -> ModelResult<Vec<f64>> {
    overlay(projection, sale_year, 0.0)
}
