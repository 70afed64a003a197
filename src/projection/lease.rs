//! Year-by-year lease projection for a single tenant
//!
//! A projection is a pure function of the lease inputs and the property
//! assumptions. Every series has one entry per lease year.

use serde::{Deserialize, Serialize};

use crate::assumptions::PropertyAssumptions;
use crate::tenant::LeaseTerms;

/// Revenue, expense and cash flow before debt service for every lease year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseProjection {
    pub terms: LeaseTerms,

    /// First-year rent for the whole area
    pub initial_annual_rent: f64,

    /// Tenant improvement allowance for the whole area, paid in year 0
    pub tenant_improvement: f64,

    /// Rent forgone in year 0
    pub base_rental_abatement: f64,

    pub base_rental_revenue: Vec<f64>,
    pub scheduled_base_rental_revenue: Vec<f64>,
    pub operating_expense: Vec<f64>,
    pub expense_reimburse_revenue: Vec<f64>,
    pub total_gross_revenue: Vec<f64>,
    pub net_operating_income: Vec<f64>,
    pub leasing_commission: Vec<f64>,
    pub capital_reserve: Vec<f64>,
    pub total_leasing_and_capital_cost: Vec<f64>,
    pub cash_flow_before_debt_service: Vec<f64>,
}

impl LeaseProjection {
    /// Project all series for the given lease
    pub fn project(terms: &LeaseTerms, property: &PropertyAssumptions) -> Self {
        let term = terms.term_years as usize;
        let escalation = |i: usize| (1.0 + terms.annual_increase).powi(i as i32);

        let initial_annual_rent = terms.initial_rent_per_sqm * property.total_area_sqm;
        let tenant_improvement = terms.ti_per_sqm * property.total_area_sqm;
        let base_rental_abatement = terms.abatement_months as f64 / 12.0 * initial_annual_rent;

        let base_rental_revenue: Vec<f64> = (0..term).map(|i| initial_annual_rent * escalation(i)).collect();

        let mut scheduled_base_rental_revenue = base_rental_revenue.clone();
        if let Some(first) = scheduled_base_rental_revenue.first_mut() {
            *first -= base_rental_abatement;
        }

        let operating_expense: Vec<f64> = (0..term)
            .map(|i| property.initial_operating_expense * (1.0 + property.operating_expense_growth).powi(i as i32))
            .collect();

        let expense_reimburse_revenue = if terms.reimburses_expenses() {
            operating_expense.clone()
        } else {
            vec![0.0; term]
        };

        let total_gross_revenue: Vec<f64> = scheduled_base_rental_revenue
            .iter()
            .zip(&expense_reimburse_revenue)
            .map(|(rent, reimbursed)| rent + reimbursed)
            .collect();

        let net_operating_income: Vec<f64> = total_gross_revenue
            .iter()
            .zip(&operating_expense)
            .map(|(gross, opex)| gross - opex)
            .collect();

        // Commission escalates off year-0 base rent, not the abated figure
        let first_year_rent = base_rental_revenue.first().copied().unwrap_or(0.0);
        let leasing_commission: Vec<f64> = (0..term)
            .map(|i| first_year_rent * property.leasing_commission_rate * escalation(i))
            .collect();

        let capital_reserve = vec![property.total_area_sqm * property.capital_reserve_per_sqm; term];

        let mut total_leasing_and_capital_cost: Vec<f64> = capital_reserve
            .iter()
            .zip(&leasing_commission)
            .map(|(reserve, commission)| reserve + commission)
            .collect();
        if let Some(first) = total_leasing_and_capital_cost.first_mut() {
            *first += tenant_improvement;
        }

        let cash_flow_before_debt_service = net_operating_income
            .iter()
            .zip(&total_leasing_and_capital_cost)
            .map(|(noi, cost)| noi - cost)
            .collect();

        Self {
            terms: terms.clone(),
            initial_annual_rent,
            tenant_improvement,
            base_rental_abatement,
            base_rental_revenue,
            scheduled_base_rental_revenue,
            operating_expense,
            expense_reimburse_revenue,
            total_gross_revenue,
            net_operating_income,
            leasing_commission,
            capital_reserve,
            total_leasing_and_capital_cost,
            cash_flow_before_debt_service,
        }
    }

    pub fn term_years(&self) -> usize {
        self.cash_flow_before_debt_service.len()
    }

    /// Operating expense in the final lease year
    pub fn final_operating_expense(&self) -> f64 {
        self.operating_expense.last().copied().unwrap_or(0.0)
    }
}
