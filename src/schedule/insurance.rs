//! Insurance overlay on a generated schedule
//!
//! Two monthly charges are layered on top of the French-method fee:
//! - balance (credit life) insurance on the period's closing balance
//! - property insurance on the appraised value, constant every period

use super::installment::Installment;
use crate::error::{ensure_amount, ensure_rate, LoanResult};

/// Populate insurance charges and cash flow on each installment
///
/// Balances are never recomputed; this is a pure map over the schedule.
pub fn apply_insurance(
    installments: Vec<Installment>,
    balance_insurance_rate: f64,
    property_insurance_rate: f64,
    property_value: f64,
) -> LoanResult<Vec<Installment>> {
    ensure_rate(balance_insurance_rate, "balance insurance rate")?;
    ensure_rate(property_insurance_rate, "property insurance rate")?;
    ensure_amount(property_value, "property_value")?;

    let property_insurance = property_value * property_insurance_rate;

    Ok(installments
        .into_iter()
        .map(|mut installment| {
            installment.balance_insurance = installment.closing_balance * balance_insurance_rate;
            installment.property_insurance = property_insurance;
            installment.cash_flow =
                installment.fee + installment.balance_insurance + installment.property_insurance;
            installment
        })
        .collect())
}
