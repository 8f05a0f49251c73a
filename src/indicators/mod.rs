//! Financial indicators derived from a finished payment plan
//!
//! All rates are returned as decimals; `as_percentages` gives the
//! presentation form.

mod irr;

pub use irr::{calculate_tir, TirMode, TirSettings, TirSolution};

use serde::{Deserialize, Serialize};

use crate::error::{ensure_amount, ensure_rate, LoanError, LoanResult};
use crate::rates::{periodic_to_annual, PERIODS_PER_YEAR};
use crate::schedule::Installment;

/// How TCEA is derived from the total cost of the loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TceaConvention {
    /// `total_cost / principal - 1` over the whole term
    #[default]
    TotalCostRatio,
    /// For plans longer than a year, the total-cost ratio de-compounded to
    /// one year: `(1 + ratio)^(12/term) - 1`. Plans of a year or less keep
    /// the plain ratio.
    Annualized,
}

/// Summary indicators for one loan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialIndicators {
    /// Effective annual interest rate
    pub tea: f64,
    /// Effective annual yield to the lender (equal to TEA)
    pub trea: f64,
    /// Cost-inclusive effective annual rate
    pub tcea: f64,
    /// Net present value of the cash flows at the discount rate
    pub van: f64,
    /// Internal rate of return, effective annual
    pub tir: f64,
    /// False when TIR is a best-effort iterate that missed tolerance
    pub tir_converged: bool,
}

impl FinancialIndicators {
    /// Rates scaled by 100; VAN is left as a currency amount
    pub fn as_percentages(&self) -> Self {
        Self {
            tea: self.tea * 100.0,
            trea: self.trea * 100.0,
            tcea: self.tcea * 100.0,
            van: self.van,
            tir: self.tir * 100.0,
            tir_converged: self.tir_converged,
        }
    }
}

/// TEA from the effective monthly rate
pub fn effective_annual_rate(periodic_rate: f64) -> f64 {
    periodic_to_annual(periodic_rate)
}

/// TCEA from the plan's cash flows plus the activation fee
pub fn cost_effective_annual_rate(
    principal: f64,
    installments: &[Installment],
    activation_fee: f64,
    convention: TceaConvention,
) -> LoanResult<f64> {
    ensure_principal(principal)?;
    ensure_amount(activation_fee, "activation_fee")?;

    let total_cost: f64 = installments.iter().map(|i| i.cash_flow).sum::<f64>() + activation_fee;
    let ratio = total_cost / principal - 1.0;

    Ok(match convention {
        TceaConvention::Annualized if installments.len() > PERIODS_PER_YEAR as usize => {
            let horizon = PERIODS_PER_YEAR as f64 / installments.len() as f64;
            (1.0 + ratio).powf(horizon) - 1.0
        }
        TceaConvention::TotalCostRatio | TceaConvention::Annualized => ratio,
    })
}

/// VAN: cash flows discounted monthly at `discount_rate / 12`, less the principal
pub fn net_present_value(principal: f64, installments: &[Installment], discount_rate: f64) -> LoanResult<f64> {
    ensure_principal(principal)?;
    ensure_rate(discount_rate, "discount rate")?;

    let monthly = 1.0 + discount_rate / PERIODS_PER_YEAR as f64;
    let pv: f64 = installments
        .iter()
        .map(|i| i.cash_flow / monthly.powi(i.period as i32))
        .sum();

    Ok(pv - principal)
}

/// Compute TEA, TREA, TCEA, VAN and TIR for a finished schedule
pub fn compute_indicators(
    principal: f64,
    periodic_rate: f64,
    installments: &[Installment],
    discount_rate: f64,
    activation_fee: f64,
    tcea_convention: TceaConvention,
    tir_settings: &TirSettings,
) -> LoanResult<FinancialIndicators> {
    ensure_principal(principal)?;
    ensure_rate(periodic_rate, "periodic rate")?;
    ensure_rate(discount_rate, "discount rate")?;
    ensure_amount(activation_fee, "activation_fee")?;
    if installments.is_empty() {
        return Err(LoanError::InvalidScheduleConfiguration(
            "cannot compute indicators for an empty schedule".to_string(),
        ));
    }

    let tea = effective_annual_rate(periodic_rate);
    let tcea = cost_effective_annual_rate(principal, installments, activation_fee, tcea_convention)?;
    let van = net_present_value(principal, installments, discount_rate)?;

    let cash_flows: Vec<f64> = installments.iter().map(|i| i.cash_flow).collect();
    let tir = calculate_tir(principal, &cash_flows, tir_settings)?;

    log::debug!(
        "indicators: TEA {:.6} TCEA {:.6} VAN {:.2} TIR {:.6} ({} iterations)",
        tea,
        tcea,
        van,
        tir.rate,
        tir.iterations
    );

    Ok(FinancialIndicators {
        tea,
        trea: tea,
        tcea,
        van,
        tir: tir.rate,
        tir_converged: tir.converged,
    })
}

fn ensure_principal(principal: f64) -> LoanResult<()> {
    if !principal.is_finite() || principal <= 0.0 {
        return Err(LoanError::InvalidScheduleConfiguration(format!(
            "principal must be positive, got {}",
            principal
        )));
    }
    Ok(())
}
