//! Internal Rate of Return (TIR) calculation
//!
//! Cash flow `t` (1-based month) is discounted by `(1 + r)^(t/12)`, so the
//! solved rate is an effective annual rate.

use serde::{Deserialize, Serialize};

use crate::error::{LoanError, LoanResult};
use crate::rates::PERIODS_PER_YEAR;

/// What to do when the iteration cap is reached without meeting tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TirMode {
    /// Return the last iterate, flagged as not converged
    #[default]
    BestEffort,
    /// Fail with `TirNonConvergent`
    Strict,
}

/// Newton-Raphson settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TirSettings {
    pub initial_guess: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub mode: TirMode,
}

impl Default for TirSettings {
    fn default() -> Self {
        Self {
            initial_guess: 0.10,
            tolerance: 1e-4,
            max_iterations: 100,
            mode: TirMode::BestEffort,
        }
    }
}

/// Solved TIR and how it was reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TirSolution {
    /// Annual rate as a decimal (e.g., 0.05 for 5%)
    pub rate: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Calculate the TIR of a loan: the rate at which discounted cash flows
/// repay `principal` exactly, using the Newton-Raphson method.
///
/// # Arguments
/// * `principal` - Amount disbursed at time zero
/// * `cash_flows` - Monthly outflows, index 0 = period 1
/// * `settings` - Initial guess, tolerance, iteration cap and strictness
pub fn calculate_tir(principal: f64, cash_flows: &[f64], settings: &TirSettings) -> LoanResult<TirSolution> {
    let mut rate = settings.initial_guess;

    for iteration in 1..=settings.max_iterations {
        let (npv, dnpv) = npv_and_derivative(principal, cash_flows, rate);

        if dnpv == 0.0 || !dnpv.is_finite() || !npv.is_finite() {
            return Err(LoanError::TirNonConvergent {
                iterations: iteration,
                last_rate: rate,
            });
        }

        let new_rate = rate - npv / dnpv;
        if !new_rate.is_finite() {
            return Err(LoanError::TirNonConvergent {
                iterations: iteration,
                last_rate: rate,
            });
        }

        if (new_rate - rate).abs() < settings.tolerance {
            return Ok(TirSolution {
                rate: new_rate,
                iterations: iteration,
                converged: true,
            });
        }

        rate = new_rate;
    }

    match settings.mode {
        TirMode::Strict => Err(LoanError::TirNonConvergent {
            iterations: settings.max_iterations,
            last_rate: rate,
        }),
        TirMode::BestEffort => {
            log::warn!(
                "TIR did not meet tolerance {} in {} iterations, returning last iterate {}",
                settings.tolerance,
                settings.max_iterations,
                rate
            );
            Ok(TirSolution {
                rate,
                iterations: settings.max_iterations,
                converged: false,
            })
        }
    }
}

/// Calculate NPV and its derivative with respect to rate
fn npv_and_derivative(principal: f64, cash_flows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = -principal;
    let mut dnpv = 0.0;

    for (index, &cf) in cash_flows.iter().enumerate() {
        let years = (index + 1) as f64 / PERIODS_PER_YEAR as f64;
        npv += cf / (1.0 + rate).powf(years);
        dnpv -= years * cf / (1.0 + rate).powf(years + 1.0);
    }

    (npv, dnpv)
}
