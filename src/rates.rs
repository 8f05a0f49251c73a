//! Rate normalization
//!
//! Every quoted rate is reduced once, here, to the effective monthly rate the
//! schedule is built on. Downstream stages only ever see that periodic rate.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_rate, LoanError, LoanResult};

/// Number of schedule periods per year (monthly installments)
pub const PERIODS_PER_YEAR: u32 = 12;

/// How the lender quotes the interest rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSpec {
    /// Effective annual rate (TEA)
    EffectiveAnnual { value: f64 },
    /// Nominal annual rate (TNA) compounded `capitalization_frequency` times a year
    NominalAnnual { value: f64, capitalization_frequency: u32 },
}

impl RateSpec {
    pub fn effective(value: f64) -> Self {
        RateSpec::EffectiveAnnual { value }
    }

    pub fn nominal(value: f64, capitalization_frequency: u32) -> Self {
        RateSpec::NominalAnnual {
            value,
            capitalization_frequency,
        }
    }

    /// Quoted annual value, before any conversion
    pub fn quoted_value(&self) -> f64 {
        match *self {
            RateSpec::EffectiveAnnual { value } => value,
            RateSpec::NominalAnnual { value, .. } => value,
        }
    }

    /// Effective annual rate implied by this quote
    pub fn effective_annual(&self) -> LoanResult<f64> {
        self.validate()?;
        Ok(match *self {
            RateSpec::EffectiveAnnual { value } => value,
            RateSpec::NominalAnnual {
                value,
                capitalization_frequency,
            } => {
                let m = capitalization_frequency as f64;
                (1.0 + value / m).powf(m) - 1.0
            }
        })
    }

    /// Effective monthly rate used by the schedule
    pub fn periodic_rate(&self) -> LoanResult<f64> {
        normalize(self)
    }

    fn validate(&self) -> LoanResult<()> {
        match *self {
            RateSpec::EffectiveAnnual { value } => ensure_rate(value, "effective annual rate"),
            RateSpec::NominalAnnual {
                value,
                capitalization_frequency,
            } => {
                ensure_rate(value, "nominal annual rate")?;
                if capitalization_frequency == 0 {
                    return Err(LoanError::invalid_rate(
                        value,
                        "capitalization frequency must be positive",
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Convert a quoted rate into the effective monthly rate
pub fn normalize(rate: &RateSpec) -> LoanResult<f64> {
    rate.validate()?;

    let periodic = match *rate {
        // Monthly capitalization on a monthly schedule is exact: TNA / 12
        RateSpec::NominalAnnual {
            value,
            capitalization_frequency: PERIODS_PER_YEAR,
        } => value / PERIODS_PER_YEAR as f64,
        _ => annual_to_periodic(rate.effective_annual()?),
    };

    log::debug!("normalized {:?} to periodic rate {:.10}", rate, periodic);
    Ok(periodic)
}

/// Effective annual rate -> effective monthly rate
pub fn annual_to_periodic(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / PERIODS_PER_YEAR as f64) - 1.0
}

/// Effective monthly rate -> effective annual rate
pub fn periodic_to_annual(periodic_rate: f64) -> f64 {
    (1.0 + periodic_rate).powi(PERIODS_PER_YEAR as i32) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_effective_annual_to_monthly() {
        let r = normalize(&RateSpec::effective(0.10)).unwrap();
        assert_relative_eq!(r, 0.007974140428903764, epsilon = 1e-12);
        assert_relative_eq!(periodic_to_annual(r), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_nominal_monthly_capitalization() {
        let r = normalize(&RateSpec::nominal(0.12, 12)).unwrap();
        assert_eq!(r, 0.01);
    }

    #[test]
    fn test_nominal_quarterly_capitalization() {
        let spec = RateSpec::nominal(0.12, 4);
        let tea = spec.effective_annual().unwrap();
        assert_relative_eq!(tea, 1.03_f64.powi(4) - 1.0, epsilon = 1e-12);

        let r = normalize(&spec).unwrap();
        assert_relative_eq!((1.0 + r).powi(3), 1.03, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_rate() {
        assert_eq!(normalize(&RateSpec::effective(0.0)).unwrap(), 0.0);
        assert_eq!(normalize(&RateSpec::nominal(0.0, 360)).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_rates() {
        assert!(matches!(
            normalize(&RateSpec::effective(-0.05)),
            Err(LoanError::InvalidRate { .. })
        ));
        assert!(matches!(
            normalize(&RateSpec::nominal(0.10, 0)),
            Err(LoanError::InvalidRate { .. })
        ));
        assert!(matches!(
            normalize(&RateSpec::effective(f64::INFINITY)),
            Err(LoanError::InvalidRate { .. })
        ));
    }
}
