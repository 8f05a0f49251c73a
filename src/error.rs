//! Error types for loan calculations

use thiserror::Error;

/// Result alias used throughout the engine
pub type LoanResult<T> = Result<T, LoanError>;

/// Failures raised by the amortization and indicator engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    /// Negative or non-finite rate, or a non-positive capitalization frequency
    #[error("Invalid rate: {value} - {reason}")]
    InvalidRate { value: f64, reason: String },

    /// Term, grace periods or principal leave no amortizing phase
    #[error("Invalid schedule configuration: {0}")]
    InvalidScheduleConfiguration(String),

    /// Newton-Raphson could not produce a finite TIR
    #[error("TIR did not converge after {iterations} iterations (last rate: {last_rate})")]
    TirNonConvergent { iterations: u32, last_rate: f64 },

    /// Negative or non-finite monetary amount
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },
}

impl LoanError {
    pub(crate) fn invalid_rate(value: f64, reason: impl Into<String>) -> Self {
        LoanError::InvalidRate {
            value,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        LoanError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Check that a rate is a finite, non-negative fraction
pub(crate) fn ensure_rate(value: f64, name: &str) -> LoanResult<()> {
    if !value.is_finite() {
        return Err(LoanError::invalid_rate(value, format!("{} must be finite", name)));
    }
    if value < 0.0 {
        return Err(LoanError::invalid_rate(value, format!("{} must not be negative", name)));
    }
    Ok(())
}

/// Check that a monetary amount is finite and non-negative
pub(crate) fn ensure_amount(value: f64, field: &str) -> LoanResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(LoanError::invalid_input(
            field,
            format!("expected a finite non-negative amount, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_rate() {
        assert!(ensure_rate(0.0, "rate").is_ok());
        assert!(ensure_rate(0.12, "rate").is_ok());
        assert!(matches!(ensure_rate(-0.01, "rate"), Err(LoanError::InvalidRate { .. })));
        assert!(matches!(ensure_rate(f64::NAN, "rate"), Err(LoanError::InvalidRate { .. })));
    }

    #[test]
    fn test_error_messages() {
        let err = LoanError::TirNonConvergent { iterations: 3, last_rate: 0.1 };
        assert_eq!(err.to_string(), "TIR did not converge after 3 iterations (last rate: 0.1)");

        let err = ensure_amount(-5.0, "property_value").unwrap_err();
        assert!(err.to_string().starts_with("Invalid input: property_value"));
    }
}
