//! Loan term structures consumed by the calculation pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_amount, ensure_rate, LoanError, LoanResult};
use crate::rates::RateSpec;

/// Discount rate the original calculator used for VAN (10% nominal annual)
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.10;

/// Immutable terms of a single loan, after down payment and subsidy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Net amount financed
    pub principal: f64,

    /// Appraised property value (basis for property insurance)
    pub property_value: f64,

    /// Total number of monthly periods
    pub term: u32,

    /// Full-grace periods: no payment, interest capitalizes
    pub total_grace: u32,

    /// Partial-grace periods: interest only
    pub partial_grace: u32,

    /// Quoted interest rate
    pub rate: RateSpec,

    /// Monthly insurance rate applied to the outstanding balance
    pub balance_insurance_rate: f64,

    /// Monthly insurance rate applied to the property value
    pub property_insurance_rate: f64,

    /// One-time activation fee charged at disbursement
    pub activation_fee: f64,

    /// Nominal annual discount rate for VAN
    pub discount_rate: f64,

    /// Disbursement date; when set, installment `i` is due `i` months later
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl LoanTerms {
    /// Plain loan with no grace, insurance or fees
    pub fn new(principal: f64, term: u32, rate: RateSpec) -> Self {
        Self {
            principal,
            property_value: 0.0,
            term,
            total_grace: 0,
            partial_grace: 0,
            rate,
            balance_insurance_rate: 0.0,
            property_insurance_rate: 0.0,
            activation_fee: 0.0,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            start_date: None,
        }
    }

    pub fn with_grace(mut self, total_grace: u32, partial_grace: u32) -> Self {
        self.total_grace = total_grace;
        self.partial_grace = partial_grace;
        self
    }

    pub fn with_insurance(
        mut self,
        balance_insurance_rate: f64,
        property_insurance_rate: f64,
        property_value: f64,
    ) -> Self {
        self.balance_insurance_rate = balance_insurance_rate;
        self.property_insurance_rate = property_insurance_rate;
        self.property_value = property_value;
        self
    }

    pub fn with_activation_fee(mut self, activation_fee: f64) -> Self {
        self.activation_fee = activation_fee;
        self
    }

    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Number of periods paying the constant installment
    pub fn amortizing_periods(&self) -> u32 {
        self.term
            .saturating_sub(self.total_grace)
            .saturating_sub(self.partial_grace)
    }

    /// Validate every field before any computation starts
    pub fn validate(&self) -> LoanResult<()> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(LoanError::InvalidScheduleConfiguration(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if self.term < 1 {
            return Err(LoanError::InvalidScheduleConfiguration(
                "term must be at least one period".to_string(),
            ));
        }
        if self.total_grace as u64 + self.partial_grace as u64 >= self.term as u64 {
            return Err(LoanError::InvalidScheduleConfiguration(format!(
                "grace periods ({} total + {} partial) consume the whole term of {}",
                self.total_grace, self.partial_grace, self.term
            )));
        }

        self.rate.effective_annual()?;
        ensure_rate(self.balance_insurance_rate, "balance insurance rate")?;
        ensure_rate(self.property_insurance_rate, "property insurance rate")?;
        ensure_rate(self.discount_rate, "discount rate")?;

        ensure_amount(self.property_value, "property_value")?;
        ensure_amount(self.activation_fee, "activation_fee")?;
        Ok(())
    }
}

/// A loan request as captured from the applicant, before netting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    /// Caller-side identifier, carried through batch results
    #[serde(default)]
    pub loan_id: u32,

    /// Requested loan amount (usually the property price)
    pub loan_amount: f64,

    /// Down payment paid by the applicant
    pub down_payment: f64,

    /// Housing subsidy bonus, if granted
    #[serde(default)]
    pub subsidy: Option<f64>,

    pub property_value: f64,
    pub term: u32,
    pub total_grace: u32,
    pub partial_grace: u32,
    pub rate: RateSpec,
    pub balance_insurance_rate: f64,
    pub property_insurance_rate: f64,
    pub activation_fee: f64,
    pub discount_rate: f64,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl LoanApplication {
    /// Amount actually financed: loan amount less down payment and subsidy
    pub fn financed_amount(&self) -> f64 {
        self.loan_amount - self.down_payment - self.subsidy.unwrap_or(0.0)
    }

    /// Down payment as a fraction of the property value
    pub fn down_payment_percentage(&self) -> f64 {
        if self.property_value <= 0.0 {
            0.0
        } else {
            self.down_payment / self.property_value
        }
    }

    /// Net the application into validated loan terms
    pub fn into_terms(&self) -> LoanResult<LoanTerms> {
        ensure_amount(self.loan_amount, "loan_amount")?;
        ensure_amount(self.down_payment, "down_payment")?;
        if let Some(subsidy) = self.subsidy {
            ensure_amount(subsidy, "subsidy")?;
        }

        let principal = self.financed_amount();
        if principal <= 0.0 {
            return Err(LoanError::InvalidScheduleConfiguration(format!(
                "down payment and subsidy cover the whole loan amount (net principal {:.2})",
                principal
            )));
        }

        let terms = LoanTerms {
            principal,
            property_value: self.property_value,
            term: self.term,
            total_grace: self.total_grace,
            partial_grace: self.partial_grace,
            rate: self.rate,
            balance_insurance_rate: self.balance_insurance_rate,
            property_insurance_rate: self.property_insurance_rate,
            activation_fee: self.activation_fee,
            discount_rate: self.discount_rate,
            start_date: self.start_date,
        };
        terms.validate()?;
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn application() -> LoanApplication {
        LoanApplication {
            loan_id: 1,
            loan_amount: 250_000.0,
            down_payment: 50_000.0,
            subsidy: Some(25_000.0),
            property_value: 250_000.0,
            term: 240,
            total_grace: 0,
            partial_grace: 0,
            rate: RateSpec::effective(0.095),
            balance_insurance_rate: 0.0005,
            property_insurance_rate: 0.0003,
            activation_fee: 300.0,
            discount_rate: 0.10,
            start_date: None,
        }
    }

    #[test]
    fn test_application_netting() {
        let app = application();
        assert_eq!(app.financed_amount(), 175_000.0);
        assert_eq!(app.down_payment_percentage(), 0.2);

        let terms = app.into_terms().unwrap();
        assert_eq!(terms.principal, 175_000.0);
        assert_eq!(terms.property_value, 250_000.0);
    }

    #[test]
    fn test_application_fully_covered() {
        let mut app = application();
        app.down_payment = 225_000.0;
        assert!(matches!(
            app.into_terms(),
            Err(LoanError::InvalidScheduleConfiguration(_))
        ));
    }

    #[test]
    fn test_negative_subsidy_rejected() {
        let mut app = application();
        app.subsidy = Some(-1.0);
        assert!(matches!(app.into_terms(), Err(LoanError::InvalidInput { .. })));
    }

    #[test]
    fn test_validate_grace_consumes_term() {
        let terms = LoanTerms::new(10_000.0, 12, RateSpec::effective(0.1)).with_grace(6, 6);
        assert_eq!(terms.amortizing_periods(), 0);
        assert!(matches!(
            terms.validate(),
            Err(LoanError::InvalidScheduleConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_bad_inputs() {
        let zero_term = LoanTerms::new(10_000.0, 0, RateSpec::effective(0.1));
        assert!(matches!(
            zero_term.validate(),
            Err(LoanError::InvalidScheduleConfiguration(_))
        ));

        let zero_principal = LoanTerms::new(0.0, 12, RateSpec::effective(0.1));
        assert!(matches!(
            zero_principal.validate(),
            Err(LoanError::InvalidScheduleConfiguration(_))
        ));

        let negative_insurance =
            LoanTerms::new(10_000.0, 12, RateSpec::effective(0.1)).with_insurance(-0.001, 0.0, 0.0);
        assert!(matches!(negative_insurance.validate(), Err(LoanError::InvalidRate { .. })));

        let negative_fee = LoanTerms::new(10_000.0, 12, RateSpec::effective(0.1)).with_activation_fee(-10.0);
        assert!(matches!(negative_fee.validate(), Err(LoanError::InvalidInput { .. })));
    }
}
