//! End-to-end loan calculation
//!
//! Runs the stages strictly in order: rate normalization, schedule
//! generation, insurance overlay, indicators. Each request owns all of its
//! values, so batches run in parallel without coordination.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::LoanResult;
use crate::indicators::{compute_indicators, FinancialIndicators, TceaConvention, TirSettings};
use crate::loan::{LoanApplication, LoanTerms};
use crate::rates::normalize;
use crate::schedule::{apply_insurance, assign_payment_dates, generate, PaymentPlan};

/// Configuration for the indicator stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Newton-Raphson settings for TIR
    pub tir: TirSettings,

    /// TCEA convention
    pub tcea_convention: TceaConvention,
}

/// Schedule and indicators for one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCalculation {
    /// Effective monthly rate the schedule was built on
    pub periodic_rate: f64,
    pub plan: PaymentPlan,
    pub indicators: FinancialIndicators,
}

/// Result of one application in a batch
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub loan_id: u32,
    pub result: LoanResult<LoanCalculation>,
}

/// Loan calculator with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct LoanCalculator {
    config: EngineConfig,
}

impl LoanCalculator {
    /// Create calculator with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the payment plan only
    pub fn payment_plan(&self, terms: &LoanTerms) -> LoanResult<(f64, PaymentPlan)> {
        terms.validate()?;

        let periodic_rate = normalize(&terms.rate)?;
        let schedule = generate(
            terms.principal,
            periodic_rate,
            terms.term,
            terms.total_grace,
            terms.partial_grace,
        )?;
        let schedule = apply_insurance(
            schedule,
            terms.balance_insurance_rate,
            terms.property_insurance_rate,
            terms.property_value,
        )?;
        let schedule = match terms.start_date {
            Some(start) => assign_payment_dates(schedule, start),
            None => schedule,
        };

        Ok((periodic_rate, PaymentPlan::new(schedule)))
    }

    /// Run the full calculation for validated terms
    pub fn calculate(&self, terms: &LoanTerms) -> LoanResult<LoanCalculation> {
        let (periodic_rate, plan) = self.payment_plan(terms)?;

        let indicators = compute_indicators(
            terms.principal,
            periodic_rate,
            &plan.installments,
            terms.discount_rate,
            terms.activation_fee,
            self.config.tcea_convention,
            &self.config.tir,
        )?;

        Ok(LoanCalculation {
            periodic_rate,
            plan,
            indicators,
        })
    }

    /// Net an application into terms, then calculate
    pub fn calculate_application(&self, application: &LoanApplication) -> LoanResult<LoanCalculation> {
        let terms = application.into_terms()?;
        self.calculate(&terms)
    }

    /// Run many applications in parallel; one failure does not stop the rest
    pub fn run_batch(&self, applications: &[LoanApplication]) -> Vec<BatchOutcome> {
        applications
            .par_iter()
            .map(|application| BatchOutcome {
                loan_id: application.loan_id,
                result: self.calculate_application(application),
            })
            .collect()
    }
}
