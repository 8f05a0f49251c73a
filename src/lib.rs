//! Loan Amortization - French-method payment schedules and financial indicators
//!
//! This library provides:
//! - Rate normalization (TEA, or TNA with a capitalization frequency)
//! - Constant-installment schedules with total and partial grace periods
//! - Balance and property insurance overlays
//! - TEA, TCEA, VAN and TIR (Newton-Raphson) indicators
//! - Batch calculation over CSV loan files

pub mod error;
pub mod rates;
pub mod loan;
pub mod schedule;
pub mod indicators;
pub mod calculator;

// Re-export commonly used types
pub use error::{LoanError, LoanResult};
pub use rates::{normalize, RateSpec};
pub use loan::{LoanTerms, LoanApplication};
pub use schedule::{Installment, PaymentPlan, PlanSummary, PeriodPhase};
pub use indicators::{compute_indicators, FinancialIndicators, TceaConvention, TirMode, TirSettings};
pub use calculator::{LoanCalculator, LoanCalculation, EngineConfig, BatchOutcome};
