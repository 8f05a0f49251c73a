//! Installment and payment plan output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which grace policy governs a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodPhase {
    /// No payment; interest capitalizes into the balance
    TotalGrace,
    /// Interest-only payment; balance unchanged
    PartialGrace,
    /// Constant French-method installment
    Amortizing,
}

impl PeriodPhase {
    pub fn is_grace(&self) -> bool {
        !matches!(self, PeriodPhase::Amortizing)
    }
}

/// A single row of the payment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// Period index (1-based)
    pub period: u32,

    /// Due date, when the loan has a disbursement date
    pub payment_date: Option<NaiveDate>,

    pub phase: PeriodPhase,

    // Balances and French-method split
    pub opening_balance: f64,
    pub fee: f64,
    pub interest: f64,
    pub amortization: f64,
    pub closing_balance: f64,

    // Insurance charges
    pub balance_insurance: f64,
    pub property_insurance: f64,

    /// Total outflow for the period: fee plus both insurance charges
    pub cash_flow: f64,
}

impl Installment {
    /// Create an installment with no insurance; cash flow equals the fee
    pub fn new(
        period: u32,
        phase: PeriodPhase,
        opening_balance: f64,
        fee: f64,
        interest: f64,
        amortization: f64,
        closing_balance: f64,
    ) -> Self {
        Self {
            period,
            payment_date: None,
            phase,
            opening_balance,
            fee,
            interest,
            amortization,
            closing_balance,
            balance_insurance: 0.0,
            property_insurance: 0.0,
            cash_flow: fee,
        }
    }

    /// Interest added to the balance this period (full grace only)
    pub fn capitalized_interest(&self) -> f64 {
        match self.phase {
            PeriodPhase::TotalGrace => self.interest,
            _ => 0.0,
        }
    }
}

/// Complete payment plan for one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    /// Installments ordered by ascending period
    pub installments: Vec<Installment>,

    /// Sum of interest accrued over the whole term
    pub total_interest: f64,

    /// Sum of cash flows (fees plus insurance)
    pub total_paid: f64,
}

impl PaymentPlan {
    pub fn new(installments: Vec<Installment>) -> Self {
        let total_interest = installments.iter().map(|i| i.interest).sum();
        let total_paid = installments.iter().map(|i| i.cash_flow).sum();
        Self {
            installments,
            total_interest,
            total_paid,
        }
    }

    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    /// Per-period cash flows in period order
    pub fn cash_flows(&self) -> Vec<f64> {
        self.installments.iter().map(|i| i.cash_flow).collect()
    }

    /// Get summary statistics
    pub fn summary(&self) -> PlanSummary {
        let installment = self
            .installments
            .iter()
            .find(|i| i.phase == PeriodPhase::Amortizing)
            .map(|i| i.fee)
            .unwrap_or(0.0);

        PlanSummary {
            periods: self.installments.len() as u32,
            installment,
            total_interest: self.total_interest,
            total_fees: self.installments.iter().map(|i| i.fee).sum(),
            total_amortization: self.installments.iter().map(|i| i.amortization).sum(),
            total_balance_insurance: self.installments.iter().map(|i| i.balance_insurance).sum(),
            total_property_insurance: self.installments.iter().map(|i| i.property_insurance).sum(),
            total_paid: self.total_paid,
            final_balance: self.installments.last().map(|i| i.closing_balance).unwrap_or(0.0),
        }
    }
}

/// Summary statistics for a payment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub periods: u32,
    /// Constant installment paid during the amortizing phase
    pub installment: f64,
    pub total_interest: f64,
    pub total_fees: f64,
    pub total_amortization: f64,
    pub total_balance_insurance: f64,
    pub total_property_insurance: f64,
    pub total_paid: f64,
    pub final_balance: f64,
}
