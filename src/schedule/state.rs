//! Running state threaded through the schedule fold

/// Balance carried from one period to the next
#[derive(Debug, Clone)]
pub struct AmortizationState {
    /// Last period emitted (0 before the first)
    pub period: u32,

    /// Outstanding balance at the end of the last period
    pub balance: f64,

    /// Constant installment, fixed when the amortizing phase begins
    pub installment: Option<f64>,
}

impl AmortizationState {
    /// Initialize state at disbursement
    pub fn new(net_principal: f64) -> Self {
        Self {
            period: 0,
            balance: net_principal,
            installment: None,
        }
    }

    /// Advance to next period, returning its opening balance
    pub fn advance_period(&mut self) -> f64 {
        self.period += 1;
        self.balance
    }

    /// Record the closing balance, floored at zero
    pub fn close_period(&mut self, balance: f64) -> f64 {
        self.balance = balance.max(0.0);
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_floors_balance() {
        let mut state = AmortizationState::new(100.0);
        assert_eq!(state.advance_period(), 100.0);
        assert_eq!(state.period, 1);
        assert_eq!(state.close_period(-1e-9), 0.0);
        assert_eq!(state.advance_period(), 0.0);
    }
}
