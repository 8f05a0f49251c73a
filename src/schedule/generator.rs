//! French-method schedule generation with total and partial grace

use chrono::{Months, NaiveDate};

use super::installment::{Installment, PeriodPhase};
use super::state::AmortizationState;
use crate::error::{ensure_rate, LoanError, LoanResult};

/// Constant installment that amortizes `balance` over `periods` at `rate`
///
/// Uses the discount form `r / (1 - (1+r)^-n)`, which stays finite when
/// `(1+r)^n` overflows. Falls back to straight-line amortization when the
/// rate is zero or too small to move `(1+r)^n` off 1.
pub fn constant_installment(balance: f64, rate: f64, periods: u32) -> f64 {
    let n = periods as f64;
    let straight_line = balance / n;
    if rate == 0.0 {
        return straight_line;
    }

    // 1 - (1+r)^-n without cancellation for tiny r
    let discount = -(-n * rate.ln_1p()).exp_m1();
    if !discount.is_finite() || discount <= 0.0 {
        return straight_line;
    }

    let fee = balance * rate / discount;
    if fee.is_finite() {
        fee
    } else {
        straight_line
    }
}

/// Schedule generator for one loan's grace layout
#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    periodic_rate: f64,
    term: u32,
    total_grace: u32,
    partial_grace: u32,
}

impl ScheduleGenerator {
    pub fn new(periodic_rate: f64, term: u32, total_grace: u32, partial_grace: u32) -> LoanResult<Self> {
        ensure_rate(periodic_rate, "periodic rate")?;
        if term < 1 {
            return Err(LoanError::InvalidScheduleConfiguration(
                "term must be at least one period".to_string(),
            ));
        }
        if total_grace as u64 + partial_grace as u64 >= term as u64 {
            return Err(LoanError::InvalidScheduleConfiguration(format!(
                "no amortizing periods left: term {} with {} total and {} partial grace periods",
                term, total_grace, partial_grace
            )));
        }

        Ok(Self {
            periodic_rate,
            term,
            total_grace,
            partial_grace,
        })
    }

    /// Count of periods paying the constant installment
    pub fn amortizing_periods(&self) -> u32 {
        self.term - self.total_grace - self.partial_grace
    }

    /// Grace policy applying to a 1-based period
    pub fn phase(&self, period: u32) -> PeriodPhase {
        if period <= self.total_grace {
            PeriodPhase::TotalGrace
        } else if period <= self.total_grace + self.partial_grace {
            PeriodPhase::PartialGrace
        } else {
            PeriodPhase::Amortizing
        }
    }

    /// Generate the full schedule for `net_principal`
    pub fn generate(&self, net_principal: f64) -> LoanResult<Vec<Installment>> {
        if !net_principal.is_finite() || net_principal <= 0.0 {
            return Err(LoanError::InvalidScheduleConfiguration(format!(
                "principal must be positive, got {}",
                net_principal
            )));
        }

        let mut state = AmortizationState::new(net_principal);
        let mut installments = Vec::with_capacity(self.term as usize);

        for _period in 1..=self.term {
            let installment = self.calculate_period(&mut state);
            installments.push(installment);
        }

        log::debug!(
            "generated {} periods ({} total grace, {} partial grace), installment {:.2}",
            installments.len(),
            self.total_grace,
            self.partial_grace,
            state.installment.unwrap_or(0.0)
        );

        Ok(installments)
    }

    /// Calculate a single period and fold its closing balance into `state`
    fn calculate_period(&self, state: &mut AmortizationState) -> Installment {
        let opening = state.advance_period();
        let phase = self.phase(state.period);
        let interest = opening * self.periodic_rate;

        let (fee, amortization, balance) = match phase {
            PeriodPhase::TotalGrace => (0.0, 0.0, opening + interest),
            PeriodPhase::PartialGrace => (interest, 0.0, opening),
            PeriodPhase::Amortizing => {
                // Fixed once, on the balance left after grace capitalization
                let fee = *state.installment.get_or_insert_with(|| {
                    constant_installment(opening, self.periodic_rate, self.amortizing_periods())
                });
                let amortization = fee - interest;
                (fee, amortization, opening - amortization)
            }
        };

        let closing = state.close_period(balance);
        Installment::new(state.period, phase, opening, fee, interest, amortization, closing)
    }
}

/// Generate a French-method schedule
pub fn generate(
    net_principal: f64,
    periodic_rate: f64,
    term: u32,
    total_grace: u32,
    partial_grace: u32,
) -> LoanResult<Vec<Installment>> {
    ScheduleGenerator::new(periodic_rate, term, total_grace, partial_grace)?.generate(net_principal)
}

/// Stamp due dates: installment `i` falls `i` calendar months after `start_date`
pub fn assign_payment_dates(installments: Vec<Installment>, start_date: NaiveDate) -> Vec<Installment> {
    installments
        .into_iter()
        .map(|mut installment| {
            installment.payment_date = start_date.checked_add_months(Months::new(installment.period));
            installment
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::annual_to_periodic;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_french_annuity_nominal_ten_percent() {
        let schedule = generate(100_000.0, 0.10 / 12.0, 12, 0, 0).unwrap();
        assert_eq!(schedule.len(), 12);

        for installment in &schedule {
            assert_abs_diff_eq!(installment.fee, 8791.59, epsilon = 0.01);
        }
        let total: f64 = schedule.iter().map(|i| i.fee).sum();
        assert_abs_diff_eq!(total, 105_499.06, epsilon = 0.01);
        assert!(schedule.last().unwrap().closing_balance <= 1e-6);
    }

    #[test]
    fn test_french_annuity_effective_ten_percent() {
        let r = annual_to_periodic(0.10);
        let schedule = generate(100_000.0, r, 12, 0, 0).unwrap();

        assert_abs_diff_eq!(schedule[0].fee, 8771.55, epsilon = 0.01);
        assert_abs_diff_eq!(schedule[0].interest, 797.41, epsilon = 0.01);
        assert!(schedule.last().unwrap().closing_balance <= 1e-6);
    }

    #[test]
    fn test_periods_contiguous() {
        let schedule = generate(50_000.0, 0.01, 36, 3, 2).unwrap();
        let periods: Vec<u32> = schedule.iter().map(|i| i.period).collect();
        assert_eq!(periods, (1..=36).collect::<Vec<_>>());
    }

    #[test]
    fn test_opening_matches_prior_closing() {
        let schedule = generate(50_000.0, 0.01, 24, 2, 2).unwrap();
        assert_eq!(schedule[0].opening_balance, 50_000.0);
        for pair in schedule.windows(2) {
            assert_eq!(pair[1].opening_balance, pair[0].closing_balance);
        }
        for installment in &schedule {
            let expected = installment.opening_balance - installment.amortization
                + installment.capitalized_interest();
            assert_relative_eq!(installment.closing_balance, expected.max(0.0), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_total_grace_capitalizes() {
        let schedule = generate(100_000.0, annual_to_periodic(0.10), 12, 2, 0).unwrap();

        for installment in &schedule[..2] {
            assert_eq!(installment.phase, PeriodPhase::TotalGrace);
            assert_eq!(installment.fee, 0.0);
            assert_eq!(installment.amortization, 0.0);
        }
        assert!(schedule[1].closing_balance > 100_000.0);
        assert!(schedule[1].closing_balance > schedule[0].closing_balance);
        assert!(schedule.last().unwrap().closing_balance <= 1e-6);
    }

    #[test]
    fn test_partial_grace_pays_interest_only() {
        let r = 0.01;
        let schedule = generate(10_000.0, r, 12, 0, 3).unwrap();

        for installment in &schedule[..3] {
            assert_eq!(installment.phase, PeriodPhase::PartialGrace);
            assert_relative_eq!(installment.fee, 100.0, epsilon = 1e-9);
            assert_eq!(installment.amortization, 0.0);
            assert_eq!(installment.closing_balance, 10_000.0);
        }
        assert_abs_diff_eq!(schedule[3].fee, constant_installment(10_000.0, r, 9), epsilon = 1e-9);
    }

    #[test]
    fn test_amortization_sums_to_capitalized_principal() {
        let schedule = generate(80_000.0, 0.009, 60, 4, 2).unwrap();
        let start_balance = schedule
            .iter()
            .find(|i| i.phase == PeriodPhase::Amortizing)
            .map(|i| i.opening_balance)
            .unwrap();
        let amortized: f64 = schedule
            .iter()
            .filter(|i| i.phase == PeriodPhase::Amortizing)
            .map(|i| i.amortization)
            .sum();

        assert_relative_eq!(amortized, start_balance, max_relative = 1e-6);
        assert!(schedule.last().unwrap().closing_balance <= 1e-6);
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let schedule = generate(1_200.0, 0.0, 12, 0, 0).unwrap();
        for installment in &schedule {
            assert_eq!(installment.fee, 100.0);
            assert_eq!(installment.interest, 0.0);
        }
        assert_abs_diff_eq!(schedule.last().unwrap().closing_balance, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tiny_rate_matches_straight_line() {
        let schedule = generate(100_000.0, 1e-17, 12, 0, 0).unwrap();
        for installment in &schedule {
            assert!(installment.fee.is_finite());
            assert_abs_diff_eq!(installment.fee, 100_000.0 / 12.0, epsilon = 1e-6);
        }
        assert!(schedule.last().unwrap().closing_balance <= 1e-6);
    }

    #[test]
    fn test_overflowing_growth_stays_finite() {
        // (1 + 1000)^200 overflows f64
        assert!(1001.0_f64.powi(200).is_infinite());

        let fee = constant_installment(100_000.0, 1_000.0, 200);
        assert!(fee.is_finite());
        assert_relative_eq!(fee, 100_000.0 * 1_000.0, max_relative = 1e-9);

        let schedule = generate(100_000.0, 1_000.0, 200, 0, 0).unwrap();
        assert!(schedule
            .iter()
            .all(|i| i.fee.is_finite() && i.closing_balance.is_finite()));
    }

    #[test]
    fn test_grace_consumes_term() {
        assert!(matches!(
            generate(10_000.0, 0.01, 12, 10, 2),
            Err(LoanError::InvalidScheduleConfiguration(_))
        ));
        assert!(matches!(
            generate(10_000.0, 0.01, 0, 0, 0),
            Err(LoanError::InvalidScheduleConfiguration(_))
        ));
        assert!(matches!(
            generate(-1.0, 0.01, 12, 0, 0),
            Err(LoanError::InvalidScheduleConfiguration(_))
        ));
        assert!(matches!(generate(10_000.0, -0.01, 12, 0, 0), Err(LoanError::InvalidRate { .. })));
    }

    #[test]
    fn test_payment_dates_clamp_month_end() {
        let schedule = generate(1_000.0, 0.01, 3, 0, 0).unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let dated = assign_payment_dates(schedule, start);

        assert_eq!(dated[0].payment_date, NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(dated[1].payment_date, NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(dated[2].payment_date, NaiveDate::from_ymd_opt(2025, 4, 30));
    }
}
