//! Payment schedule generation and insurance overlay

mod state;
mod generator;
mod installment;
mod insurance;

pub use state::AmortizationState;
pub use generator::{ScheduleGenerator, generate, constant_installment, assign_payment_dates};
pub use installment::{Installment, PaymentPlan, PlanSummary, PeriodPhase};
pub use insurance::apply_insurance;
