//! Loan data structures and batch loading

mod data;
pub mod loader;

pub use data::{LoanTerms, LoanApplication, DEFAULT_DISCOUNT_RATE};
pub use loader::{load_loans, load_loans_from_reader};
