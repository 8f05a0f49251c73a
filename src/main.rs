//! Loan Amortization CLI
//!
//! Builds the payment plan for a single loan and prints its indicators

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use loan_amortization::{
    indicators::net_present_value,
    EngineConfig, LoanApplication, LoanCalculator, LoanError, PaymentPlan, RateSpec,
    TceaConvention, TirMode, TirSettings,
};

/// French-method loan schedule with TEA, TCEA, VAN and TIR
#[derive(Parser, Debug)]
#[command(name = "loan_amortization", version, about)]
struct Cli {
    /// Requested loan amount (usually the property price)
    #[arg(long)]
    loan_amount: f64,

    /// Down payment paid up front
    #[arg(long, default_value_t = 0.0)]
    down_payment: f64,

    /// Housing subsidy bonus deducted from the financed amount
    #[arg(long)]
    subsidy: Option<f64>,

    /// Property value for insurance (defaults to the loan amount)
    #[arg(long)]
    property_value: Option<f64>,

    /// Term in months
    #[arg(long)]
    term: u32,

    /// Full-grace months (interest capitalizes)
    #[arg(long, default_value_t = 0)]
    total_grace: u32,

    /// Partial-grace months (interest only)
    #[arg(long, default_value_t = 0)]
    partial_grace: u32,

    /// Effective annual rate as a decimal (e.g., 0.10)
    #[arg(long, conflicts_with = "tna", required_unless_present = "tna")]
    tea: Option<f64>,

    /// Nominal annual rate as a decimal
    #[arg(long)]
    tna: Option<f64>,

    /// Capitalizations per year for --tna
    #[arg(long, default_value_t = 12)]
    capitalization: u32,

    /// Monthly insurance rate on the outstanding balance
    #[arg(long, default_value_t = 0.0)]
    balance_insurance: f64,

    /// Monthly insurance rate on the property value
    #[arg(long, default_value_t = 0.0)]
    property_insurance: f64,

    /// One-time activation fee
    #[arg(long, default_value_t = 0.0)]
    activation_fee: f64,

    /// Nominal annual discount rate for VAN
    #[arg(long, default_value_t = loan_amortization::loan::DEFAULT_DISCOUNT_RATE)]
    discount_rate: f64,

    /// Disbursement date (YYYY-MM-DD) used to date each installment
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Fail instead of returning a best-effort TIR
    #[arg(long)]
    strict_tir: bool,

    /// Annualize TCEA over the term instead of the plain total-cost ratio
    #[arg(long)]
    annualized_tcea: bool,

    /// Write the full schedule to this CSV file
    #[arg(long)]
    csv: Option<String>,

    /// Print the calculation as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn rate(&self) -> Result<RateSpec> {
        match (self.tea, self.tna) {
            (Some(tea), None) => Ok(RateSpec::effective(tea)),
            (None, Some(tna)) => Ok(RateSpec::nominal(tna, self.capitalization)),
            (Some(_), Some(_)) => bail!("--tea and --tna are mutually exclusive"),
            (None, None) => bail!("one of --tea or --tna is required"),
        }
    }

    fn application(&self) -> Result<LoanApplication> {
        let rate = self.rate()?;

        Ok(LoanApplication {
            loan_id: 0,
            loan_amount: self.loan_amount,
            down_payment: self.down_payment,
            subsidy: self.subsidy,
            property_value: self.property_value.unwrap_or(self.loan_amount),
            term: self.term,
            total_grace: self.total_grace,
            partial_grace: self.partial_grace,
            rate,
            balance_insurance_rate: self.balance_insurance,
            property_insurance_rate: self.property_insurance,
            activation_fee: self.activation_fee,
            discount_rate: self.discount_rate,
            start_date: self.start_date,
        })
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            tir: TirSettings {
                mode: if self.strict_tir { TirMode::Strict } else { TirMode::BestEffort },
                ..TirSettings::default()
            },
            tcea_convention: if self.annualized_tcea {
                TceaConvention::Annualized
            } else {
                TceaConvention::TotalCostRatio
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let application = cli.application()?;
    let terms = application.into_terms().context("invalid loan terms")?;
    let calculator = LoanCalculator::with_config(cli.engine_config());

    match calculator.calculate(&terms) {
        Ok(calculation) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&calculation)?);
            } else {
                println!("Loan Amortization v{}", env!("CARGO_PKG_VERSION"));
                println!("======================\n");
                println!("  Financed amount: {:.2}", application.financed_amount());
                println!("  Down payment:    {:.2} ({:.2}%)", application.down_payment, application.down_payment_percentage() * 100.0);
                println!("  Monthly rate:    {:.6}%", calculation.periodic_rate * 100.0);
                println!();
                print_plan(&calculation.plan);

                let pct = calculation.indicators.as_percentages();
                println!("\nIndicators:");
                println!("  TEA:  {:.4}%", pct.tea);
                println!("  TREA: {:.4}%", pct.trea);
                println!("  TCEA: {:.4}%", pct.tcea);
                println!("  VAN:  {:.2}", pct.van);
                if pct.tir_converged {
                    println!("  TIR:  {:.4}%", pct.tir);
                } else {
                    println!("  TIR:  {:.4}% (did not converge)", pct.tir);
                }
            }
            if let Some(path) = &cli.csv {
                write_csv(path, &calculation.plan)?;
            }
        }
        Err(LoanError::TirNonConvergent { iterations, last_rate }) => {
            // Report the schedule and VAN, which do not depend on TIR
            log::warn!("TIR failed after {} iterations (last rate {})", iterations, last_rate);
            let (_, plan) = calculator.payment_plan(&terms)?;
            let van = net_present_value(terms.principal, &plan.installments, terms.discount_rate)?;

            if cli.json {
                println!("{}", serde_json::json!({ "plan": plan, "van": van, "tir": null }));
            } else {
                print_plan(&plan);
                println!("\n  VAN:  {:.2}", van);
                println!("  TIR:  not available");
            }
            if let Some(path) = &cli.csv {
                write_csv(path, &plan)?;
            }
        }
        Err(e) => return Err(e).context("loan calculation failed"),
    }

    Ok(())
}

fn print_plan(plan: &PaymentPlan) {
    println!(
        "{:>6} {:>12} {:>14} {:>12} {:>12} {:>12} {:>14} {:>10} {:>10} {:>12}",
        "Period", "Date", "Opening", "Fee", "Interest", "Amort", "Closing", "BalIns", "PropIns", "CashFlow"
    );
    println!("{}", "-".repeat(128));

    for row in &plan.installments {
        let date = row
            .payment_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6} {:>12} {:>14.2} {:>12.2} {:>12.2} {:>12.2} {:>14.2} {:>10.2} {:>10.2} {:>12.2}",
            row.period,
            date,
            row.opening_balance,
            row.fee,
            row.interest,
            row.amortization,
            row.closing_balance,
            row.balance_insurance,
            row.property_insurance,
            row.cash_flow,
        );
    }

    let summary = plan.summary();
    println!("\nSummary:");
    println!("  Periods:            {}", summary.periods);
    println!("  Installment:        {:.2}", summary.installment);
    println!("  Total interest:     {:.2}", summary.total_interest);
    println!("  Total insurance:    {:.2}", summary.total_balance_insurance + summary.total_property_insurance);
    println!("  Total paid:         {:.2}", summary.total_paid);
    println!("  Final balance:      {:.2}", summary.final_balance);
}

fn write_csv(path: &str, plan: &PaymentPlan) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("unable to create {}", path))?;
    for row in &plan.installments {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("\nFull schedule written to: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_tea_or_tna() {
        let cli = Cli::parse_from(["loan_amortization", "--loan-amount", "1000", "--term", "12", "--tea", "0.1"]);
        assert_eq!(cli.rate().unwrap(), RateSpec::effective(0.1));

        let cli = Cli::parse_from([
            "loan_amortization", "--loan-amount", "1000", "--term", "12", "--tna", "0.12", "--capitalization", "4",
        ]);
        assert_eq!(cli.application().unwrap().rate, RateSpec::nominal(0.12, 4));
    }

    #[test]
    fn test_missing_rate_is_an_error() {
        let mut cli = Cli::parse_from(["loan_amortization", "--loan-amount", "1000", "--term", "12", "--tea", "0.1"]);
        cli.tea = None;
        let err = cli.application().unwrap_err();
        assert!(err.to_string().contains("--tea or --tna"));

        assert!(Cli::try_parse_from(["loan_amortization", "--loan-amount", "1000", "--term", "12"]).is_err());
    }
}
