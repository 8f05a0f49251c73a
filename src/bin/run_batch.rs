//! Calculate payment plans for a whole CSV of loan applications
//!
//! Supports JSON output via --json flag
//! Accepts config via environment variables:
//!   LOANS_CSV, OUTPUT_CSV, TIR_MODE (best_effort | strict),
//!   TCEA_CONVENTION (total_cost_ratio | annualized)

use anyhow::{bail, Context, Result};
use loan_amortization::{
    loan::load_loans, EngineConfig, LoanCalculator, TceaConvention, TirMode, TirSettings,
};
use serde::Serialize;
use std::env;
use std::time::Instant;

/// One summary line per loan
#[derive(Serialize, Clone, Default)]
struct BatchRow {
    loan_id: u32,
    financed_amount: f64,
    periods: u32,
    installment: f64,
    total_interest: f64,
    total_paid: f64,
    tea: f64,
    tcea: f64,
    van: f64,
    tir: f64,
    tir_converged: bool,
    error: Option<String>,
}

#[derive(Serialize)]
struct BatchResponse {
    loan_count: usize,
    failed: usize,
    rows: Vec<BatchRow>,
    execution_time_ms: u64,
}

fn engine_config_from_env() -> Result<EngineConfig> {
    let mode = match env::var("TIR_MODE").ok().as_deref() {
        None | Some("best_effort") => TirMode::BestEffort,
        Some("strict") => TirMode::Strict,
        Some(other) => bail!("Unknown TIR_MODE: {}", other),
    };

    let tcea_convention = match env::var("TCEA_CONVENTION").ok().as_deref() {
        None | Some("total_cost_ratio") => TceaConvention::TotalCostRatio,
        Some("annualized") => TceaConvention::Annualized,
        Some(other) => bail!("Unknown TCEA_CONVENTION: {}", other),
    };

    Ok(EngineConfig {
        tir: TirSettings {
            mode,
            ..TirSettings::default()
        },
        tcea_convention,
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let json_output = env::args().any(|arg| arg == "--json");
    let start = Instant::now();

    let loans_path = env::var("LOANS_CSV").unwrap_or_else(|_| "data/sample_loans.csv".to_string());
    let output_path = env::var("OUTPUT_CSV").unwrap_or_else(|_| "batch_output.csv".to_string());
    let config = engine_config_from_env()?;

    let applications = load_loans(&loans_path)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Failed to load loans from {}", loans_path))?;
    log::info!("loaded {} loans from {}", applications.len(), loans_path);

    let calculator = LoanCalculator::with_config(config);
    let outcomes = calculator.run_batch(&applications);

    let rows: Vec<BatchRow> = applications
        .iter()
        .zip(&outcomes)
        .map(|(application, outcome)| match &outcome.result {
            Ok(calculation) => {
                let summary = calculation.plan.summary();
                BatchRow {
                    loan_id: outcome.loan_id,
                    financed_amount: application.financed_amount(),
                    periods: summary.periods,
                    installment: summary.installment,
                    total_interest: summary.total_interest,
                    total_paid: summary.total_paid,
                    tea: calculation.indicators.tea,
                    tcea: calculation.indicators.tcea,
                    van: calculation.indicators.van,
                    tir: calculation.indicators.tir,
                    tir_converged: calculation.indicators.tir_converged,
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("loan {} failed: {}", outcome.loan_id, e);
                BatchRow {
                    loan_id: outcome.loan_id,
                    financed_amount: application.financed_amount(),
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        })
        .collect();

    let failed = rows.iter().filter(|r| r.error.is_some()).count();

    if json_output {
        let response = BatchResponse {
            loan_count: rows.len(),
            failed,
            rows,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("Failed to create {}", output_path))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("Calculated {} loans ({} failed) in {:?}", rows.len(), failed, start.elapsed());
    println!("Output written to {}", output_path);
    Ok(())
}
