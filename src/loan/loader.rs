//! Load loan applications from CSV

use super::LoanApplication;
use crate::rates::RateSpec;
use chrono::NaiveDate;
use csv::Reader;
use std::error::Error;
use std::path::Path;

/// Raw CSV row matching the loan batch columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "LoanID")]
    loan_id: u32,
    #[serde(rename = "LoanAmount")]
    loan_amount: f64,
    #[serde(rename = "DownPayment")]
    down_payment: f64,
    #[serde(rename = "Subsidy")]
    subsidy: Option<f64>,
    #[serde(rename = "PropertyValue")]
    property_value: f64,
    #[serde(rename = "Term")]
    term: u32,
    #[serde(rename = "TotalGrace")]
    total_grace: u32,
    #[serde(rename = "PartialGrace")]
    partial_grace: u32,
    #[serde(rename = "RateType")]
    rate_type: String,
    #[serde(rename = "Rate")]
    rate: f64,
    #[serde(rename = "Capitalization")]
    capitalization: Option<u32>,
    #[serde(rename = "BalanceInsurance")]
    balance_insurance: f64,
    #[serde(rename = "PropertyInsurance")]
    property_insurance: f64,
    #[serde(rename = "ActivationFee")]
    activation_fee: f64,
    #[serde(rename = "DiscountRate")]
    discount_rate: f64,
    #[serde(rename = "StartDate", default)]
    start_date: Option<NaiveDate>,
}

impl CsvRow {
    fn to_application(self) -> Result<LoanApplication, Box<dyn Error>> {
        let rate = match self.rate_type.trim().to_ascii_lowercase().as_str() {
            "tea" | "effective" => RateSpec::effective(self.rate),
            "tna" | "nominal" => {
                let frequency = self.capitalization.ok_or_else(|| {
                    format!("Loan {}: nominal rate requires Capitalization", self.loan_id)
                })?;
                RateSpec::nominal(self.rate, frequency)
            }
            other => return Err(format!("Unknown RateType: {}", other).into()),
        };

        Ok(LoanApplication {
            loan_id: self.loan_id,
            loan_amount: self.loan_amount,
            down_payment: self.down_payment,
            subsidy: self.subsidy,
            property_value: self.property_value,
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
}

/// Load all loan applications from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<LoanApplication>, Box<dyn Error>> {
    let reader = Reader::from_path(path)?;
    read_applications(reader)
}

/// Load loan applications from any reader (e.g., string buffer, stdin)
pub fn load_loans_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<LoanApplication>, Box<dyn Error>> {
    read_applications(Reader::from_reader(reader))
}

fn read_applications<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<LoanApplication>, Box<dyn Error>> {
    let mut loans = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        loans.push(row.to_application()?);
    }

    log::debug!("loaded {} loan applications", loans.len());
    Ok(loans)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "LoanID,LoanAmount,DownPayment,Subsidy,PropertyValue,Term,TotalGrace,PartialGrace,RateType,Rate,Capitalization,BalanceInsurance,PropertyInsurance,ActivationFee,DiscountRate,StartDate";

    #[test]
    fn test_load_loans_from_reader() {
        let data = format!(
            "{}\n\
             1,200000,40000,,200000,240,0,0,TEA,0.095,,0.0005,0.0003,250,0.10,2025-01-15\n\
             2,150000,30000,10000,150000,120,2,1,TNA,0.12,12,0.0005,0.0003,0,0.10,\n",
            HEADER
        );

        let loans = load_loans_from_reader(data.as_bytes()).unwrap();
        assert_eq!(loans.len(), 2);

        let first = &loans[0];
        assert_eq!(first.loan_id, 1);
        assert_eq!(first.rate, RateSpec::effective(0.095));
        assert_eq!(first.subsidy, None);
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2025, 1, 15));

        let second = &loans[1];
        assert_eq!(second.rate, RateSpec::nominal(0.12, 12));
        assert_eq!(second.subsidy, Some(10_000.0));
        assert_eq!(second.financed_amount(), 110_000.0);
        assert_eq!(second.start_date, None);
    }

    #[test]
    fn test_load_sample_loans() {
        let loans = load_loans("data/sample_loans.csv").expect("Failed to load sample loans");
        assert_eq!(loans.len(), 4);
        assert_eq!(loans[3].rate, RateSpec::nominal(0.12, 4));
        assert!(loans.iter().all(|l| l.into_terms().is_ok()));
    }

    #[test]
    fn test_unknown_rate_type() {
        let data = format!(
            "{}\n1,200000,40000,,200000,240,0,0,flat,0.095,,0,0,0,0.10,\n",
            HEADER
        );
        let err = load_loans_from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Unknown RateType"));
    }

    #[test]
    fn test_nominal_without_capitalization() {
        let data = format!(
            "{}\n7,200000,40000,,200000,240,0,0,TNA,0.095,,0,0,0,0.10,\n",
            HEADER
        );
        let err = load_loans_from_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("requires Capitalization"));
    }
}
