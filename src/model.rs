// 🏦 Data Model - Bank rows as they move through the pipeline
// BankRecord (extracted, USD only) → EnrichedBankRecord (four currencies)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One row of the source table: bank name + market cap in USD billions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MC_USD_Billion")]
    pub market_cap_usd: f64,
}

impl BankRecord {
    pub fn new(name: impl Into<String>, market_cap_usd: f64) -> Self {
        BankRecord {
            name: name.into(),
            market_cap_usd,
        }
    }
}

/// BankRecord plus the derived GBP/EUR/INR columns.
///
/// Field order here is the column order of both sinks:
/// `Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBankRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MC_USD_Billion")]
    pub market_cap_usd: f64,

    #[serde(rename = "MC_GBP_Billion")]
    pub market_cap_gbp: f64,

    #[serde(rename = "MC_EUR_Billion")]
    pub market_cap_eur: f64,

    #[serde(rename = "MC_INR_Billion")]
    pub market_cap_inr: f64,
}

/// Column names shared by the CSV header and the database table
pub const COLUMNS: [&str; 5] = [
    "Name",
    "MC_USD_Billion",
    "MC_GBP_Billion",
    "MC_EUR_Billion",
    "MC_INR_Billion",
];

/// SHA-256 over every row (name + values at 2 decimals), in order.
///
/// Two tables with the same fingerprint hold the same rows in the same order.
pub fn table_fingerprint(rows: &[EnrichedBankRecord]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(format!(
            "{}|{:.2}|{:.2}|{:.2}|{:.2}\n",
            row.name, row.market_cap_usd, row.market_cap_gbp, row.market_cap_eur, row.market_cap_inr
        ));
    }
    format!("{:x}", hasher.finalize())
}
