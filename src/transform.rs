// 🔄 Transformer - USD market caps → GBP / EUR / INR
// Pure: no I/O, inputs are only borrowed

use crate::model::{BankRecord, EnrichedBankRecord};
use crate::rates::{Currency, ExchangeRateTable};

/// Round to 2 decimal places, half away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn enrich(record: &BankRecord, rates: &ExchangeRateTable) -> EnrichedBankRecord {
    let convert = |currency: Currency| round2(record.market_cap_usd * rates.rate(currency));

    EnrichedBankRecord {
        name: record.name.clone(),
        market_cap_usd: round2(record.market_cap_usd),
        market_cap_gbp: convert(Currency::Gbp),
        market_cap_eur: convert(Currency::Eur),
        market_cap_inr: convert(Currency::Inr),
    }
}

/// Enrich every record, keeping extraction order.
///
/// Every output value is rounded to 2 decimals; the derived columns are
/// computed from the unrounded USD value.
pub fn transform(records: &[BankRecord], rates: &ExchangeRateTable) -> Vec<EnrichedBankRecord> {
    records.iter().map(|record| enrich(record, rates)).collect()
}
