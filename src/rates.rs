// 💱 Rate Provider - Currency code → exchange rate from a side file
// File format: header `Currency,Rate`, one row per currency

use crate::error::{EtlError, EtlResult};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// CURRENCY
// ============================================================================

/// Target currencies; USD is the source currency and has no rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Inr];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }

    pub fn from_code(code: &str) -> Option<Currency> {
        Currency::ALL.into_iter().find(|c| c.code() == code)
    }
}

// ============================================================================
// EXCHANGE RATE TABLE
// ============================================================================

/// USD → GBP/EUR/INR rates, all present and positive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRateTable {
    gbp: f64,
    eur: f64,
    inr: f64,
}

impl ExchangeRateTable {
    pub fn new(gbp: f64, eur: f64, inr: f64) -> EtlResult<Self> {
        for (currency, rate) in [(Currency::Gbp, gbp), (Currency::Eur, eur), (Currency::Inr, inr)] {
            check_rate(currency.code(), rate)?;
        }
        Ok(ExchangeRateTable { gbp, eur, inr })
    }

    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Gbp => self.gbp,
            Currency::Eur => self.eur,
            Currency::Inr => self.inr,
        }
    }
}

fn check_rate(code: &str, rate: f64) -> EtlResult<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(EtlError::Configuration(format!(
            "rate for {} must be a positive number, got {}",
            code, rate
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,

    #[serde(rename = "Rate")]
    rate: f64,
}

/// Load the rate file. Any missing, unknown or duplicate code and any
/// unreadable or non-positive rate fails the whole load; no defaults.
pub fn load_rates<P: AsRef<Path>>(path: P) -> EtlResult<ExchangeRateTable> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| {
            EtlError::Configuration(format!("failed to open rate file {}: {}", path.display(), e))
        })?;

    let mut rates: [Option<f64>; 3] = [None; 3];

    for (line_num, result) in reader.deserialize::<RateRow>().enumerate() {
        let row = result.map_err(|e| {
            EtlError::Configuration(format!(
                "invalid rate on line {} of {}: {}",
                line_num + 2,
                path.display(),
                e
            ))
        })?;

        let currency = Currency::from_code(&row.currency).ok_or_else(|| {
            EtlError::Configuration(format!(
                "unknown currency code {:?} in {}",
                row.currency,
                path.display()
            ))
        })?;

        check_rate(currency.code(), row.rate)?;

        let slot = &mut rates[currency as usize];
        if slot.is_some() {
            return Err(EtlError::Configuration(format!(
                "currency {} listed twice in {}",
                currency.code(),
                path.display()
            )));
        }
        *slot = Some(row.rate);
    }

    let get = |currency: Currency| {
        rates[currency as usize].ok_or_else(|| {
            EtlError::Configuration(format!(
                "rate file {} has no rate for {}",
                path.display(),
                currency.code()
            ))
        })
    };

    ExchangeRateTable::new(get(Currency::Gbp)?, get(Currency::Eur)?, get(Currency::Inr)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_rates(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_load_rates() {
        let file = write_rates("Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n");

        let rates = load_rates(file.path()).unwrap();

        assert_eq!(rates.rate(Currency::Gbp), 0.8);
        assert_eq!(rates.rate(Currency::Eur), 0.93);
        assert_eq!(rates.rate(Currency::Inr), 82.95);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let file = write_rates("Currency, Rate\n GBP , 0.8\nEUR,0.93\nINR,82.95\n");
        assert!(load_rates(file.path()).is_ok());
    }

    #[test]
    fn test_missing_inr_is_configuration_error() {
        let file = write_rates("Currency,Rate\nEUR,0.93\nGBP,0.8\n");

        let err = load_rates(file.path()).unwrap_err();

        assert!(matches!(err, EtlError::Configuration(_)));
        assert!(err.to_string().contains("INR"));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = load_rates("/nonexistent/exchange_rate.csv").unwrap_err();
        assert!(matches!(err, EtlError::Configuration(_)));
    }

    #[test]
    fn test_unreadable_rate_is_configuration_error() {
        let file = write_rates("Currency,Rate\nEUR,abc\nGBP,0.8\nINR,82.95\n");
        assert!(matches!(load_rates(file.path()), Err(EtlError::Configuration(_))));
    }

    #[test]
    fn test_non_positive_rate_is_configuration_error() {
        let file = write_rates("Currency,Rate\nEUR,0\nGBP,0.8\nINR,82.95\n");
        assert!(matches!(load_rates(file.path()), Err(EtlError::Configuration(_))));
    }

    #[test]
    fn test_unknown_and_duplicate_codes_rejected() {
        let unknown = write_rates("Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\nJPY,147.1\n");
        assert!(matches!(load_rates(unknown.path()), Err(EtlError::Configuration(_))));

        let duplicate = write_rates("Currency,Rate\nEUR,0.93\nGBP,0.8\nGBP,0.81\nINR,82.95\n");
        assert!(matches!(load_rates(duplicate.path()), Err(EtlError::Configuration(_))));
    }

    #[test]
    fn test_new_rejects_invalid_rates() {
        assert!(ExchangeRateTable::new(0.8, 0.93, 82.95).is_ok());
        assert!(ExchangeRateTable::new(-0.8, 0.93, 82.95).is_err());
        assert!(ExchangeRateTable::new(0.8, f64::NAN, 82.95).is_err());
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::from_code("GBP"), Some(Currency::Gbp));
        assert_eq!(Currency::from_code("gbp"), None);
        assert_eq!(Currency::Inr.code(), "INR");
    }
}
