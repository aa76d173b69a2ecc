// 🌐 Extractor - HTML page → BankRecord rows
// Fetches the source page and parses the first matching wikitable

use crate::error::{EtlError, EtlResult};
use crate::model::BankRecord;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

// ============================================================================
// PAGE SOURCE
// ============================================================================

/// PageSource - Retrieval transport for the source document
///
/// The pipeline only needs the HTML body; how it is fetched is up to the
/// implementation (HTTP in production, fixtures in tests).
pub trait PageSource {
    fn fetch(&self, url: &str) -> EtlResult<String>;
}

/// Blocking HTTP(S) GET, one attempt, no retry
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> EtlResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| EtlError::SourceUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpSource { client })
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &str) -> EtlResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| EtlError::SourceUnavailable(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::SourceUnavailable(format!(
                "GET {} returned HTTP {}",
                url, status
            )));
        }

        response
            .text()
            .map_err(|e| EtlError::SourceUnavailable(format!("failed to read body of {}: {}", url, e)))
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Fetch `url` and parse its bank table
pub fn extract(
    source: &dyn PageSource,
    url: &str,
    table_attributes: &[String],
) -> EtlResult<Vec<BankRecord>> {
    let html = source.fetch(url)?;
    parse_bank_table(&html, table_attributes)
}

/// Parse the first `table.wikitable` shaped like (rank, name, market cap, ...)
///
/// Rows whose market cap does not parse to a positive number are skipped.
/// Rows are returned in document order; duplicates are kept.
pub fn parse_bank_table(html: &str, table_attributes: &[String]) -> EtlResult<Vec<BankRecord>> {
    if table_attributes.len() != 2 {
        return Err(EtlError::SchemaMismatch(format!(
            "expected 2 table attributes (name, market cap), got {:?}",
            table_attributes
        )));
    }

    let document = Html::parse_document(html);
    let table_selector = selector("table.wikitable")?;
    let row_selector = selector("tr")?;

    // Rank column + one column per attribute
    let min_columns = table_attributes.len() + 1;

    let table = document
        .select(&table_selector)
        .find(|table| {
            table
                .select(&row_selector)
                .next()
                .map(|header| row_cells(header).len() >= min_columns)
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            EtlError::SchemaMismatch(format!(
                "no wikitable with at least {} columns found",
                min_columns
            ))
        })?;

    let mut records = Vec::new();

    // Skip header row
    for row in table.select(&row_selector).skip(1) {
        let cells = row_cells(row);
        if cells.len() < min_columns {
            continue;
        }

        let name = cell_text(cells[1]).trim().to_string();
        let Some(market_cap) = parse_market_cap(&cell_text(cells[2])) else {
            continue;
        };

        records.push(BankRecord::new(name, market_cap));
    }

    if records.is_empty() {
        return Err(EtlError::SchemaMismatch(
            "table found but no row had a valid market cap".to_string(),
        ));
    }

    Ok(records)
}

/// Strip footnote markers and thousands separators, then parse what is left
/// as one positive decimal token.
///
/// `"432.92\n"` → 432.92, `"1,234.5[a]"` → 1234.5, `"n/a"` → None,
/// `"-12.5"` → None, `"432.92 (2023)"` → None
pub fn parse_market_cap(raw: &str) -> Option<f64> {
    let mut cleaned = String::with_capacity(raw.len());
    let mut in_footnote = false;

    for c in raw.chars() {
        match c {
            '[' => in_footnote = true,
            ']' => in_footnote = false,
            _ if in_footnote => {}
            ',' => {}
            c => cleaned.push(c),
        }
    }

    let token = cleaned.trim();
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    token.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn selector(css: &str) -> EtlResult<Selector> {
    Selector::parse(css).map_err(|e| EtlError::SchemaMismatch(format!("invalid selector {:?}: {:?}", css, e)))
}

/// Direct `td`/`th` children of a row
fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .collect()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>()
}
