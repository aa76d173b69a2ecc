// ⚙️ Pipeline Configuration
// Every knob of a run lives here; passed explicitly to the driver

use crate::error::{EtlError, EtlResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Archived "List of largest banks" page (2023-09-08 snapshot)
pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

pub const DEFAULT_TABLE_NAME: &str = "Largest_banks";

/// chrono format for log line timestamps, e.g. `2024-Mar-05-14:02:11`
pub const DEFAULT_LOG_TIMESTAMP_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

// ============================================================================
// SINK FAILURE POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkFailurePolicy {
    /// A failed sink is logged; the other sink is still attempted
    #[default]
    Continue,

    /// A failed CSV sink ends the run before the database sink
    Abort,
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_url: String,

    /// Column labels of the extracted table: entity name, USD market cap
    pub table_attributes: Vec<String>,

    pub rates_path: PathBuf,
    pub csv_output_path: PathBuf,
    pub db_path: PathBuf,
    pub db_table_name: String,

    pub log_path: PathBuf,
    pub log_timestamp_format: String,

    pub request_timeout_secs: u64,
    pub sink_failure_policy: SinkFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            table_attributes: vec!["Name".to_string(), "MC_USD_Billion".to_string()],
            rates_path: PathBuf::from("./data/exchange_rate.csv"),
            csv_output_path: PathBuf::from("./data/Largest_banks_data.csv"),
            db_path: PathBuf::from("Banks.db"),
            db_table_name: DEFAULT_TABLE_NAME.to_string(),
            log_path: PathBuf::from("code_log.txt"),
            log_timestamp_format: DEFAULT_LOG_TIMESTAMP_FORMAT.to_string(),
            request_timeout_secs: 30,
            sink_failure_policy: SinkFailurePolicy::Continue,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; keys left out keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> EtlResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Configuration(format!("failed to read config file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            EtlError::Configuration(format!("failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Reject configurations no stage could run with
    pub fn validate(&self) -> EtlResult<()> {
        if self.source_url.trim().is_empty() {
            return Err(EtlError::Configuration("source_url is empty".to_string()));
        }

        if self.table_attributes.len() != 2 {
            return Err(EtlError::Configuration(format!(
                "table_attributes must name exactly 2 columns, got {}",
                self.table_attributes.len()
            )));
        }

        for (field, path) in [
            ("rates_path", &self.rates_path),
            ("csv_output_path", &self.csv_output_path),
            ("db_path", &self.db_path),
            ("log_path", &self.log_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(EtlError::Configuration(format!("{} is empty", field)));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(EtlError::Configuration(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }

        if !is_sql_identifier(&self.db_table_name) {
            return Err(EtlError::Configuration(format!(
                "db_table_name {:?} is not a plain SQL identifier",
                self.db_table_name
            )));
        }

        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
