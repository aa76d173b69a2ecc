// Largest Banks ETL - Core Library
// Web table → currency conversion → CSV file + SQLite table

pub mod config;
pub mod error;
pub mod extract;
pub mod logger;
pub mod model;
pub mod pipeline;
pub mod rates;
pub mod sink;
pub mod transform;

// Re-export commonly used types
pub use config::{PipelineConfig, SinkFailurePolicy};
pub use error::{ErrorKind, EtlError, EtlResult};
pub use extract::{extract, parse_bank_table, parse_market_cap, HttpSource, PageSource};
pub use logger::{FileLogger, LogLevel, MemoryLogger, ProgressLog};
pub use model::{table_fingerprint, BankRecord, EnrichedBankRecord, COLUMNS};
pub use pipeline::{Pipeline, RunReport, Stage, StageFailure, StageOutcome};
pub use rates::{load_rates, Currency, ExchangeRateTable};
pub use sink::{
    close_database, open_database, read_csv, read_table, run_query, verification_queries,
    write_csv, write_table, QueryResult,
};
pub use transform::{enrich, round2, transform};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
