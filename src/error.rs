// 🚨 Error Taxonomy
// Every failure the pipeline can report, one variant per kind

use thiserror::Error;

// ============================================================================
// ERROR KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceUnavailable,
    SchemaMismatch,
    Configuration,
    Io,
    Storage,
}

impl ErrorKind {
    /// Name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::SourceUnavailable => "SourceUnavailable",
            ErrorKind::SchemaMismatch => "SchemaMismatch",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Io => "IOError",
            ErrorKind::Storage => "StorageError",
        }
    }
}

// ============================================================================
// ETL ERROR
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum EtlError {
    /// Page fetch failed (network, HTTP status, body decoding)
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Expected table or columns not found on the page
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Rate file or pipeline configuration missing/invalid
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Output file could not be written
    #[error("I/O error: {0}")]
    Io(String),

    /// Database write or query failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            EtlError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            EtlError::Configuration(_) => ErrorKind::Configuration,
            EtlError::Io(_) => ErrorKind::Io,
            EtlError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(err: rusqlite::Error) -> Self {
        EtlError::Storage(err.to_string())
    }
}

pub type EtlResult<T> = std::result::Result<T, EtlError>;
