// 📄 CSV Sink
// Name,MC_USD_Billion,MC_GBP_Billion,MC_EUR_Billion,MC_INR_Billion

use crate::error::{EtlError, EtlResult};
use crate::model::EnrichedBankRecord;
use std::fs;
use std::path::Path;

/// Write the table to `path`, replacing any existing file.
/// Returns the number of data rows written.
pub fn write_csv<P: AsRef<Path>>(path: P, rows: &[EnrichedBankRecord]) -> EtlResult<usize> {
    let path = path.as_ref();
    let io_err = |e: &dyn std::fmt::Display| EtlError::Io(format!("{}: {}", path.display(), e));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err(&e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| io_err(&e))?;

    for row in rows {
        writer.serialize(row).map_err(|e| io_err(&e))?;
    }

    // An empty table still gets its header
    if rows.is_empty() {
        writer
            .write_record(crate::model::COLUMNS)
            .map_err(|e| io_err(&e))?;
    }

    writer.flush().map_err(|e| io_err(&e))?;

    Ok(rows.len())
}

/// Re-read a file produced by `write_csv`
pub fn read_csv<P: AsRef<Path>>(path: P) -> EtlResult<Vec<EnrichedBankRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| EtlError::Io(format!("failed to open {}: {}", path.display(), e)))?;

    reader
        .deserialize()
        .collect::<Result<Vec<EnrichedBankRecord>, _>>()
        .map_err(|e| EtlError::Io(format!("failed to read {}: {}", path.display(), e)))
}
