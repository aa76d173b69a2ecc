// 🚀 Pipeline Driver
// configure → extract → load_rates → transform → csv_sink + database_sink
//
// Configuration, extraction, rate and transform failures abort the run.
// The two sinks fail independently unless the policy says abort.

use crate::config::{PipelineConfig, SinkFailurePolicy};
use crate::error::{EtlError, EtlResult};
use crate::extract::{extract, PageSource};
use crate::logger::ProgressLog;
use crate::model::{table_fingerprint, EnrichedBankRecord};
use crate::rates::{load_rates, Currency};
use crate::sink::{
    close_database, open_database, read_table, run_query, verification_queries, write_csv,
    write_table, QueryResult,
};
use crate::transform::transform;
use rusqlite::Connection;
use uuid::Uuid;

// ============================================================================
// STAGES & OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Extract,
    LoadRates,
    Transform,
    CsvSink,
    DatabaseSink,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::Extract => "extract",
            Stage::LoadRates => "load_rates",
            Stage::Transform => "transform",
            Stage::CsvSink => "csv_sink",
            Stage::DatabaseSink => "database_sink",
        }
    }
}

#[derive(Debug, Clone)]
pub enum StageOutcome {
    Succeeded,
    Failed(EtlError),
    /// Never attempted (earlier fatal failure or abort policy)
    Skipped,
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

/// The failure that stopped a run
#[derive(Debug, Clone)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: EtlError,
}

// ============================================================================
// RUN REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Rows handed to the sinks
    pub records: usize,
    pub fatal: Option<StageFailure>,
    pub csv: StageOutcome,
    pub database: StageOutcome,
    /// Verification queries and their results, in execution order
    pub verification: Vec<(String, QueryResult)>,
}

impl RunReport {
    fn new(run_id: Uuid) -> Self {
        RunReport {
            run_id,
            records: 0,
            fatal: None,
            csv: StageOutcome::Skipped,
            database: StageOutcome::Skipped,
            verification: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }

    /// 0 = full success, 1 = fatal failure or both sinks failed,
    /// 2 = exactly one sink failed
    pub fn exit_code(&self) -> i32 {
        if self.fatal.is_some() {
            return 1;
        }
        match (self.csv.is_failed(), self.database.is_failed()) {
            (true, true) => 1,
            (true, false) | (false, true) => 2,
            (false, false) => 0,
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    source: &'a dyn PageSource,
    log: &'a dyn ProgressLog,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, source: &'a dyn PageSource, log: &'a dyn ProgressLog) -> Self {
        Pipeline { config, source, log }
    }

    /// Run every stage once. Never panics on stage errors; the outcome of
    /// each stage is in the returned report.
    pub fn run(&self) -> RunReport {
        let mut report = RunReport::new(Uuid::new_v4());
        self.log.info(&format!("ETL run {} started", report.run_id));

        if let Err(failure) = self.run_stages(&mut report) {
            report.fatal = Some(failure);
        }

        if report.is_success() {
            self.log.info(&format!("ETL run {} completed successfully", report.run_id));
        } else {
            self.log.error(&format!(
                "ETL run {} finished with failures (exit code {})",
                report.run_id,
                report.exit_code()
            ));
        }

        report
    }

    fn run_stages(&self, report: &mut RunReport) -> Result<(), StageFailure> {
        self.begin(Stage::Configure);
        self.fatal(Stage::Configure, self.config.validate())?;
        self.complete(Stage::Configure, &format!("source {}", self.config.source_url));

        self.begin(Stage::Extract);
        let records = self.fatal(
            Stage::Extract,
            extract(self.source, &self.config.source_url, &self.config.table_attributes),
        )?;
        self.complete(Stage::Extract, &format!("{} banks extracted", records.len()));

        self.begin(Stage::LoadRates);
        let rates = self.fatal(Stage::LoadRates, load_rates(&self.config.rates_path))?;
        let summary: Vec<String> = Currency::ALL
            .iter()
            .map(|c| format!("{}={}", c.code(), rates.rate(*c)))
            .collect();
        self.complete(Stage::LoadRates, &summary.join(", "));

        self.begin(Stage::Transform);
        let rows = transform(&records, &rates);
        let fingerprint = table_fingerprint(&rows);
        report.records = rows.len();
        self.complete(
            Stage::Transform,
            &format!("{} rows enriched, fingerprint {}", rows.len(), fingerprint),
        );

        self.begin(Stage::CsvSink);
        match write_csv(&self.config.csv_output_path, &rows) {
            Ok(written) => {
                self.complete(
                    Stage::CsvSink,
                    &format!("{} rows written to {}", written, self.config.csv_output_path.display()),
                );
                report.csv = StageOutcome::Succeeded;
            }
            Err(error) => {
                self.failed(Stage::CsvSink, &error);
                report.csv = StageOutcome::Failed(error.clone());
                if self.config.sink_failure_policy == SinkFailurePolicy::Abort {
                    self.log.error("Sink failure policy is abort; skipping database_sink");
                    return Err(StageFailure { stage: Stage::CsvSink, error });
                }
            }
        }

        self.begin(Stage::DatabaseSink);
        match self.load_database(&rows, &fingerprint, report) {
            Ok(inserted) => {
                self.complete(
                    Stage::DatabaseSink,
                    &format!(
                        "{} rows in table {} of {}",
                        inserted,
                        self.config.db_table_name,
                        self.config.db_path.display()
                    ),
                );
                report.database = StageOutcome::Succeeded;
            }
            Err(error) => {
                self.failed(Stage::DatabaseSink, &error);
                report.database = StageOutcome::Failed(error);
            }
        }

        Ok(())
    }

    /// Connection lives for this call only: opened, loaded, verified, closed
    fn load_database(
        &self,
        rows: &[EnrichedBankRecord],
        fingerprint: &str,
        report: &mut RunReport,
    ) -> EtlResult<usize> {
        let mut conn = open_database(&self.config.db_path)?;
        self.log.info("SQL connection initiated");

        let result = self.load_and_verify(&mut conn, rows, fingerprint, report);
        let closed = close_database(conn);

        let inserted = result?;
        closed?;
        self.log.info("SQL connection closed");
        Ok(inserted)
    }

    fn load_and_verify(
        &self,
        conn: &mut Connection,
        rows: &[EnrichedBankRecord],
        fingerprint: &str,
        report: &mut RunReport,
    ) -> EtlResult<usize> {
        let table = &self.config.db_table_name;
        let inserted = write_table(conn, table, rows)?;
        self.log.info(&format!(
            "Data loaded to database table {}, executing queries",
            table
        ));

        for sql in verification_queries(table) {
            let result = run_query(conn, &sql)?;
            self.log.info(&format!("Query `{}` returned: {}", sql, result.one_line()));
            report.verification.push((sql, result));
        }

        let stored = table_fingerprint(&read_table(conn, table)?);
        if stored != fingerprint {
            return Err(EtlError::Storage(format!(
                "table {} does not match the rows written to CSV (fingerprint {} != {})",
                table, stored, fingerprint
            )));
        }

        Ok(inserted)
    }

    // ------------------------------------------------------------------------
    // Stage logging
    // ------------------------------------------------------------------------

    fn begin(&self, stage: Stage) {
        self.log.info(&format!("Stage {} started", stage.name()));
    }

    fn complete(&self, stage: Stage, summary: &str) {
        self.log.info(&format!("Stage {} completed: {}", stage.name(), summary));
    }

    fn failed(&self, stage: Stage, error: &EtlError) {
        self.log.error(&format!(
            "Stage {} failed [{}]: {}",
            stage.name(),
            error.kind().name(),
            error
        ));
    }

    fn fatal<T>(&self, stage: Stage, result: EtlResult<T>) -> Result<T, StageFailure> {
        result.map_err(|error| {
            self.failed(stage, &error);
            StageFailure { stage, error }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::logger::MemoryLogger;
    use std::fs;
    use std::path::Path;

    const PAGE: &str = r#"<table class="wikitable">
        <tr><th>Rank</th><th>Bank name</th><th>Market cap (US$ billion)</th></tr>
        <tr><td>1</td><td>Bank A</td><td>100.0</td></tr>
        <tr><td>2</td><td>Bank B</td><td>50.5</td></tr>
    </table>"#;

    struct FixedSource(&'static str);

    impl PageSource for FixedSource {
        fn fetch(&self, _url: &str) -> EtlResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn config_in(dir: &Path) -> PipelineConfig {
        let rates_path = dir.join("exchange_rate.csv");
        fs::write(&rates_path, "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n").unwrap();

        PipelineConfig {
            source_url: "http://example.test/banks".to_string(),
            rates_path,
            csv_output_path: dir.join("out").join("Largest_banks_data.csv"),
            db_path: dir.join("Banks.db"),
            log_path: dir.join("code_log.txt"),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_full_run_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let log = MemoryLogger::new();

        let report = Pipeline::new(&config, &FixedSource(PAGE), &log).run();

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.records, 2);
        assert!(matches!(report.csv, StageOutcome::Succeeded));
        assert!(matches!(report.database, StageOutcome::Succeeded));
        assert_eq!(report.verification.len(), 3);
        assert!(log.errors().is_empty());

        // Verification results reach the log, not only the report
        assert!(log.contains("Query `SELECT Name FROM Largest_banks LIMIT 5` returned: Name; Bank A; Bank B"));
        assert!(log.contains("Query `SELECT AVG(MC_GBP_Billion) FROM Largest_banks` returned: AVG(MC_GBP_Billion); 60."));

        for stage in ["configure", "extract", "load_rates", "transform", "csv_sink", "database_sink"] {
            assert!(log.contains(&format!("Stage {} started", stage)), "{} not started", stage);
            assert!(log.contains(&format!("Stage {} completed", stage)), "{} not completed", stage);
        }
    }

    #[test]
    fn test_missing_rate_aborts_before_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.rates_path, "Currency,Rate\nEUR,0.93\nGBP,0.8\n").unwrap();
        let log = MemoryLogger::new();

        let report = Pipeline::new(&config, &FixedSource(PAGE), &log).run();

        let fatal = report.fatal.as_ref().unwrap();
        assert_eq!(fatal.stage, Stage::LoadRates);
        assert_eq!(fatal.error.kind(), ErrorKind::Configuration);
        assert_eq!(report.exit_code(), 1);
        assert!(matches!(report.csv, StageOutcome::Skipped));
        assert!(!config.csv_output_path.exists());
        assert!(!config.db_path.exists());
        assert!(log.contains("Stage load_rates failed [ConfigurationError]"));
    }

    #[test]
    fn test_empty_table_aborts_with_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let log = MemoryLogger::new();
        let page = r#"<table class="wikitable"><tr><th>Rank</th><th>Bank</th><th>MC</th></tr></table>"#;

        let report = Pipeline::new(&config, &FixedSource(page), &log).run();

        let fatal = report.fatal.unwrap();
        assert_eq!(fatal.stage, Stage::Extract);
        assert_eq!(fatal.error.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn test_csv_failure_does_not_block_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        // Output path is an existing directory
        config.csv_output_path = dir.path().to_path_buf();
        let log = MemoryLogger::new();

        let report = Pipeline::new(&config, &FixedSource(PAGE), &log).run();

        assert!(report.fatal.is_none());
        assert!(report.csv.is_failed());
        assert!(matches!(report.database, StageOutcome::Succeeded));
        assert_eq!(report.exit_code(), 2);
        assert!(log.contains("Stage csv_sink failed [IOError]"));
    }

    #[test]
    fn test_abort_policy_skips_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.csv_output_path = dir.path().to_path_buf();
        config.sink_failure_policy = SinkFailurePolicy::Abort;
        let log = MemoryLogger::new();

        let report = Pipeline::new(&config, &FixedSource(PAGE), &log).run();

        assert_eq!(report.fatal.as_ref().map(|f| f.stage), Some(Stage::CsvSink));
        assert!(matches!(report.database, StageOutcome::Skipped));
        assert!(!config.db_path.exists());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_both_sinks_failing_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.csv_output_path = dir.path().to_path_buf();
        config.db_path = dir.path().join("missing").join("Banks.db");
        let log = MemoryLogger::new();

        let report = Pipeline::new(&config, &FixedSource(PAGE), &log).run();

        assert!(report.csv.is_failed());
        assert!(report.database.is_failed());
        assert_eq!(report.exit_code(), 1);
        assert!(log.contains("Stage database_sink failed [StorageError]"));
    }

    #[test]
    fn test_invalid_config_fails_before_extract() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.db_table_name = "bad name".to_string();
        let log = MemoryLogger::new();

        let report = Pipeline::new(&config, &FixedSource(PAGE), &log).run();

        assert_eq!(report.fatal.map(|f| f.stage), Some(Stage::Configure));
        assert!(!log.contains("Stage extract started"));
    }
}
