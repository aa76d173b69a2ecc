use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use largest_banks_etl::{
    close_database, open_database, run_query, FileLogger, HttpSource, Pipeline, PipelineConfig,
    SinkFailurePolicy, StageOutcome,
};

/// Extract the world's largest banks, convert market caps to GBP/EUR/INR,
/// and store the table as CSV and in SQLite
#[derive(Parser)]
#[command(name = "banks-etl", version)]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Page holding the bank table
    #[arg(long, global = true, env = "BANKS_ETL_URL")]
    url: Option<String>,

    /// Exchange rate CSV (Currency,Rate)
    #[arg(long, global = true)]
    rates: Option<PathBuf>,

    /// Output CSV file
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Database table name
    #[arg(long, global = true)]
    table: Option<String>,

    /// Append-only progress log
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Stop the run when the CSV sink fails instead of still loading the database
    #[arg(long, global = true)]
    abort_on_sink_failure: bool,

    /// More verbose console logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full ETL pipeline (default)
    Run,

    /// Run an ad-hoc SQL query against the configured database
    Query {
        /// SQL statement, e.g. "SELECT Name FROM Largest_banks LIMIT 5"
        sql: String,
    },

    /// Print the resolved configuration as JSON
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let config = resolve_config(&cli)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let code = run_pipeline(&config)?;
            process::exit(code);
        }
        Command::Query { sql } => {
            let conn = open_database(&config.db_path)
                .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
            let result = run_query(&conn, &sql).context("Query failed")?;
            println!("{}", result);
            close_database(conn)?;
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Defaults < config file < command-line flags
fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(url) = &cli.url {
        config.source_url = url.clone();
    }
    if let Some(rates) = &cli.rates {
        config.rates_path = rates.clone();
    }
    if let Some(output) = &cli.output {
        config.csv_output_path = output.clone();
    }
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(table) = &cli.table {
        config.db_table_name = table.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.log_path = log_file.clone();
    }
    if cli.abort_on_sink_failure {
        config.sink_failure_policy = SinkFailurePolicy::Abort;
    }

    Ok(config)
}

fn run_pipeline(config: &PipelineConfig) -> Result<i32> {
    println!("🏦 Largest Banks ETL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let logger = FileLogger::new(&config.log_path, &config.log_timestamp_format);
    let source = HttpSource::new(Duration::from_secs(config.request_timeout_secs))
        .context("Failed to set up HTTP client")?;

    let report = Pipeline::new(config, &source, &logger).run();

    for (sql, result) in &report.verification {
        println!("\n🔍 Running query: {}\n{}", sql, result);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if let Some(failure) = &report.fatal {
        eprintln!("❌ Run {} aborted in stage {}: {}", report.run_id, failure.stage.name(), failure.error);
    }
    for (label, outcome) in [("CSV", &report.csv), ("Database", &report.database)] {
        match outcome {
            StageOutcome::Succeeded => println!("✓ {} sink: {} rows", label, report.records),
            StageOutcome::Failed(e) => eprintln!("❌ {} sink failed: {}", label, e),
            StageOutcome::Skipped => println!("- {} sink skipped", label),
        }
    }
    if report.is_success() {
        println!("🎉 ETL process completed successfully!");
    }
    println!("Log: {}", logger.path().display());

    Ok(report.exit_code())
}
