// 🗄️ Relational Sink - SQLite + WAL
// Full overwrite of one table per run, then fixed verification queries

use crate::config::is_sql_identifier;
use crate::error::{EtlError, EtlResult};
use crate::model::EnrichedBankRecord;
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::fmt;
use std::path::Path;

pub fn open_database<P: AsRef<Path>>(path: P) -> EtlResult<Connection> {
    let path = path.as_ref();
    let conn = Connection::open(path)
        .map_err(|e| EtlError::Storage(format!("failed to open {}: {}", path.display(), e)))?;

    // Enable WAL mode for crash recovery
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;

    Ok(conn)
}

/// Release the connection, surfacing anything SQLite reports on close
pub fn close_database(conn: Connection) -> EtlResult<()> {
    conn.close()
        .map_err(|(_, e)| EtlError::Storage(format!("failed to close database: {}", e)))
}

fn checked_table_name(table: &str) -> EtlResult<&str> {
    if is_sql_identifier(table) {
        Ok(table)
    } else {
        Err(EtlError::Storage(format!("invalid table name {:?}", table)))
    }
}

// ============================================================================
// LOAD
// ============================================================================

/// Replace `table` with exactly `rows`, in order. One transaction: readers
/// see either the previous run's table or this one, never a mix.
pub fn write_table(conn: &mut Connection, table: &str, rows: &[EnrichedBankRecord]) -> EtlResult<usize> {
    let table = checked_table_name(table)?;
    let tx = conn.transaction()?;

    tx.execute(&format!("DROP TABLE IF EXISTS \"{}\"", table), [])?;
    tx.execute(
        &format!(
            "CREATE TABLE \"{}\" (
                Name TEXT,
                MC_USD_Billion REAL,
                MC_GBP_Billion REAL,
                MC_EUR_Billion REAL,
                MC_INR_Billion REAL
            )",
            table
        ),
        [],
    )?;

    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{}\" (Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            table
        ))?;

        for row in rows {
            stmt.execute(params![
                row.name,
                row.market_cap_usd,
                row.market_cap_gbp,
                row.market_cap_eur,
                row.market_cap_inr,
            ])?;
            inserted += 1;
        }
    }

    tx.commit()?;
    Ok(inserted)
}

/// Stored rows in insertion order
pub fn read_table(conn: &Connection, table: &str) -> EtlResult<Vec<EnrichedBankRecord>> {
    let table = checked_table_name(table)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion
         FROM \"{}\"
         ORDER BY rowid",
        table
    ))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(EnrichedBankRecord {
                name: row.get(0)?,
                market_cap_usd: row.get(1)?,
                market_cap_gbp: row.get(2)?,
                market_cap_eur: row.get(3)?,
                market_cap_inr: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

// ============================================================================
// QUERIES
// ============================================================================

/// Column names + every row of a query, values kept as SQLite returned them
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// First column of the first row, if any
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Header and rows on a single line, rows separated by `; `
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.columns.join(" | ")];
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(render_value).collect();
            parts.push(cells.join(" | "));
        }
        parts.join("; ")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(render_value).collect();
            write!(f, "\n{}", cells.join(" | "))?;
        }
        Ok(())
    }
}

pub fn run_query(conn: &Connection, sql: &str) -> EtlResult<QueryResult> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let values = (0..width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }

    Ok(QueryResult { columns, rows })
}

/// Full dump, average GBP market cap, first five names
pub fn verification_queries(table: &str) -> [String; 3] {
    [
        format!("SELECT * FROM {}", table),
        format!("SELECT AVG(MC_GBP_Billion) FROM {}", table),
        format!("SELECT Name FROM {} LIMIT 5", table),
    ]
}
