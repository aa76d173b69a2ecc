// Sinks - where the final table lands
//
// Both sinks receive the same rows in the same order; they fail independently.

pub mod csv_file;
pub mod sqlite;

pub use csv_file::{read_csv, write_csv};
pub use sqlite::{
    close_database, open_database, read_table, run_query, verification_queries, write_table,
    QueryResult,
};
