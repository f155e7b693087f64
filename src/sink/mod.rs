//! Execution of generated DDL against a database.
//!
//! [`ExecutionSink`] is the seam; [`execute_script`] feeds it one statement
//! at a time in script order.

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSink;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::generator::generate_drop_tables;
use crate::sql::split_statements;

#[derive(Debug, Error)]
pub enum SinkError {
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Statement rejected: {0}")]
    Rejected(String),

    #[error("No such table: {0}")]
    UnknownTable(String),
}

/// The statement at `index` failed; everything before it was applied.
#[derive(Debug, Error)]
#[error("statement {index} failed: {source}")]
pub struct ScriptError {
    pub index: usize,
    pub statement: String,
    #[source]
    pub source: SinkError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StatementOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
    },
    Executed {
        changes: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementReport {
    pub index: usize,
    pub statement: String,
    pub outcome: StatementOutcome,
}

pub trait ExecutionSink {
    fn execute(&mut self, statement: &str) -> Result<StatementOutcome, SinkError>;
}

/// Statements starting with `SELECT` return rows; everything else reports
/// a change count.
pub fn is_query(statement: &str) -> bool {
    statement
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"))
}

/// Run every statement of `script` in order, stopping at the first failure.
pub fn execute_script<S: ExecutionSink + ?Sized>(
    sink: &mut S,
    script: &str,
) -> Result<Vec<StatementReport>, ScriptError> {
    let statements = split_statements(script);
    let mut reports = Vec::with_capacity(statements.len());

    for (index, statement) in statements.into_iter().enumerate() {
        debug!(index, "executing statement");
        match sink.execute(&statement) {
            Ok(outcome) => reports.push(StatementReport {
                index,
                statement,
                outcome,
            }),
            Err(source) => {
                warn!(index, error = %source, "statement failed");
                return Err(ScriptError {
                    index,
                    statement,
                    source,
                });
            }
        }
    }

    Ok(reports)
}

/// Drop each named table through `sink`. An empty list runs nothing.
pub fn drop_tables<S, T>(sink: &mut S, tables: &[T]) -> Result<Vec<StatementReport>, ScriptError>
where
    S: ExecutionSink + ?Sized,
    T: AsRef<str>,
{
    execute_script(sink, &generate_drop_tables(tables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct RecordingSink {
        seen: Vec<String>,
    }

    impl ExecutionSink for RecordingSink {
        fn execute(&mut self, statement: &str) -> Result<StatementOutcome, SinkError> {
            if statement.contains("boom") {
                return Err(SinkError::Rejected(statement.to_string()));
            }
            self.seen.push(statement.to_string());
            Ok(StatementOutcome::Executed { changes: 0 })
        }
    }

    #[test]
    fn test_executes_in_order() {
        let mut sink = RecordingSink::default();

        let reports = execute_script(&mut sink, "CREATE TABLE a (x);\n\nCREATE TABLE b (y);\n").unwrap();

        assert_eq!(sink.seen, vec!["CREATE TABLE a (x)", "CREATE TABLE b (y)"]);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].index, 1);
    }

    #[test]
    fn test_stops_at_first_failure() {
        let mut sink = RecordingSink::default();

        let err = execute_script(&mut sink, "SELECT 1; boom; SELECT 2;").unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.statement, "boom");
        assert_eq!(sink.seen, vec!["SELECT 1"]);
    }

    #[test]
    fn test_drop_tables() {
        let mut sink = RecordingSink::default();

        let reports = drop_tables(&mut sink, &["Members", "Visits"]).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(
            sink.seen,
            vec!["DROP TABLE IF EXISTS Members", "DROP TABLE IF EXISTS Visits"]
        );
    }

    #[test]
    fn test_drop_no_tables_runs_nothing() {
        let mut sink = RecordingSink::default();

        let reports = drop_tables::<_, &str>(&mut sink, &[]).unwrap();

        assert!(reports.is_empty());
        assert!(sink.seen.is_empty());
    }

    #[test]
    fn test_is_query() {
        assert!(is_query("  select * from t"));
        assert!(!is_query("CREATE TABLE t (x)"));
        assert!(!is_query("SEL"));
    }
}
