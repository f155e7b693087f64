#![cfg(feature = "sqlite")]

use erdforge::oracle::{FALLBACK_ENTITY, OracleOutput};
use erdforge::pipeline::normalize;
use erdforge::sink::{SqliteSink, StatementOutcome, drop_tables, execute_script};
use erdforge::{ParseGap, generate_drop_tables};
use pretty_assertions::assert_eq;

const GYM_REPLY: &str = r#"```json
{
  "tables": [
    {"name": "Member", "attributes": ["Member_ID", "Name", "Email", "Join_Date"]},
    {"name": "Training_Session", "attributes": ["Session_ID", "Member_ID", "Session_Date", "Duration"]}
  ],
  "relationships": [
    {"fromTable": "Training_Session", "fromColumn": "Member_ID", "toTable": "Member", "toColumn": "Member_ID", "relationshipName": "attends"}
  ]
}
```"#;

const DDL_REPLY: &str = "**Here is your schema**\n```sql\nCREATE TABLE Books (\n  ISBN TEXT PRIMARY KEY,\n  Title TEXT NOT NULL\n);\n\nCREATE TABLE Loans (\n  Loan_ID INTEGER PRIMARY KEY,\n  ISBN TEXT REFERENCES Books(ISBN),\n  Amount\n);\n```";

#[test]
fn test_json_reply_is_rendered_and_applied() {
    let normalized = normalize(Some(OracleOutput::from_response(GYM_REPLY)));

    assert!(!normalized.used_fallback);
    assert!(normalized.issues.is_empty());
    assert_eq!(normalized.schema.relationships[0].label.as_deref(), Some("attends"));
    assert!(normalized
        .sql
        .contains("FOREIGN KEY (Member_ID) REFERENCES Members(Member_ID)"));

    let mut sink = SqliteSink::open_in_memory().unwrap();
    let reports = execute_script(&mut sink, &normalized.sql).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(
        sink.table_names().unwrap(),
        vec!["Members", "Training_Sessions"]
    );
}

#[test]
fn test_ddl_reply_is_parsed_with_gaps() {
    let normalized = normalize(Some(OracleOutput::from_response(DDL_REPLY)));

    assert!(!normalized.used_fallback);
    let names: Vec<&str> = normalized
        .schema
        .entities
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, vec!["Books", "Loans"]);
    assert_eq!(normalized.schema.relationships.len(), 1);
    assert_eq!(normalized.schema.relationships[0].to_table, "Books");
    assert!(matches!(
        normalized.gaps.as_slice(),
        [ParseGap::MissingColumnType { table, .. }] if table == "Loans"
    ));
    assert!(!normalized.sql.contains("```"));
    assert!(!normalized.sql.contains("**"));
}

#[test]
fn test_no_reply_uses_fallback_table() {
    let normalized = normalize(None);

    assert!(normalized.used_fallback);
    assert_eq!(normalized.schema.entities.len(), 1);
    assert_eq!(normalized.schema.entities[0].name, FALLBACK_ENTITY);
    assert_eq!(
        normalized.sql,
        "CREATE TABLE IF NOT EXISTS Generated_Tables (\n  id INTEGER PRIMARY KEY,\n  name TEXT NOT NULL,\n  description TEXT,\n  created_at TEXT\n);"
    );

    let mut sink = SqliteSink::open_in_memory().unwrap();
    execute_script(&mut sink, &normalized.sql).unwrap();
    let tables = sink.table_names().unwrap();
    assert_eq!(
        generate_drop_tables(&tables),
        "DROP TABLE IF EXISTS Generated_Tables;"
    );
}

#[test]
fn test_sink_reports_rows_and_failures() {
    let mut sink = SqliteSink::open_in_memory().unwrap();
    let script = "CREATE TABLE Notes (Note_ID INTEGER PRIMARY KEY, Body TEXT);\nINSERT INTO Notes (Body) VALUES ('a; b');\nSELECT Note_ID, Body FROM Notes;";

    let reports = execute_script(&mut sink, script).unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[1].outcome, StatementOutcome::Executed { changes: 1 });
    assert_eq!(
        reports[2].outcome,
        StatementOutcome::Rows {
            columns: vec!["Note_ID".to_string(), "Body".to_string()],
            rows: vec![vec![1.into(), "a; b".into()]],
        }
    );

    let err = execute_script(&mut sink, "SELECT 1; SELECT * FROM Missing; SELECT 2").unwrap_err();
    assert_eq!(err.index, 1);
}

#[test]
fn test_applied_schema_reads_back_and_drops() {
    let normalized = normalize(Some(OracleOutput::from_response(GYM_REPLY)));
    let mut sink = SqliteSink::open_in_memory().unwrap();
    execute_script(&mut sink, &normalized.sql).unwrap();

    let described = sink.schema().unwrap();
    let names: Vec<&str> = described.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Members", "Training_Sessions"]);
    assert!(described.entities[0].attributes[2].unique);
    assert_eq!(described.relationships.len(), 1);
    assert_eq!(described.relationships[0].to_table, "Members");

    let tables = sink.table_names().unwrap();
    let reports = drop_tables(&mut sink, &tables).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(sink.table_names().unwrap().is_empty());
}
