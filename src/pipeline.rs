//! Normalization of oracle output into both representations.
//!
//! Whatever form arrives, the caller gets runnable DDL and a structured
//! schema: a schema is rendered forward, DDL is parsed back, and a missing
//! or empty result falls back to [`fallback_schema`].

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ast::Schema;
use crate::generator::generate;
use crate::oracle::{OracleOutput, fallback_schema};
use crate::sql::{ParseGap, parse_sql_with_report};
use crate::validate::{SchemaIssue, validate};

/// DDL and schema for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized {
    pub sql: String,
    pub schema: Schema,
    #[serde(skip)]
    pub gaps: Vec<ParseGap>,
    #[serde(skip)]
    pub issues: Vec<SchemaIssue>,
    #[serde(skip)]
    pub used_fallback: bool,
}

pub fn normalize(output: Option<OracleOutput>) -> Normalized {
    let normalized = match output {
        Some(OracleOutput::Schema(schema)) if !schema.is_empty() => {
            debug!(entities = schema.entities.len(), "rendering oracle schema");
            from_schema(schema, false)
        }
        Some(OracleOutput::Ddl(sql)) => {
            let report = parse_sql_with_report(&sql);
            for gap in &report.gaps {
                warn!(%gap, "skipped part of oracle DDL");
            }
            if report.schema.is_empty() {
                warn!("oracle DDL contained no usable CREATE TABLE statements");
                from_fallback()
            } else {
                debug!(
                    entities = report.schema.entities.len(),
                    relationships = report.schema.relationships.len(),
                    "parsed oracle DDL"
                );
                let issues = validate(&report.schema);
                Normalized {
                    sql,
                    schema: report.schema,
                    gaps: report.gaps,
                    issues,
                    used_fallback: false,
                }
            }
        }
        Some(OracleOutput::Schema(_)) => {
            warn!("oracle returned an empty schema");
            from_fallback()
        }
        None => {
            info!("no oracle output available");
            from_fallback()
        }
    };

    for issue in &normalized.issues {
        warn!(%issue, "schema issue");
    }
    normalized
}

/// Render a schema and collect its structural issues.
pub fn from_schema(schema: Schema, used_fallback: bool) -> Normalized {
    let issues = validate(&schema);
    Normalized {
        sql: generate(&schema),
        schema,
        gaps: Vec::new(),
        issues,
        used_fallback,
    }
}

fn from_fallback() -> Normalized {
    warn!("using fallback schema");
    from_schema(fallback_schema(), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Entity, Relationship};
    use crate::oracle::FALLBACK_ENTITY;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_is_rendered() {
        let schema = Schema::new(
            vec![Entity::from_names("Student", ["Student_ID", "Name", "Email"])],
            vec![],
        );

        let normalized = normalize(Some(OracleOutput::Schema(schema.clone())));

        assert_eq!(normalized.schema, schema);
        assert!(normalized.sql.starts_with("CREATE TABLE IF NOT EXISTS Students ("));
        assert!(!normalized.used_fallback);
    }

    #[test]
    fn test_ddl_is_parsed_and_kept() {
        let sql = "CREATE TABLE IF NOT EXISTS Books (\n  ISBN TEXT PRIMARY KEY,\n  Title TEXT NOT NULL\n);";

        let normalized = normalize(Some(OracleOutput::Ddl(sql.to_string())));

        assert_eq!(normalized.sql, sql);
        assert_eq!(normalized.schema.entities[0].name, "Books");
        assert!(normalized.gaps.is_empty());
    }

    #[test]
    fn test_missing_output_falls_back() {
        let normalized = normalize(None);

        assert!(normalized.used_fallback);
        assert_eq!(normalized.schema.entities[0].name, FALLBACK_ENTITY);
        assert!(normalized.sql.contains("Generated_Tables"));
        assert!(normalized.schema.relationships.is_empty());
    }

    #[test]
    fn test_prose_ddl_falls_back() {
        let normalized = normalize(Some(OracleOutput::Ddl("I cannot help with that.".into())));
        assert!(normalized.used_fallback);
    }

    #[test]
    fn test_issues_are_collected() {
        let schema = Schema::new(
            vec![Entity::from_names("Borrowing", ["Borrowing_ID", "ISBN"])],
            vec![Relationship::new("Borrowing", "ISBN", "Book", "ISBN")],
        );

        let normalized = normalize(Some(OracleOutput::Schema(schema)));

        assert_eq!(normalized.issues.len(), 1);
        assert!(normalized.sql.contains("REFERENCES Books(ISBN)"));
    }

    #[test]
    fn test_serializes_sql_and_schema_only() {
        let json = serde_json::to_value(normalize(None)).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["schema", "sql"]);
    }
}
