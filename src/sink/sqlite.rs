//! SQLite-backed execution sink.

use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::warn;

use super::{ExecutionSink, SinkError, StatementOutcome, is_query};
use crate::ast::{Attribute, Entity, Relationship, Schema};

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open or create the database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// User tables, sorted by name.
    pub fn table_names(&self) -> Result<Vec<String>, SinkError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Read one table back as a schema: its columns from `table_info`,
    /// single-column unique indexes from `index_list`, and its
    /// single-column foreign keys from `foreign_key_list`.
    pub fn table_schema(&self, table: &str) -> Result<Schema, SinkError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid")?;
        let mut attributes = stmt
            .query_map([table], |row| {
                let mut attr = Attribute::declared(row.get::<_, String>(0)?, &row.get::<_, String>(1)?);
                attr.not_null = row.get(2)?;
                attr.primary_key = row.get::<_, i64>(3)? > 0;
                Ok(attr)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        if attributes.is_empty() {
            return Err(SinkError::UnknownTable(table.to_string()));
        }

        let mut stmt = self.conn.prepare(
            "SELECT ii.name FROM pragma_index_list(?1) AS il, pragma_index_info(il.name) AS ii \
             WHERE il.\"unique\" = 1 AND il.origin = 'u' \
             GROUP BY il.name HAVING COUNT(*) = 1",
        )?;
        let unique = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for attr in &mut attributes {
            attr.unique = unique.contains(&attr.name);
        }

        let mut stmt = self.conn.prepare(
            "SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1) \
             GROUP BY id HAVING COUNT(*) = 1 ORDER BY id",
        )?;
        let keys = stmt
            .query_map([table], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut relationships = Vec::with_capacity(keys.len());
        for (from_column, to_table, to_column) in keys {
            match to_column {
                Some(to_column) => {
                    relationships.push(Relationship::new(table, from_column, to_table, to_column))
                }
                None => warn!(table, column = %from_column, "foreign key without a target column"),
            }
        }

        Ok(Schema::new(vec![Entity::new(table, attributes)], relationships))
    }

    /// Every user table, in name order.
    pub fn schema(&self) -> Result<Schema, SinkError> {
        let mut schema = Schema::default();
        for table in self.table_names()? {
            let described = self.table_schema(&table)?;
            schema.entities.extend(described.entities);
            schema.relationships.extend(described.relationships);
        }
        Ok(schema)
    }
}

impl ExecutionSink for SqliteSink {
    fn execute(&mut self, statement: &str) -> Result<StatementOutcome, SinkError> {
        if !is_query(statement) {
            let changes = self.conn.execute(statement, [])?;
            return Ok(StatementOutcome::Executed { changes });
        }

        let mut stmt = self.conn.prepare(statement)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i).map(to_json))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StatementOutcome::Rows { columns, rows })
    }
}

fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => i.into(),
        Value::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => s.into(),
        Value::Blob(b) => b.into(),
    }
}
