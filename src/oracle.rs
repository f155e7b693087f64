//! Handling of text returned by a natural-language schema oracle.
//!
//! The oracle itself lives outside this crate. What arrives here is its raw
//! reply: either a JSON schema or `CREATE TABLE` text, often wrapped in
//! markdown.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Entity, Schema};

static SQL_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```sql\n?").unwrap());

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```\n?").unwrap());

static BOLD_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\*\*.*\*\*$").unwrap());

static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+.*$").unwrap());

static EXTRA_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());

/// Name of the table produced when no oracle output is usable.
pub const FALLBACK_ENTITY: &str = "Generated_Table";

/// What an oracle returned, after cleaning.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleOutput {
    Schema(Schema),
    Ddl(String),
}

impl OracleOutput {
    /// Classify a raw reply. A JSON object that decodes to a schema with at
    /// least one entity is a schema; anything else is treated as DDL.
    pub fn from_response(text: &str) -> Self {
        let json = clean_json_response(text);
        if json.starts_with('{') {
            if let Ok(schema) = Schema::from_json(&json) {
                if !schema.is_empty() {
                    return Self::Schema(schema);
                }
            }
        }
        Self::Ddl(clean_sql_response(text))
    }
}

/// Strip markdown fences, bold/heading lines and runs of blank lines from a
/// DDL reply.
pub fn clean_sql_response(text: &str) -> String {
    let text = SQL_FENCE.replace_all(text, "");
    let text = FENCE.replace_all(&text, "");
    let text = text.trim();
    let text = BOLD_LINE.replace_all(text, "");
    let text = HEADING_LINE.replace_all(&text, "");
    EXTRA_BLANK_LINES.replace_all(&text, "\n\n").into_owned()
}

pub fn clean_json_response(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// One generic table and no relationships, for when the oracle is
/// unavailable or returned nothing usable.
pub fn fallback_schema() -> Schema {
    Schema::new(
        vec![Entity::from_names(
            FALLBACK_ENTITY,
            ["id", "name", "description", "created_at"],
        )],
        vec![],
    )
}
