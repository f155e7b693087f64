//! Best-effort parser for `CREATE TABLE` statements.
//!
//! Table heads are located with a case-insensitive pattern, bodies are read
//! up to the matching `)` and split with the depth-tracking [`Scanner`]
//! (quoted text is opaque to both), and each definition is
//! classified as a foreign key, a table-level constraint, or a column.
//! Nothing in here fails: anything unrecognized is recorded as a
//! [`ParseGap`] and skipped.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::scanner::Scanner;
use crate::ast::{Attribute, Entity, Relationship, Schema};

/// One identifier: quoted with `""`, backticks or `[]` (spaces allowed
/// inside), or a bare run of name characters.
const IDENT: &str = r#"(?:"[^"]*"|`[^`]*`|\[[^\]]*\]|[^\s(),;."`\[\]]+)"#;

/// `schema.table`, each part an [`IDENT`].
fn qualified_ident() -> String {
    format!(r"{IDENT}(?:\s*\.\s*{IDENT})*")
}

/// `CREATE TABLE [IF NOT EXISTS] name (`. The body is read by the scanner so
/// quoted `;` and `)` inside it are skipped.
static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bCREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?({})\s*\(",
        qualified_ident()
    ))
    .unwrap()
});

static CREATE_TABLE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCREATE\s+TABLE\b").unwrap());

static FOREIGN_KEY_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^FOREIGN\s+KEY\b").unwrap());

static FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^FOREIGN\s+KEY\s*\(\s*({IDENT})\s*\)\s*REFERENCES\s+({})\s*\(\s*({IDENT})\s*\)",
        qualified_ident()
    ))
    .unwrap()
});

static INLINE_REFERENCES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bREFERENCES\s+({})\s*\(\s*({IDENT})\s*\)",
        qualified_ident()
    ))
    .unwrap()
});

static CONSTRAINT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^CONSTRAINT\s+\S+\s+").unwrap());

static TABLE_CONSTRAINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^(PRIMARY\s+KEY|UNIQUE(?:\s+(?:KEY|INDEX))?|CHECK|FULLTEXT(?:\s+(?:KEY|INDEX))?|KEY|INDEX)(?:\s+[^\s(]+)?\s*\((.*)\)",
    )
    .unwrap()
});

static PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

static UNIQUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());

static NOT_NULL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

/// Words that start a constraint clause and therefore cannot be a type.
const CLAUSE_KEYWORDS: [&str; 8] = [
    "PRIMARY",
    "NOT",
    "NULL",
    "UNIQUE",
    "REFERENCES",
    "DEFAULT",
    "CHECK",
    "CONSTRAINT",
];

/// Input the parser recognized as intended DDL but could not use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseGap {
    #[error("unrecognized CREATE TABLE block: {snippet}")]
    UnrecognizedBlock { snippet: String },
    #[error("malformed foreign key in {table}: {definition}")]
    MalformedForeignKey { table: String, definition: String },
    #[error("column without a type in {table}: {definition}")]
    MissingColumnType { table: String, definition: String },
}

/// A parsed schema plus everything that had to be skipped to build it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub schema: Schema,
    pub gaps: Vec<ParseGap>,
}

/// Parse DDL text into a schema. Never fails; text without any
/// recognizable `CREATE TABLE` yields an empty schema.
pub fn parse_sql(input: &str) -> Schema {
    parse_sql_with_report(input).schema
}

pub fn parse_sql_with_report(input: &str) -> ParseReport {
    let source = Scanner::new(input).strip_comments();
    let mut parser = Parser::default();

    let mut pos = 0;
    while let Some(caps) = CREATE_TABLE.captures_at(&source, pos) {
        let (Some(head), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        parser.note_unrecognized(&source[pos..head.start()]);

        let mut scanner = Scanner::new(&source[head.end()..]);
        match scanner.read_block() {
            Some(body) => parser.parse_table(&normalize_identifier(name.as_str()), &body),
            None => parser.gaps.push(ParseGap::UnrecognizedBlock {
                snippet: snippet(&source[head.start()..]),
            }),
        }
        pos = head.end() + scanner.byte_offset();
    }
    parser.note_unrecognized(&source[pos..]);

    parser.finish()
}

#[derive(Default)]
struct Parser {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    gaps: Vec<ParseGap>,
}

/// Table-level key declared after the columns it names.
enum TableKey {
    Primary(Vec<String>),
    Unique(Vec<String>),
}

impl Parser {
    fn finish(self) -> ParseReport {
        ParseReport {
            schema: Schema::new(self.entities, self.relationships),
            gaps: self.gaps,
        }
    }

    /// Record every `CREATE TABLE` head in text the block pattern skipped.
    fn note_unrecognized(&mut self, segment: &str) {
        for head in CREATE_TABLE_HEAD.find_iter(segment) {
            self.gaps.push(ParseGap::UnrecognizedBlock {
                snippet: snippet(&segment[head.start()..]),
            });
        }
    }

    fn parse_table(&mut self, table: &str, body: &str) {
        let mut attributes = Vec::new();
        let mut keys = Vec::new();

        for definition in Scanner::new(body).split(',') {
            let definition = match CONSTRAINT_NAME.find(&definition) {
                Some(prefix) => definition[prefix.end()..].trim().to_string(),
                None => definition,
            };

            if FOREIGN_KEY_HEAD.is_match(&definition) {
                self.parse_foreign_key(table, &definition);
            } else if let Some(key) = parse_table_constraint(&definition) {
                keys.extend(key);
            } else if let Some(attr) = self.parse_column(table, &definition) {
                attributes.push(attr);
            }
        }

        for key in keys {
            let (columns, primary) = match key {
                TableKey::Primary(columns) => (columns, true),
                TableKey::Unique(columns) => (columns, false),
            };
            for attr in &mut attributes {
                if columns.iter().any(|c| c.eq_ignore_ascii_case(&attr.name)) {
                    if primary {
                        attr.primary_key = true;
                    } else if columns.len() == 1 {
                        attr.unique = true;
                    }
                }
            }
        }

        self.entities.push(Entity::new(table, attributes));
    }

    fn parse_foreign_key(&mut self, table: &str, definition: &str) {
        match FOREIGN_KEY.captures(definition) {
            Some(caps) => self.relationships.push(Relationship::new(
                table,
                normalize_identifier(&caps[1]),
                normalize_identifier(&caps[2]),
                normalize_identifier(&caps[3]),
            )),
            None => self.gaps.push(ParseGap::MalformedForeignKey {
                table: table.to_string(),
                definition: definition.to_string(),
            }),
        }
    }

    fn parse_column(&mut self, table: &str, definition: &str) -> Option<Attribute> {
        let mut scanner = Scanner::new(definition);
        let name = normalize_identifier(&scanner.read_word()?);

        let declared_type = scanner
            .read_type()
            .filter(|t| !CLAUSE_KEYWORDS.iter().any(|k| t.eq_ignore_ascii_case(k)));
        let Some(declared_type) = declared_type else {
            self.gaps.push(ParseGap::MissingColumnType {
                table: table.to_string(),
                definition: definition.to_string(),
            });
            return None;
        };

        let clauses = scanner.rest();
        let mut attr = Attribute::declared(name, &declared_type);
        attr.primary_key = PRIMARY_KEY.is_match(&clauses);
        attr.unique = UNIQUE.is_match(&clauses);
        attr.not_null = NOT_NULL.is_match(&clauses);

        if let Some(caps) = INLINE_REFERENCES.captures(&clauses) {
            self.relationships.push(Relationship::new(
                table,
                attr.name.clone(),
                normalize_identifier(&caps[1]),
                normalize_identifier(&caps[2]),
            ));
        }

        Some(attr)
    }
}

/// `Some(None)` for a recognized constraint that carries no key (CHECK,
/// INDEX), `None` when the definition is not a table constraint at all.
fn parse_table_constraint(definition: &str) -> Option<Option<TableKey>> {
    let caps = TABLE_CONSTRAINT.captures(definition)?;
    let kind = caps[1].to_uppercase();
    let inner = &caps[2];

    // `Key VARCHAR(10)` and `Key ENUM('a','b')` are columns, not KEY clauses.
    if !kind.starts_with("CHECK") && is_literal_list(inner) {
        return None;
    }

    let columns = || -> Vec<String> {
        Scanner::new(inner)
            .split(',')
            .into_iter()
            .filter_map(|c| Scanner::new(&c).read_word())
            .map(|c| normalize_identifier(&c))
            .collect()
    };

    Some(if kind.starts_with("PRIMARY") {
        Some(TableKey::Primary(columns()))
    } else if kind.starts_with("UNIQUE") {
        Some(TableKey::Unique(columns()))
    } else {
        None
    })
}

/// Parentheses holding only numbers and string literals: type parameters
/// rather than a column list.
fn is_literal_list(inner: &str) -> bool {
    let items = Scanner::new(inner).split(',');
    !items.is_empty()
        && items.iter().all(|item| {
            let quoted = item.len() >= 2 && item.starts_with('\'') && item.ends_with('\'');
            let numeric = item
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
            quoted || numeric
        })
}

/// First line of `text`, at most 80 characters.
fn snippet(text: &str) -> String {
    let line: String = text
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(80)
        .collect();
    line.trim().to_string()
}

/// Strip schema qualification and identifier quoting:
/// `"public"."users"` and `[users]` both become `users`.
pub(crate) fn normalize_identifier(raw: &str) -> String {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut close: Option<char> = None;

    for c in raw.trim().chars() {
        match close {
            Some(q) if c == q => close = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '`' => close = Some(c),
                '[' => close = Some(']'),
                '.' => parts.push(std::mem::take(&mut current)),
                c if c.is_whitespace() => {}
                c => current.push(c),
            },
        }
    }
    parts.push(current);

    parts.pop().unwrap_or_default()
}
