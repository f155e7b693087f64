//! Name-based type and constraint inference.
//!
//! Everything here is a pure function of the lower-cased attribute name, so
//! both pipelines derive identical results for the same name.

use std::fmt;

use crate::ast::ColumnType;

/// Substrings that make an otherwise untyped name an integer column.
const NUMERIC_HINTS: [&str; 4] = ["age", "price", "amount", "credits"];

/// Column constraint keywords, ordered the way they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constraint {
    PrimaryKey,
    Unique,
    NotNull,
}

impl Constraint {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::PrimaryKey => "PRIMARY KEY",
            Self::Unique => "UNIQUE",
            Self::NotNull => "NOT NULL",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Result of inferring a single attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inference {
    pub column_type: ColumnType,
    pub id_like: bool,
    pub unique: bool,
    pub not_null: bool,
}

impl Inference {
    /// Constraints in rendering order. Whether this attribute holds the
    /// primary key is positional and decided by the caller.
    pub fn constraints(&self, primary_key: bool) -> Vec<Constraint> {
        let mut constraints = Vec::with_capacity(3);
        if primary_key {
            constraints.push(Constraint::PrimaryKey);
        }
        if self.unique {
            constraints.push(Constraint::Unique);
        }
        if self.not_null {
            constraints.push(Constraint::NotNull);
        }
        constraints
    }
}

pub fn infer(name: &str) -> Inference {
    let lower = name.to_lowercase();
    let id_like = id_like(&lower);

    let column_type = if id_like {
        ColumnType::Integer
    } else if lower.contains("date") {
        ColumnType::Date
    } else if lower.contains("time") || lower.contains("duration") {
        ColumnType::Integer
    } else if NUMERIC_HINTS.iter().any(|hint| lower.contains(hint)) {
        ColumnType::Integer
    } else {
        ColumnType::Text
    };

    Inference {
        column_type,
        id_like,
        unique: lower.contains("email"),
        not_null: lower.contains("name") && !lower.ends_with("_id"),
    }
}

/// Ends in `id` (which covers `_id`) but not in `name`.
pub fn is_id_like(name: &str) -> bool {
    id_like(&name.to_lowercase())
}

fn id_like(lower: &str) -> bool {
    lower.ends_with("id") && !lower.ends_with("name")
}

/// Index of the attribute that receives the primary key: the first id-like
/// name, if any.
pub fn primary_key_index<'a, I>(names: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().position(is_id_like)
}
