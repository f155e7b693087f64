//! Schema data model shared by the generator and the parser.
//!
//! The JSON form is camelCase. Decoding also accepts the looser shape that
//! schema oracles tend to emit: `tables` instead of `entities`, attributes
//! given as bare names, `columns` instead of `attributes`, and
//! `relationshipName` instead of `label`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infer;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, alias = "tables")]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Schema {
    pub fn new(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Self {
        Self {
            entities,
            relationships,
        }
    }

    /// Decode a schema from JSON, accepting the lenient oracle shape.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Relationships whose `from_table` is `table`, in input order.
    pub fn relationships_from<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.iter().filter(move |r| r.from_table == table)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEntity")]
pub struct Entity {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Entity {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Build an entity whose attribute types and constraints are inferred
    /// from the names. The first id-like name becomes the primary key.
    pub fn from_names<I, S>(name: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut attributes: Vec<Attribute> =
            names.into_iter().map(Attribute::inferred).collect();
        if let Some(pk) = infer::primary_key_index(attributes.iter().map(|a| a.name.as_str())) {
            attributes[pk].primary_key = true;
        }
        Self::new(name, attributes)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn primary_key(&self) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.primary_key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub unique: bool,
    pub not_null: bool,
}

impl Attribute {
    /// Attribute with type and column constraints derived from its name.
    /// Primary keys are positional, so `primary_key` starts out false.
    pub fn inferred(name: impl Into<String>) -> Self {
        let name = name.into();
        let inference = infer::infer(&name);
        Self {
            name,
            column_type: inference.column_type,
            primary_key: false,
            unique: inference.unique,
            not_null: inference.not_null,
        }
    }

    /// Attribute carrying a type exactly as some DDL declared it.
    pub fn declared(name: impl Into<String>, declared_type: &str) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::from_declared(declared_type),
            primary_key: false,
            unique: false,
            not_null: false,
        }
    }
}

/// Column type: one of the three inferable types, or whatever a parsed
/// statement declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    Integer,
    Text,
    Date,
    Declared(String),
}

impl ColumnType {
    pub fn from_declared(declared: &str) -> Self {
        let declared = declared.trim();
        if declared.eq_ignore_ascii_case("INTEGER") {
            Self::Integer
        } else if declared.eq_ignore_ascii_case("TEXT") {
            Self::Text
        } else if declared.eq_ignore_ascii_case("DATE") {
            Self::Date
        } else {
            Self::Declared(declared.to_string())
        }
    }

    pub fn as_sql(&self) -> &str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Date => "DATE",
            Self::Declared(s) => s,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl From<String> for ColumnType {
    fn from(s: String) -> Self {
        Self::from_declared(&s)
    }
}

impl From<ColumnType> for String {
    fn from(t: ColumnType) -> Self {
        t.as_sql().to_string()
    }
}

/// Single-column foreign key, resolved by name against the schema's entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    #[serde(
        default,
        alias = "relationshipName",
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<String>,
}

impl Relationship {
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The `(fromTable, fromColumn, toTable, toColumn)` endpoints.
    pub fn endpoints(&self) -> (&str, &str, &str, &str) {
        (
            &self.from_table,
            &self.from_column,
            &self.to_table,
            &self.to_column,
        )
    }
}

// Wire shapes accepted on input. Missing fields fall back to inference.

#[derive(Deserialize)]
struct RawEntity {
    name: String,
    #[serde(default, alias = "columns")]
    attributes: Vec<RawAttribute>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttribute {
    Name(String),
    Full(RawAttributeFields),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttributeFields {
    name: String,
    #[serde(default, rename = "type")]
    column_type: Option<ColumnType>,
    #[serde(default)]
    primary_key: Option<bool>,
    #[serde(default)]
    unique: Option<bool>,
    #[serde(default)]
    not_null: Option<bool>,
}

impl RawAttribute {
    fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Full(fields) => &fields.name,
        }
    }
}

impl From<RawEntity> for Entity {
    fn from(raw: RawEntity) -> Self {
        let mut entity = Entity::from_names(raw.name, raw.attributes.iter().map(|a| a.name()));

        let explicit_pk = raw
            .attributes
            .iter()
            .any(|a| matches!(a, RawAttribute::Full(f) if f.primary_key.is_some()));

        for (attr, raw_attr) in entity.attributes.iter_mut().zip(raw.attributes) {
            let RawAttribute::Full(fields) = raw_attr else {
                continue;
            };
            if let Some(column_type) = fields.column_type {
                attr.column_type = column_type;
            }
            if explicit_pk {
                attr.primary_key = fields.primary_key.unwrap_or(false);
            }
            if let Some(unique) = fields.unique {
                attr.unique = unique;
            }
            if let Some(not_null) = fields.not_null {
                attr.not_null = not_null;
            }
        }

        entity
    }
}
