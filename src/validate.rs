//! Structural checks on a schema.
//!
//! Problems are reported, never raised: both pipelines still run on a schema
//! with issues, and the caller decides what to do with the list.

use std::collections::HashSet;

use thiserror::Error;

use crate::ast::Schema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaIssue {
    #[error("entity #{index} has an empty name")]
    EmptyEntityName { index: usize },
    #[error("entity {entity} has an attribute with an empty name")]
    EmptyAttributeName { entity: String },
    #[error("entity {entity} is declared more than once")]
    DuplicateEntity { entity: String },
    #[error("entity {entity} declares attribute {attribute} more than once")]
    DuplicateAttribute { entity: String, attribute: String },
    #[error("entity {entity} has no attributes")]
    NoAttributes { entity: String },
    #[error("relationship {from_table}.{from_column} refers to missing table {table}")]
    MissingTable {
        from_table: String,
        from_column: String,
        table: String,
    },
    #[error("relationship refers to missing column {table}.{column}")]
    MissingColumn { table: String, column: String },
}

pub fn validate(schema: &Schema) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    let mut seen_entities = HashSet::new();

    for (index, entity) in schema.entities.iter().enumerate() {
        if entity.name.trim().is_empty() {
            issues.push(SchemaIssue::EmptyEntityName { index });
        } else if !seen_entities.insert(entity.name.as_str()) {
            issues.push(SchemaIssue::DuplicateEntity {
                entity: entity.name.clone(),
            });
        }

        if entity.attributes.is_empty() {
            issues.push(SchemaIssue::NoAttributes {
                entity: entity.name.clone(),
            });
        }

        let mut seen_attributes = HashSet::new();
        for attr in &entity.attributes {
            if attr.name.trim().is_empty() {
                issues.push(SchemaIssue::EmptyAttributeName {
                    entity: entity.name.clone(),
                });
            } else if !seen_attributes.insert(attr.name.as_str()) {
                issues.push(SchemaIssue::DuplicateAttribute {
                    entity: entity.name.clone(),
                    attribute: attr.name.clone(),
                });
            }
        }
    }

    for rel in &schema.relationships {
        for (table, column) in [
            (&rel.from_table, &rel.from_column),
            (&rel.to_table, &rel.to_column),
        ] {
            match schema.entity(table) {
                None => issues.push(SchemaIssue::MissingTable {
                    from_table: rel.from_table.clone(),
                    from_column: rel.from_column.clone(),
                    table: table.clone(),
                }),
                Some(entity) if entity.attribute(column).is_none() => {
                    issues.push(SchemaIssue::MissingColumn {
                        table: table.clone(),
                        column: column.clone(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    issues
}
