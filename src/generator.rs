//! Forward pipeline: render a [`Schema`] as `CREATE TABLE` statements.
//!
//! Output format is a contract with the parser and with statement splitting:
//!
//! ```text
//! CREATE TABLE IF NOT EXISTS Students (
//!   Student_ID INTEGER PRIMARY KEY,
//!   Name TEXT NOT NULL
//! );
//!
//! CREATE TABLE IF NOT EXISTS Borrowings (
//!   ...
//! );
//! ```

use crate::ast::{Attribute, Entity, Relationship, Schema};
use crate::infer;

/// Render every entity in input order, separated by one blank line.
/// An empty schema renders as an empty string.
pub fn generate(schema: &Schema) -> String {
    schema
        .entities
        .iter()
        .map(|entity| generate_table(entity, schema.relationships_from(&entity.name)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Table names are the entity name plus `s`. Irregular plurals are not
/// handled (`Category` becomes `Categorys`).
pub fn pluralize(name: &str) -> String {
    format!("{name}s")
}

/// `DROP TABLE IF EXISTS` for each name, one per line.
pub fn generate_drop_tables<S: AsRef<str>>(table_names: &[S]) -> String {
    if table_names.is_empty() {
        return "-- No tables to drop".to_string();
    }

    table_names
        .iter()
        .map(|name| format!("DROP TABLE IF EXISTS {};", name.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn generate_table<'a>(
    entity: &Entity,
    relationships: impl Iterator<Item = &'a Relationship>,
) -> String {
    let primary_key =
        infer::primary_key_index(entity.attributes.iter().map(|a| a.name.as_str()));

    let mut lines: Vec<String> = entity
        .attributes
        .iter()
        .enumerate()
        .map(|(i, attr)| column_line(attr, primary_key == Some(i)))
        .collect();
    lines.extend(relationships.map(foreign_key_line));

    let mut output = format!("CREATE TABLE IF NOT EXISTS {} (\n", pluralize(&entity.name));
    if !lines.is_empty() {
        output.push_str(&lines.join(",\n"));
        output.push('\n');
    }
    output.push_str(");");
    output
}

fn column_line(attr: &Attribute, primary_key: bool) -> String {
    let inference = infer::infer(&attr.name);
    let mut line = format!("  {} {}", attr.name, inference.column_type);
    for constraint in inference.constraints(primary_key) {
        line.push(' ');
        line.push_str(constraint.as_sql());
    }
    line
}

fn foreign_key_line(rel: &Relationship) -> String {
    format!(
        "  FOREIGN KEY ({}) REFERENCES {}({})",
        rel.from_column,
        pluralize(&rel.to_table),
        rel.to_column
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Entity, Relationship, Schema};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_single_entity() {
        let schema = Schema::new(
            vec![Entity::from_names("Student", ["Student_ID", "Name", "Email"])],
            vec![],
        );

        assert_eq!(
            generate(&schema),
            "CREATE TABLE IF NOT EXISTS Students (\n  Student_ID INTEGER PRIMARY KEY,\n  Name TEXT NOT NULL,\n  Email TEXT UNIQUE\n);"
        );
    }

    #[test]
    fn test_generate_with_foreign_keys() {
        let schema = Schema::new(
            vec![
                Entity::from_names("Member", ["Member_ID", "Name"]),
                Entity::from_names(
                    "Training_Session",
                    ["Session_ID", "Member_ID", "Trainer_ID", "Date"],
                ),
            ],
            vec![
                Relationship::new("Training_Session", "Member_ID", "Member", "Member_ID"),
                Relationship::new("Training_Session", "Trainer_ID", "Trainer", "Trainer_ID"),
            ],
        );

        let expected = "\
CREATE TABLE IF NOT EXISTS Members (
  Member_ID INTEGER PRIMARY KEY,
  Name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS Training_Sessions (
  Session_ID INTEGER PRIMARY KEY,
  Member_ID INTEGER,
  Trainer_ID INTEGER,
  Date DATE,
  FOREIGN KEY (Member_ID) REFERENCES Members(Member_ID),
  FOREIGN KEY (Trainer_ID) REFERENCES Trainers(Trainer_ID)
);";
        assert_eq!(generate(&schema), expected);
    }

    #[test]
    fn test_relationships_of_other_tables_do_not_add_commas() {
        let schema = Schema::new(
            vec![
                Entity::from_names("Student", ["Student_ID", "Name"]),
                Entity::from_names("Borrowing", ["Borrowing_ID", "Student_ID"]),
            ],
            vec![Relationship::new("Borrowing", "Student_ID", "Student", "Student_ID")],
        );

        let sql = generate(&schema);
        assert!(sql.starts_with(
            "CREATE TABLE IF NOT EXISTS Students (\n  Student_ID INTEGER PRIMARY KEY,\n  Name TEXT NOT NULL\n);"
        ));
    }

    #[test]
    fn test_at_most_one_primary_key() {
        let schema = Schema::new(
            vec![Entity::from_names("Enrollment", ["Enrollment_ID", "Student_ID", "Course_ID"])],
            vec![],
        );

        assert_eq!(generate(&schema).matches("PRIMARY KEY").count(), 1);
    }

    #[test]
    fn test_no_id_means_no_primary_key() {
        let schema = Schema::new(vec![Entity::from_names("Note", ["Title", "Body"])], vec![]);

        assert_eq!(
            generate(&schema),
            "CREATE TABLE IF NOT EXISTS Notes (\n  Title TEXT,\n  Body TEXT\n);"
        );
    }

    #[test]
    fn test_types_are_reinferred_from_names() {
        let mut entity = Entity::from_names("Book", ["Book_ID"]);
        entity.attributes[0].column_type = crate::ast::ColumnType::Declared("UUID".into());
        let schema = Schema::new(vec![entity], vec![]);

        assert!(generate(&schema).contains("Book_ID INTEGER PRIMARY KEY"));
    }

    #[test]
    fn test_empty_schema() {
        assert_eq!(generate(&Schema::default()), "");
    }

    #[test]
    fn test_irregular_plural_is_kept() {
        assert_eq!(pluralize("Category"), "Categorys");
    }

    #[test]
    fn test_drop_tables() {
        assert_eq!(
            generate_drop_tables(&["Students", "Books"]),
            "DROP TABLE IF EXISTS Students;\nDROP TABLE IF EXISTS Books;"
        );
        assert_eq!(generate_drop_tables::<&str>(&[]), "-- No tables to drop");
    }
}
