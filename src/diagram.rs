//! Node/edge projection of a schema for diagram renderers.
//!
//! Positions are not computed here; this only decides what a renderer
//! draws.

use serde::Serialize;

use crate::ast::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    Tables,
    Pk,
    PkFk,
    #[default]
    All,
}

impl DetailLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tables" => Some(Self::Tables),
            "pk" => Some(Self::Pk),
            "pk_fk" => Some(Self::PkFk),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub columns: Vec<NodeColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub is_pk: bool,
    pub is_fk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DiagramGraph {
    pub fn from_schema(schema: &Schema, detail: DetailLevel) -> Self {
        let nodes: Vec<Node> = schema
            .entities
            .iter()
            .map(|e| {
                let columns = e
                    .attributes
                    .iter()
                    .filter_map(|a| {
                        let is_pk = a.primary_key;
                        let is_fk = schema
                            .relationships_from(&e.name)
                            .any(|r| r.from_column == a.name);

                        let include = match detail {
                            DetailLevel::Tables => false,
                            DetailLevel::Pk => is_pk,
                            DetailLevel::PkFk => is_pk || is_fk,
                            DetailLevel::All => true,
                        };

                        include.then(|| NodeColumn {
                            name: a.name.clone(),
                            typ: a.column_type.to_string(),
                            is_pk,
                            is_fk,
                        })
                    })
                    .collect();

                Node {
                    id: e.name.clone(),
                    columns,
                }
            })
            .collect();

        let has_node = |name: &str| nodes.iter().any(|n| n.id == name);

        let edges: Vec<Edge> = schema
            .relationships
            .iter()
            .filter(|r| has_node(&r.from_table) && has_node(&r.to_table))
            .map(|r| Edge {
                from: r.from_table.clone(),
                to: r.to_table.clone(),
                column: r.from_column.clone(),
                label: r.label.clone(),
            })
            .collect();

        DiagramGraph { nodes, edges }
    }
}
