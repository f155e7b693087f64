pub mod ast;
pub mod config;
pub mod diagram;
pub mod generator;
pub mod infer;
pub mod oracle;
pub mod pipeline;
pub mod sink;
pub mod sql;
pub mod validate;

use wasm_bindgen::prelude::*;

pub use ast::{Attribute, ColumnType, Entity, Relationship, Schema};
pub use generator::{generate, generate_drop_tables, pluralize};
pub use sql::{ParseGap, ParseReport, parse_sql, parse_sql_with_report, split_statements};

use diagram::{DetailLevel, DiagramGraph};
use oracle::OracleOutput;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

/// Render a JSON schema to `CREATE TABLE` DDL
#[wasm_bindgen(js_name = "schemaToSql")]
pub fn schema_to_sql(json: &str) -> Result<String, JsValue> {
    let schema = Schema::from_json(json).map_err(js_error)?;
    Ok(generate(&schema))
}

/// Parse DDL into a JSON schema
#[wasm_bindgen(js_name = "sqlToSchema")]
pub fn sql_to_schema(sql: &str) -> Result<String, JsValue> {
    parse_sql(sql).to_json(false).map_err(js_error)
}

/// Turn a raw oracle reply into `{ "sql": ..., "schema": ... }`
#[wasm_bindgen(js_name = "normalizeResponse")]
pub fn normalize_response(text: Option<String>) -> Result<String, JsValue> {
    let output = text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(OracleOutput::from_response);
    serde_json::to_string(&pipeline::normalize(output)).map_err(js_error)
}

/// Split a script into executable statements
#[wasm_bindgen(js_name = "splitSql")]
pub fn split_sql(sql: &str) -> Vec<String> {
    split_statements(sql)
}

/// Project DDL onto diagram nodes and edges
#[wasm_bindgen(js_name = "sqlToDiagram")]
pub fn sql_to_diagram(sql: &str, detail: Option<String>) -> Result<String, JsValue> {
    let detail_level = detail
        .as_deref()
        .and_then(DetailLevel::from_str)
        .unwrap_or(DetailLevel::All);

    let graph = DiagramGraph::from_schema(&parse_sql(sql), detail_level);
    serde_json::to_string(&graph).map_err(js_error)
}
