//! CREATE TABLE generation
//!
//! Pure translation of a [`Schema`] into SQLite DDL. Nothing here fails: a
//! field whose type has no native name simply gets no type word.
//!
//! Names and string defaults are wrapped in single quotes and otherwise
//! emitted verbatim. Callers must not pass untrusted names or defaults that
//! contain quotes.

use serde_json::Value;

use super::model::{Field, Schema, Table};

const INDENT: &str = "  ";

/// DDL for every table in schema order, separated by a blank line
pub fn create_schema_sql(schema: &Schema) -> String {
    schema
        .tables
        .iter()
        .map(create_table_sql)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// DDL for one table: primary key line, field lines, then foreign key lines
pub fn create_table_sql(table: &Table) -> String {
    let mut lines = Vec::with_capacity(table.fields.len() + 1);
    lines.push(primary_key_line(table));
    lines.extend(table.fields.iter().map(field_line));
    lines.extend(table.fields.iter().filter_map(foreign_key_line));

    format!("CREATE TABLE '{}' (\n{}\n);", table.name, lines.join(",\n"))
}

fn primary_key_line(table: &Table) -> String {
    format!(
        "{}'{}' INTEGER NOT NULL PRIMARY KEY {}UNIQUE",
        INDENT,
        table.primary_key(),
        if table.autoincrement { "AUTOINCREMENT " } else { "" }
    )
}

fn field_line(field: &Field) -> String {
    let mut words = vec![format!("{}'{}'", INDENT, field.name)];
    if let Some(native) = field.col_type.native_name() {
        words.push(native.to_string());
    }
    if !field.nullable {
        words.push("NOT NULL".to_string());
    }
    if let Some(default) = field.default.as_ref().filter(|v| !v.is_null()) {
        words.push(format!("DEFAULT {}", sql_literal(default)));
    }
    if let Some(check) = field.check.as_deref().filter(|c| !c.is_empty()) {
        words.push(format!("CHECK ({})", check));
    }
    if field.unique {
        words.push("UNIQUE".to_string());
    }
    words.join(" ")
}

fn foreign_key_line(field: &Field) -> Option<String> {
    let target = field.foreign.as_deref().filter(|t| !t.is_empty())?;
    Some(format!(
        "{}FOREIGN KEY ('{}') REFERENCES '{}'({}ID)",
        INDENT, field.name, target, target
    ))
}

/// Strings are single-quoted; everything else is written as-is.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}
