//! In-memory schema description
//!
//! A [`Schema`] is an ordered list of [`Table`]s, each an ordered list of
//! [`Field`]s. The primary key column of every table is implicit and named
//! `<TableName>ID`; it never appears in `fields`.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::types::ColumnType;
use crate::error::Error;
use crate::Result;

/// Suffix appended to a table name to form its primary key column
pub const PK_SUFFIX: &str = "ID";

/// Primary key column name for a table (`Bod` -> `BodID`)
pub fn primary_key_column(table: &str) -> String {
    format!("{}{}", table, PK_SUFFIX)
}

/// A single declared column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default)]
    pub col_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub check: Option<String>,
    /// Name of the referenced table; the target column is `<foreign>ID`
    #[serde(default)]
    pub foreign: Option<String>,
}

impl Field {
    /// A NOT NULL, non-unique field with no default, check or reference
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
            nullable: false,
            unique: false,
            default: None,
            check: None,
            foreign: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }

    pub fn foreign(mut self, table: impl Into<String>) -> Self {
        self.foreign = Some(table.into());
        self
    }
}

/// A table and its declared fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default, alias = "autoinc")]
    pub autoincrement: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Table {
    pub fn new(name: impl Into<String>, autoincrement: bool) -> Self {
        Self {
            name: name.into(),
            autoincrement,
            fields: Vec::new(),
        }
    }

    /// Append a field, returning the table for chaining
    pub fn add_field(&mut self, field: Field) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Builder-style variant of [`Table::add_field`]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn primary_key(&self) -> String {
        primary_key_column(&self.name)
    }
}

/// A whole database description
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
}

/// Object form of a schema artifact
#[derive(Deserialize)]
struct SchemaFile {
    #[serde(default)]
    name: String,
    tables: Vec<Table>,
}

/// Accepts `{name, tables}` or a bare array of tables.
impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_array() {
            let tables: Vec<Table> = serde_json::from_value(value).map_err(D::Error::custom)?;
            Ok(Schema {
                name: String::new(),
                tables,
            })
        } else {
            let SchemaFile { name, tables } =
                serde_json::from_value(value).map_err(D::Error::custom)?;
            Ok(Schema { name, tables })
        }
    }
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Append a new empty table and return it for field additions
    pub fn add_table(&mut self, name: impl Into<String>, autoincrement: bool) -> &mut Table {
        self.tables.push(Table::new(name, autoincrement));
        let last = self.tables.len() - 1;
        &mut self.tables[last]
    }

    /// Builder-style table append
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Look up a field by table and field name
    pub fn field(&self, table: &str, field: &str) -> Option<&Field> {
        self.table(table).and_then(|t| t.field(field))
    }

    /// Foreign references naming a table that is not part of this schema.
    ///
    /// Returned as `(table, field, missing_table)`. Creation order is not
    /// checked.
    pub fn validate(&self) -> Vec<(String, String, String)> {
        self.tables
            .iter()
            .flat_map(|table| {
                table.fields.iter().filter_map(move |field| {
                    let target = field.foreign.as_deref()?;
                    if self.table(target).is_some() {
                        None
                    } else {
                        Some((table.name.clone(), field.name.clone(), target.to_string()))
                    }
                })
            })
            .collect()
    }

    /// Read a schema artifact (`{name, tables}` or a bare table array)
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::SchemaArtifact(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Write this schema as a pretty-printed JSON artifact
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
