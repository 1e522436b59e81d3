//! Single-row operations
//!
//! Every operation runs one parameterized statement (update runs a write and
//! a read) against the open [`Database`] and returns a [`Result`]. Batch
//! variants run each request in order and never stop early; each element
//! carries its own outcome.
//!
//! Null substitution: when a request binds null to a field the active schema
//! declares NOT NULL, the field type's registry default is bound instead
//! (`""` for TEXT, `0` for INTEGER, `0.0` for REAL). Fields the schema does
//! not know are bound as given, so the store reports its own NOT NULL
//! violation.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use super::database::Database;
use super::request::{DeleteRequest, Executed, InsertRequest, QueryRequest, UpdateRequest};
use crate::error::Error;
use crate::schema::{create_schema_sql, create_table_sql, primary_key_column, Schema, Table};
use crate::Result;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// How a delete that touched a row count other than one is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroRowDelete {
    /// Any count other than 1 is [`Error::UnexpectedRowCount`]
    #[default]
    Fail,
    /// Return the count, whatever it is
    Succeed,
}

impl ZeroRowDelete {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Succeed => "succeed",
        }
    }
}

impl fmt::Display for ZeroRowDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZeroRowDelete {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "succeed" => Ok(Self::Succeed),
            _ => Err(Error::InvalidInput(format!(
                "Invalid zero_row_delete policy: {}. Valid options: fail, succeed",
                s
            ))),
        }
    }
}

/// Runs row operations against an open database
pub struct RowExecutor<'a> {
    db: &'a Database,
    schema: Option<&'a Schema>,
    zero_row_delete: ZeroRowDelete,
}

impl<'a> RowExecutor<'a> {
    /// Executor with no schema (no null substitution) and the default delete policy
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            schema: None,
            zero_row_delete: ZeroRowDelete::default(),
        }
    }

    /// Schema consulted for null substitution
    pub fn with_schema(mut self, schema: Option<&'a Schema>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_zero_row_delete(mut self, policy: ZeroRowDelete) -> Self {
        self.zero_row_delete = policy;
        self
    }

    /// Create one table from its description
    pub async fn create_table(&self, table: &Table) -> Result<()> {
        let sql = create_table_sql(table);
        debug!(table = %table.name, sql = %sql, "Creating table");
        sqlx::raw_sql(&sql).execute(self.db.pool()).await?;
        Ok(())
    }

    /// Apply the DDL for every table of `schema` as one batch.
    ///
    /// Tables created before a failing statement are kept.
    pub async fn generate(&self, schema: &Schema) -> Result<()> {
        let sql = create_schema_sql(schema);
        debug!(schema = %schema.name, tables = schema.tables.len(), "Generating schema");
        sqlx::raw_sql(&sql).execute(self.db.pool()).await?;
        Ok(())
    }

    /// Insert one row, returning the generated primary key
    pub async fn insert(&self, request: &InsertRequest) -> Result<i64> {
        if request.field_names.len() != request.values.len() {
            return Err(Error::InvalidInput(format!(
                "{} field names but {} values for table '{}'",
                request.field_names.len(),
                request.values.len(),
                request.table_name
            )));
        }

        let sql = format!(
            "INSERT INTO {}({}) VALUES ({})",
            request.table_name,
            request.field_names.join(","),
            vec!["?"; request.values.len()].join(",")
        );

        let mut query = sqlx::query(&sql);
        for (field, value) in request.field_names.iter().zip(&request.values) {
            query = bind_value(query, self.substitute_null(&request.table_name, field, value))?;
        }

        let pk_id = query.execute(self.db.pool()).await?.last_insert_rowid();
        debug!(table = %request.table_name, pk_id, "Row inserted");
        Ok(pk_id)
    }

    /// Set one cell, then read it back.
    ///
    /// Returns the stored value, not the requested one. If the write succeeds
    /// but the read fails (for example the row does not exist), the read's
    /// error is returned and the write's success is not reported.
    pub async fn update(&self, request: &UpdateRequest) -> Result<Value> {
        let table = &request.table_name;
        let field = &request.field_name;
        let pk = primary_key_column(table);
        let value = self.substitute_null(table, field, &request.value);

        let sql = format!("UPDATE {} SET {} = ? WHERE {} = ?", table, field, pk);
        bind_value(sqlx::query(&sql), value)?
            .bind(request.pk_id)
            .execute(self.db.pool())
            .await?;

        let sql = format!("SELECT {} FROM {} WHERE {} = ?", field, table, pk);
        let row = sqlx::query(&sql)
            .bind(request.pk_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| Error::RowNotFound {
                table: table.clone(),
                pk_id: request.pk_id,
            })?;

        let stored = cell_value(&row, 0)?;
        debug!(table = %table, field = %field, pk_id = request.pk_id, "Cell updated");
        Ok(stored)
    }

    /// Delete one row by primary key, returning the affected-row count
    pub async fn delete(&self, request: &DeleteRequest) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            request.table_name,
            primary_key_column(&request.table_name)
        );
        let affected = sqlx::query(&sql)
            .bind(request.pk_id)
            .execute(self.db.pool())
            .await?
            .rows_affected();

        debug!(table = %request.table_name, pk_id = request.pk_id, affected, "Delete executed");
        if self.zero_row_delete == ZeroRowDelete::Fail && affected != 1 {
            return Err(Error::UnexpectedRowCount { affected });
        }
        Ok(affected)
    }

    /// Every row of a table as JSON objects keyed by column name
    pub async fn query(&self, request: &QueryRequest) -> Result<Vec<Value>> {
        let sql = format!("SELECT * FROM {}", request.table_name);
        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;
        debug!(table = %request.table_name, rows = rows.len(), "Table queried");
        rows.iter().map(row_to_json).collect()
    }

    pub async fn insert_all(&self, requests: &[InsertRequest]) -> Vec<Executed<InsertRequest>> {
        let mut executed = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = self.insert(request).await;
            if let Err(e) = &outcome {
                warn!(table = %request.table_name, error = %e, "Insert failed");
            }
            executed.push(Executed::new(request.clone(), outcome));
        }
        executed
    }

    pub async fn update_all(&self, requests: &[UpdateRequest]) -> Vec<Executed<UpdateRequest>> {
        let mut executed = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = self.update(request).await;
            if let Err(e) = &outcome {
                warn!(table = %request.table_name, pk_id = request.pk_id, error = %e, "Update failed");
            }
            executed.push(Executed::new(request.clone(), outcome));
        }
        executed
    }

    pub async fn delete_all(&self, requests: &[DeleteRequest]) -> Vec<Executed<DeleteRequest>> {
        let mut executed = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = self.delete(request).await;
            if let Err(e) = &outcome {
                warn!(table = %request.table_name, pk_id = request.pk_id, error = %e, "Delete failed");
            }
            executed.push(Executed::new(request.clone(), outcome));
        }
        executed
    }

    /// Value to bind for `table.field`, after null substitution
    pub fn substitute_null(&self, table: &str, field: &str, value: &Value) -> Value {
        if !value.is_null() {
            return value.clone();
        }
        let Some(declared) = self.schema.and_then(|s| s.field(table, field)) else {
            return Value::Null;
        };
        if declared.nullable {
            return Value::Null;
        }
        match declared.col_type.default_value() {
            Ok(default) => {
                debug!(table, field, "Substituting type default for null");
                default
            }
            Err(_) => Value::Null,
        }
    }
}

/// Bind a JSON value by its natural SQLite storage class.
///
/// Integers above `i64::MAX` are rejected rather than stored as REAL.
fn bind_value<'q>(query: SqliteQuery<'q>, value: Value) -> Result<SqliteQuery<'q>> {
    let query = match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if n.is_u64() {
                return Err(Error::InvalidInput(format!(
                    "integer {} is out of range for a 64-bit signed column",
                    n
                )));
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s),
        nested => query.bind(nested.to_string()),
    };
    Ok(query)
}

/// Convert a row into a JSON object keyed by column name
pub(crate) fn row_to_json(row: &SqliteRow) -> Result<Value> {
    let mut map = Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), cell_value(row, index)?);
    }
    Ok(Value::Object(map))
}

/// Decode one cell by the storage class of the value actually stored
fn cell_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_string();

    let value = match storage_class.as_str() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(index)?),
        "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(index)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => Value::String(
            base64::engine::general_purpose::STANDARD.encode(row.try_get::<Vec<u8>, _>(index)?),
        ),
        _ => Value::String(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}
