//! Row operation requests and their result envelopes
//!
//! Requests use the camelCase wire names of the external layer
//! (`tableName`, `fieldNames`, `pkID`, ...). Batch operations hand each request
//! back inside an [`Executed`], which serializes as the request object with a
//! `result` field attached.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Insert one row; `field_names` and `values` correspond positionally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    pub table_name: String,
    pub field_names: Vec<String>,
    pub values: Vec<Value>,
}

impl InsertRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            field_names: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append a field/value pair
    pub fn value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field_names.push(field.into());
        self.values.push(value.into());
        self
    }
}

/// Set one cell of the row whose primary key is `pk_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub table_name: String,
    pub field_name: String,
    #[serde(rename = "pkID")]
    pub pk_id: i64,
    pub value: Value,
}

impl UpdateRequest {
    pub fn new(
        table_name: impl Into<String>,
        field_name: impl Into<String>,
        pk_id: i64,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            field_name: field_name.into(),
            pk_id,
            value: value.into(),
        }
    }
}

/// Delete the row whose primary key is `pk_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub table_name: String,
    #[serde(rename = "pkID")]
    pub pk_id: i64,
}

impl DeleteRequest {
    pub fn new(table_name: impl Into<String>, pk_id: i64) -> Self {
        Self {
            table_name: table_name.into(),
            pk_id,
        }
    }
}

/// Read every row of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub table_name: String,
}

impl QueryRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }
}

/// Uniform `{success, response}` outcome shape.
///
/// On failure `response` holds the error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub response: Value,
}

impl Envelope {
    pub fn ok(response: impl Into<Value>) -> Self {
        Self {
            success: true,
            response: response.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            response: Value::String(message.into()),
        }
    }
}

impl<T: Serialize> From<Result<T>> for Envelope {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(response) => Envelope::ok(response),
                Err(e) => Envelope::err(e.to_string()),
            },
            Err(e) => Envelope::err(e.to_string()),
        }
    }
}

/// A request paired with the outcome of running it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Executed<R> {
    #[serde(flatten)]
    pub request: R,
    pub result: Envelope,
}

impl<R> Executed<R> {
    pub fn new(request: R, result: impl Into<Envelope>) -> Self {
        Self {
            request,
            result: result.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.success
    }
}
