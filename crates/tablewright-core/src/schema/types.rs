//! Column type registry
//!
//! Maps the abstract column types a schema may declare to SQLite type names
//! and to the value substituted for a null bound into a NOT NULL column.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Abstract column type.
///
/// Serialized as its numeric code (`INTEGER = 1`, `TEXT = 2`, `BLOB = 3`,
/// `REAL = 4`, `NUMERIC = 5`). Unknown codes survive a load/save cycle as
/// [`ColumnType::Unrecognized`]. A missing or null type, an unknown type
/// name, or any other value loads as [`ColumnType::Untyped`] and is saved as
/// `null`. Neither produces a type name in DDL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ColumnTypeRepr", into = "ColumnTypeRepr")]
pub enum ColumnType {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
    Unrecognized(i64),
    #[default]
    Untyped,
}

/// Returned by [`ColumnType::default_value`] for types without a null default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedType(pub ColumnType);

impl fmt::Display for UnsupportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no null default for column type {}", self.0)
    }
}

impl std::error::Error for UnsupportedType {}

impl ColumnType {
    /// Every supported variant, in code order
    pub const ALL: [ColumnType; 5] = [
        ColumnType::Integer,
        ColumnType::Text,
        ColumnType::Blob,
        ColumnType::Real,
        ColumnType::Numeric,
    ];

    /// SQLite type name, or `None` for an unrecognized code.
    pub fn native_name(self) -> Option<&'static str> {
        match self {
            ColumnType::Integer => Some("INTEGER"),
            ColumnType::Text => Some("TEXT"),
            ColumnType::Blob => Some("BLOB"),
            ColumnType::Real => Some("REAL"),
            ColumnType::Numeric => Some("NUMERIC"),
            ColumnType::Unrecognized(_) | ColumnType::Untyped => None,
        }
    }

    /// Value bound in place of null when the column is NOT NULL.
    ///
    /// Only TEXT, INTEGER and REAL have one.
    pub fn default_value(self) -> Result<Value, UnsupportedType> {
        match self {
            ColumnType::Text => Ok(Value::String(String::new())),
            ColumnType::Integer => Ok(Value::from(0i64)),
            ColumnType::Real => Ok(Value::from(0.0f64)),
            other => Err(UnsupportedType(other)),
        }
    }

    /// Numeric wire code; `None` for [`ColumnType::Untyped`]
    pub fn code(self) -> Option<i64> {
        match self {
            ColumnType::Integer => Some(1),
            ColumnType::Text => Some(2),
            ColumnType::Blob => Some(3),
            ColumnType::Real => Some(4),
            ColumnType::Numeric => Some(5),
            ColumnType::Unrecognized(code) => Some(code),
            ColumnType::Untyped => None,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ColumnType::Integer,
            2 => ColumnType::Text,
            3 => ColumnType::Blob,
            4 => ColumnType::Real,
            5 => ColumnType::Numeric,
            other => ColumnType::Unrecognized(other),
        }
    }

    /// Parse a type name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.native_name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.native_name(), self.code()) {
            (Some(name), _) => f.write_str(name),
            (None, Some(code)) => write!(f, "<unrecognized {}>", code),
            (None, None) => f.write_str("<untyped>"),
        }
    }
}

/// Wire shapes: the numeric code, the type name, or anything else.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColumnTypeRepr {
    Code(i64),
    Name(String),
    Missing,
    Invalid(Value),
}

impl From<ColumnTypeRepr> for ColumnType {
    fn from(repr: ColumnTypeRepr) -> Self {
        match repr {
            ColumnTypeRepr::Code(code) => ColumnType::from_code(code),
            ColumnTypeRepr::Name(name) => ColumnType::from_name(&name).unwrap_or_else(|| {
                debug!(name = %name, "Unknown column type name, type omitted");
                ColumnType::Untyped
            }),
            ColumnTypeRepr::Missing => ColumnType::Untyped,
            ColumnTypeRepr::Invalid(value) => {
                debug!(value = %value, "Invalid column type, type omitted");
                ColumnType::Untyped
            }
        }
    }
}

impl From<ColumnType> for ColumnTypeRepr {
    fn from(ty: ColumnType) -> Self {
        match ty.code() {
            Some(code) => ColumnTypeRepr::Code(code),
            None => ColumnTypeRepr::Missing,
        }
    }
}
