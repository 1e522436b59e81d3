//! Schema layer - type registry, schema model, and DDL generation
//!
//! # Architecture
//!
//! - `types`: Column type registry (native names and null defaults)
//! - `model`: Tables and fields as data, plus the JSON schema artifact
//! - `ddl`: Deterministic CREATE TABLE generation
//!
//! # Usage
//!
//! ```
//! use tablewright_core::schema::{create_schema_sql, ColumnType, Field, Schema};
//!
//! let mut schema = Schema::new("auctionDB");
//! schema
//!     .add_table("Permission", true)
//!     .add_field(Field::new("Name", ColumnType::Text));
//!
//! let sql = create_schema_sql(&schema);
//! assert!(sql.starts_with("CREATE TABLE 'Permission'"));
//! ```

pub mod ddl;
pub mod model;
pub mod types;

pub use ddl::{create_schema_sql, create_table_sql, sql_literal};
pub use model::{primary_key_column, Field, Schema, Table, PK_SUFFIX};
pub use types::{ColumnType, UnsupportedType};
