//! Tablewright Core Library
//!
//! This crate provides the core functionality for Tablewright, including:
//! - Schema model (tables and fields described as data)
//! - DDL generation with the `<Table>ID` primary key convention
//! - Single-row insert/update/delete/query with uniform result envelopes
//! - Null substitution for NOT NULL columns
//! - Database lifecycle (open, close, create-and-seed, delete)

pub mod config;
pub mod error;
pub mod schema;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::schema::{ColumnType, Field, Schema, Table};
    pub use crate::storage::{
        DatabaseManager, DeleteRequest, Envelope, InsertRequest, QueryRequest, UpdateRequest,
    };
}
