//! Storage layer - SQLite store handle, row operations, and lifecycle
//!
//! # Architecture
//!
//! - `database`: Connection pool management and introspection
//! - `request`: Row operation requests and `{success, response}` envelopes
//! - `executor`: Insert, update-then-reread, delete, and query
//! - `seed`: Seed artifacts for database creation
//! - `manager`: Open/close/create/delete of one database at a time
//!
//! # Usage
//!
//! ```ignore
//! use tablewright_core::config::Config;
//! use tablewright_core::storage::{DatabaseManager, InsertRequest};
//!
//! let mut manager = DatabaseManager::new(&Config::load()?);
//! let report = manager.create_database("auctionDB").await?;
//! let pk = manager
//!     .insert_record(&InsertRequest::new("Permission").value("Name", "Admin"))
//!     .await?;
//! ```

pub mod database;
pub mod executor;
pub mod manager;
pub mod request;
pub mod seed;

// Re-export commonly used types
pub use database::{ColumnInfo, Database, DatabaseConfig};
pub use executor::{RowExecutor, ZeroRowDelete};
pub use manager::{CreationReport, DatabaseManager, DeletionReport, FileRemoval, TableCreation};
pub use request::{
    DeleteRequest, Envelope, Executed, InsertRequest, QueryRequest, UpdateRequest,
};
pub use seed::SeedData;
