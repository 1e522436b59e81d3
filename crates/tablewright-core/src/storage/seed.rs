//! Seed artifacts consumed by database creation
//!
//! ```text
//! seed/<name>/
//! ├── tables.json    array of table definitions
//! └── inserts.json   array of insert requests (optional)
//! ```

use std::fs;
use std::path::Path;
use tracing::debug;

use super::request::InsertRequest;
use crate::config::StorageConfig;
use crate::error::Error;
use crate::schema::{Schema, Table};
use crate::Result;

/// Initial schema and rows for a new database
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedData {
    pub tables: Vec<Table>,
    pub inserts: Vec<InsertRequest>,
}

impl SeedData {
    /// Load the seed artifacts for `name` from the configured seed directory
    pub fn load(storage: &StorageConfig, name: &str) -> Result<Self> {
        Self::load_from(
            &storage.seed_tables_path(name),
            &storage.seed_inserts_path(name),
        )
    }

    /// Load from explicit paths. A missing inserts file means no seed rows.
    pub fn load_from(tables_path: &Path, inserts_path: &Path) -> Result<Self> {
        let tables: Vec<Table> = read_json(tables_path)?;
        let inserts: Vec<InsertRequest> = if inserts_path.exists() {
            read_json(inserts_path)?
        } else {
            debug!(path = %inserts_path.display(), "No seed inserts");
            Vec::new()
        };

        Ok(Self { tables, inserts })
    }

    /// Schema model named `name` holding the seed tables
    pub fn schema(&self, name: &str) -> Schema {
        Schema {
            name: name.to_string(),
            tables: self.tables.clone(),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::SchemaArtifact(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::SchemaArtifact(format!("failed to parse {}: {}", path.display(), e)))
}
