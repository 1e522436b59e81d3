//! SQLite store handle
//!
//! Wraps the connection pool for one database file. Tablewright keeps a
//! single connection by default so every statement runs against the same
//! handle, one at a time.

use anyhow::Context;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::Result;

/// Default maximum connections in the pool
const DEFAULT_MAX_CONNECTIONS: u32 = 1;

const MEMORY_PATH: &str = ":memory:";

/// Database configuration options
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Enforce FOREIGN KEY clauses
    pub foreign_keys: bool,
    /// Journal mode (default: DELETE, keeping the store a single file)
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode
    pub synchronous: SqliteSynchronous,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            foreign_keys: true,
            journal_mode: SqliteJournalMode::Delete,
            synchronous: SqliteSynchronous::Full,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the specified path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a config for an in-memory database (useful for testing)
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Switch to WAL journaling with NORMAL sync
    pub fn wal(mut self, enabled: bool) -> Self {
        if enabled {
            self.journal_mode = SqliteJournalMode::Wal;
            self.synchronous = SqliteSynchronous::Normal;
        } else {
            self.journal_mode = SqliteJournalMode::Delete;
            self.synchronous = SqliteSynchronous::Full;
        }
        self
    }

    fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

/// One column as reported by `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

/// Open store handle
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Open (creating if absent) the database described by `config`
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let base_options = if config.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
            SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(true)
        };

        let connect_options = base_options
            .journal_mode(config.journal_mode)
            .synchronous(config.synchronous)
            .foreign_keys(config.foreign_keys);

        // An in-memory database exists per connection
        let max_connections = if config.is_memory() {
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;

        debug!(path = %config.path.display(), "Database connected");
        Ok(Self { pool, config })
    }

    /// Create an in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the database configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// User tables, excluding SQLite's internal ones
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get::<String, _>("name")).collect())
    }

    /// Column layout of a table in declaration order
    pub async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = sqlx::query("SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| ColumnInfo {
                name: r.get("name"),
                declared_type: r.get("type"),
                not_null: r.get::<i64, _>("notnull") != 0,
                default: r.get("dflt_value"),
                primary_key: r.get::<i64, _>("pk") != 0,
            })
            .collect())
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        debug!(path = %self.config.path.display(), "Database closed");
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}
