//! Database lifecycle
//!
//! A [`DatabaseManager`] holds at most one open store handle together with
//! the schema artifact loaded for it. State is Closed -> Open -> Closed;
//! deleting a database closes it first.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::database::Database;
use super::executor::{RowExecutor, ZeroRowDelete};
use super::request::{
    DeleteRequest, Envelope, Executed, InsertRequest, QueryRequest, UpdateRequest,
};
use super::seed::SeedData;
use crate::config::{Config, StorageConfig};
use crate::error::Error;
use crate::schema::{Schema, Table};
use crate::Result;

/// Outcome of creating one table during database creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCreation {
    pub table: String,
    pub result: Envelope,
}

/// Everything that happened while creating and seeding a database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreationReport {
    pub tables: Vec<TableCreation>,
    pub inserts: Vec<Executed<InsertRequest>>,
}

impl CreationReport {
    /// Number of failed table creations and inserts
    pub fn failures(&self) -> usize {
        self.tables.iter().filter(|t| !t.result.success).count()
            + self.inserts.iter().filter(|i| !i.is_success()).count()
    }
}

/// One attempted file removal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRemoval {
    pub path: PathBuf,
    pub error: Option<String>,
}

/// Per-file outcome of deleting a database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletionReport {
    pub removals: Vec<FileRemoval>,
}

impl DeletionReport {
    pub fn is_clean(&self) -> bool {
        self.removals.iter().all(|r| r.error.is_none())
    }
}

#[derive(Debug)]
struct OpenDatabase {
    name: String,
    db: Database,
    schema: Option<Schema>,
}

/// Owns the open store handle and its schema
#[derive(Debug)]
pub struct DatabaseManager {
    storage: StorageConfig,
    zero_row_delete: ZeroRowDelete,
    open: Option<OpenDatabase>,
}

impl DatabaseManager {
    pub fn new(config: &Config) -> Self {
        Self {
            storage: config.storage.clone(),
            zero_row_delete: config.rows.zero_row_delete,
            open: None,
        }
    }

    pub fn with_storage(storage: StorageConfig) -> Self {
        Self {
            storage,
            zero_row_delete: ZeroRowDelete::default(),
            open: None,
        }
    }

    pub fn zero_row_delete(mut self, policy: ZeroRowDelete) -> Self {
        self.zero_row_delete = policy;
        self
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Name of the open database
    pub fn name(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.name.as_str())
    }

    pub fn database(&self) -> Option<&Database> {
        self.open.as_ref().map(|o| &o.db)
    }

    /// Schema loaded with the open database, if it had an artifact
    pub fn schema(&self) -> Option<&Schema> {
        self.open.as_ref().and_then(|o| o.schema.as_ref())
    }

    /// Open `<data_dir>/<name>.db`, creating it if absent, and load its
    /// schema artifact.
    ///
    /// Opening while another database is open closes the previous one.
    pub async fn open(&mut self, name: &str) -> Result<()> {
        if let Some(current) = self.name().map(str::to_string) {
            warn!(current = %current, requested = %name, "Database already open, closing it first");
            self.close().await;
        }

        let schema_path = self.storage.schema_path(name);
        let schema = if schema_path.exists() {
            Some(Schema::load(&schema_path)?)
        } else {
            debug!(path = %schema_path.display(), "No schema artifact, null substitution disabled");
            None
        };

        let db = Database::new(self.storage.database_config(name)).await?;
        info!(name = %name, path = %db.path().display(), "Database opened");

        self.open = Some(OpenDatabase {
            name: name.to_string(),
            db,
            schema,
        });
        Ok(())
    }

    /// Release the handle and forget the schema. No-op when nothing is open.
    pub async fn close(&mut self) {
        if let Some(open) = self.open.take() {
            open.db.close().await;
            info!(name = %open.name, "Database closed");
        }
    }

    /// Close, then remove the store file and its schema artifact.
    ///
    /// Each removal is attempted and reported on its own.
    pub async fn delete_database(&mut self, name: &str) -> DeletionReport {
        self.close().await;

        let removals = [self.storage.database_path(name), self.storage.schema_path(name)]
            .into_iter()
            .map(|path| {
                let error = match fs::remove_file(&path) {
                    Ok(()) => {
                        debug!(path = %path.display(), "Removed");
                        None
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to remove file");
                        Some(e.to_string())
                    }
                };
                FileRemoval { path, error }
            })
            .collect();

        info!(name = %name, "Database deleted");
        DeletionReport { removals }
    }

    /// Create and seed `name` from the seed artifacts in the seed directory
    pub async fn create_database(&mut self, name: &str) -> Result<CreationReport> {
        let seed = SeedData::load(&self.storage, name)?;
        self.create_database_with(name, seed.schema(name), &seed.inserts)
            .await
    }

    /// Write the schema artifact, open the store, create every table, then
    /// run the seed inserts.
    ///
    /// A table that fails to create is reported and the remaining tables are
    /// still attempted.
    pub async fn create_database_with(
        &mut self,
        name: &str,
        mut schema: Schema,
        inserts: &[InsertRequest],
    ) -> Result<CreationReport> {
        if schema.name.is_empty() {
            schema.name = name.to_string();
        }
        for (table, field, missing) in schema.validate() {
            warn!(table = %table, field = %field, missing = %missing, "Foreign key references a table outside the schema");
        }

        schema.save(&self.storage.schema_path(name))?;
        self.open(name).await?;

        let exec = self.executor()?;
        let mut tables = Vec::with_capacity(schema.tables.len());
        for table in &schema.tables {
            let outcome = exec.create_table(table).await;
            if let Err(e) = &outcome {
                warn!(table = %table.name, error = %e, "Table creation failed");
            }
            tables.push(TableCreation {
                table: table.name.clone(),
                result: outcome.into(),
            });
        }

        let inserts = exec.insert_all(inserts).await;

        let report = CreationReport { tables, inserts };
        info!(
            name = %name,
            tables = report.tables.len(),
            inserts = report.inserts.len(),
            failures = report.failures(),
            "Database created"
        );
        Ok(report)
    }

    /// Executor bound to the open database and its schema
    pub fn executor(&self) -> Result<RowExecutor<'_>> {
        let open = self.open.as_ref().ok_or(Error::DatabaseNotOpen)?;
        Ok(RowExecutor::new(&open.db)
            .with_schema(open.schema.as_ref())
            .with_zero_row_delete(self.zero_row_delete))
    }

    pub async fn create_table(&self, table: &Table) -> Result<()> {
        self.executor()?.create_table(table).await
    }

    pub async fn insert_record(&self, request: &InsertRequest) -> Result<i64> {
        self.executor()?.insert(request).await
    }

    pub async fn update_cell(&self, request: &UpdateRequest) -> Result<Value> {
        self.executor()?.update(request).await
    }

    pub async fn delete_record(&self, request: &DeleteRequest) -> Result<u64> {
        self.executor()?.delete(request).await
    }

    pub async fn query_table(&self, request: &QueryRequest) -> Result<Vec<Value>> {
        self.executor()?.query(request).await
    }

    pub async fn insert_records(&self, requests: &[InsertRequest]) -> Vec<Executed<InsertRequest>> {
        match self.executor() {
            Ok(exec) => exec.insert_all(requests).await,
            Err(e) => reject_all(requests, &e),
        }
    }

    pub async fn update_cells(&self, requests: &[UpdateRequest]) -> Vec<Executed<UpdateRequest>> {
        match self.executor() {
            Ok(exec) => exec.update_all(requests).await,
            Err(e) => reject_all(requests, &e),
        }
    }

    pub async fn delete_records(&self, requests: &[DeleteRequest]) -> Vec<Executed<DeleteRequest>> {
        match self.executor() {
            Ok(exec) => exec.delete_all(requests).await,
            Err(e) => reject_all(requests, &e),
        }
    }
}

fn reject_all<R: Clone>(requests: &[R], error: &Error) -> Vec<Executed<R>> {
    requests
        .iter()
        .map(|r| Executed::new(r.clone(), Envelope::err(error.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, Field};
    use serde_json::json;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> DatabaseManager {
        DatabaseManager::with_storage(StorageConfig {
            data_dir: dir.path().join("database"),
            seed_dir: dir.path().join("seed"),
            ..Default::default()
        })
    }

    fn schema() -> Schema {
        Schema::new("shop").with_table(
            Table::new("Item", true)
                .with_field(Field::new("Label", ColumnType::Text))
                .with_field(Field::new("Qty", ColumnType::Integer)),
        )
    }

    #[tokio::test]
    async fn test_operations_require_open_database() {
        let dir = TempDir::new().unwrap();
        let mgr = manager(&dir);

        let err = mgr.query_table(&QueryRequest::new("Item")).await.unwrap_err();
        assert!(matches!(err, Error::DatabaseNotOpen));

        let batch = mgr
            .insert_records(&[InsertRequest::new("Item").value("Label", "x")])
            .await;
        assert!(!batch[0].is_success());
    }

    #[tokio::test]
    async fn test_open_without_artifact_has_no_schema() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);

        mgr.open("plain").await.unwrap();
        assert!(mgr.is_open());
        assert_eq!(mgr.name(), Some("plain"));
        assert!(mgr.schema().is_none());
        assert!(dir.path().join("database/plain.db").exists());

        mgr.close().await;
        assert!(!mgr.is_open());
        mgr.close().await;
    }

    #[tokio::test]
    async fn test_open_rejects_malformed_artifact() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);
        fs::create_dir_all(dir.path().join("database")).unwrap();
        fs::write(dir.path().join("database/broken.json"), "not json").unwrap();

        let err = mgr.open("broken").await.unwrap_err();
        assert!(matches!(err, Error::SchemaArtifact(_)));
        assert!(!mgr.is_open());
    }

    #[tokio::test]
    async fn test_reopen_loads_schema_for_substitution() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);
        mgr.create_database_with("shop", schema(), &[]).await.unwrap();
        mgr.close().await;

        mgr.open("shop").await.unwrap();
        assert_eq!(mgr.schema(), Some(&schema()));

        let pk = mgr
            .insert_record(&InsertRequest::new("Item").value("Label", Value::Null).value("Qty", Value::Null))
            .await
            .unwrap();
        let rows = mgr.query_table(&QueryRequest::new("Item")).await.unwrap();
        assert_eq!(rows, vec![json!({"ItemID": pk, "Label": "", "Qty": 0})]);
    }

    #[tokio::test]
    async fn test_double_open_switches_database() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);
        mgr.open("first").await.unwrap();
        mgr.open("second").await.unwrap();
        assert_eq!(mgr.name(), Some("second"));
    }

    #[tokio::test]
    async fn test_create_is_best_effort() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);
        let schema = schema()
            .with_table(Table::new("Item", true))
            .with_table(Table::new("Tag", false).with_field(Field::new("Name", ColumnType::Text)));

        let report = mgr
            .create_database_with(
                "shop",
                schema,
                &[InsertRequest::new("Tag").value("Name", "new")],
            )
            .await
            .unwrap();

        let created: Vec<bool> = report.tables.iter().map(|t| t.result.success).collect();
        assert_eq!(created, vec![true, false, true]);
        assert!(report.inserts[0].is_success());
        assert_eq!(report.failures(), 1);
    }

    #[tokio::test]
    async fn test_create_from_seed_directory() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);
        let seed_dir = dir.path().join("seed/shop");
        fs::create_dir_all(&seed_dir).unwrap();
        fs::write(
            seed_dir.join("tables.json"),
            serde_json::to_string(&schema().tables).unwrap(),
        )
        .unwrap();
        fs::write(
            seed_dir.join("inserts.json"),
            json!([{"tableName": "Item", "fieldNames": ["Label", "Qty"], "values": ["bolt", 3]}])
                .to_string(),
        )
        .unwrap();

        let report = mgr.create_database("shop").await.unwrap();
        assert_eq!(report.failures(), 0);
        assert_eq!(report.inserts[0].result.response, json!(1));
        assert!(dir.path().join("database/shop.json").exists());
    }

    #[tokio::test]
    async fn test_create_from_seed_with_untyped_fields() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);
        let seed_dir = dir.path().join("seed/loose");
        fs::create_dir_all(&seed_dir).unwrap();
        fs::write(
            seed_dir.join("tables.json"),
            r#"[{"name": "Note", "autoinc": true,
                 "fields": [{"name": "Body", "type": null}, {"name": "Kind", "type": "VARCHAR"}]}]"#,
        )
        .unwrap();

        let report = mgr.create_database("loose").await.unwrap();
        assert_eq!(report.failures(), 0);

        let columns = mgr.database().unwrap().table_columns("Note").await.unwrap();
        assert_eq!(columns[1].name, "Body");
        assert_eq!(columns[1].declared_type, "");
        assert!(columns[1].not_null);

        mgr.close().await;
        mgr.open("loose").await.unwrap();
        assert!(mgr.schema().is_some());
    }

    #[tokio::test]
    async fn test_delete_reports_each_file() {
        let dir = TempDir::new().unwrap();
        let mut mgr = manager(&dir);
        mgr.open("solo").await.unwrap();

        let report = mgr.delete_database("solo").await;
        assert!(!mgr.is_open());
        assert_eq!(report.removals.len(), 2);
        assert!(report.removals[0].error.is_none());
        assert!(report.removals[1].error.is_some());
        assert!(!report.is_clean());
        assert!(!dir.path().join("database/solo.db").exists());
    }
}
