//! Tablewright CLI - build SQLite databases from schema files and edit rows

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tablewright_core::config::Config;
use tablewright_core::schema::{Schema, create_schema_sql};
use tablewright_core::storage::{
    DatabaseManager, DeleteRequest, Envelope, InsertRequest, QueryRequest, UpdateRequest,
};
use tracing::debug;

#[derive(Parser)]
#[command(name = "tablewright")]
#[command(author, version, about = "Schema-as-data SQLite databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a database from its seed files and insert the seed rows
    Create {
        /// Database name
        name: String,
    },

    /// Close and delete a database and its schema file
    Drop {
        /// Database name
        name: String,
    },

    /// Print the CREATE TABLE statements for a schema file
    Ddl {
        /// Schema JSON (`{name, tables}` or an array of tables)
        path: PathBuf,
    },

    /// List tables and columns of a database
    Tables {
        /// Database name
        name: String,
    },

    /// Print every row of a table
    Query { name: String, table: String },

    /// Insert a row given as a JSON object
    Insert {
        name: String,
        table: String,
        /// e.g. '{"FirstName": "Ada", "PermissionID": 1}'
        row: String,
    },

    /// Set one cell and print the stored value
    Update {
        name: String,
        table: String,
        field: String,
        /// Primary key of the row
        pk: i64,
        /// JSON value; anything that is not valid JSON is taken as a string
        value: String,
    },

    /// Delete a row by primary key
    Delete {
        name: String,
        table: String,
        /// Primary key of the row
        pk: i64,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tablewright=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create { name } => cmd_create(&name, cli.format, cli.quiet).await,
        Commands::Drop { name } => cmd_drop(&name, cli.format, cli.quiet).await,
        Commands::Ddl { path } => cmd_ddl(&path),
        Commands::Tables { name } => cmd_tables(&name, cli.format).await,
        Commands::Query { name, table } => cmd_query(&name, &table, cli.format).await,
        Commands::Insert { name, table, row } => {
            cmd_insert(&name, &table, &row, cli.format, cli.quiet).await
        }
        Commands::Update {
            name,
            table,
            field,
            pk,
            value,
        } => cmd_update(&name, &table, &field, pk, &value, cli.format, cli.quiet).await,
        Commands::Delete { name, table, pk } => {
            cmd_delete(&name, &table, pk, cli.format, cli.quiet).await
        }
        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_create(name: &str, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let mut manager = DatabaseManager::new(&config);

    let report = manager
        .create_database(name)
        .await
        .with_context(|| format!("Failed to create database '{}'", name))?;
    manager.close().await;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for table in report.tables.iter().filter(|t| !t.result.success) {
        eprintln!("Table {} not created: {}", table.table, display(&table.result.response));
    }
    for (index, insert) in report.inserts.iter().enumerate() {
        if !insert.is_success() {
            eprintln!(
                "Seed row {} ({}) not inserted: {}",
                index,
                insert.request.table_name,
                display(&insert.result.response)
            );
        }
    }
    if !quiet {
        println!(
            "Created database '{}': {} tables, {} seed rows, {} failures",
            name,
            report.tables.len(),
            report.inserts.len(),
            report.failures()
        );
    }
    Ok(())
}

async fn cmd_drop(name: &str, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let mut manager = DatabaseManager::new(&config);
    let report = manager.delete_database(name).await;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for removal in &report.removals {
        if let Some(error) = &removal.error {
            eprintln!("Could not remove {}: {}", removal.path.display(), error);
        }
    }
    if !quiet {
        println!("Deleted database '{}'", name);
    }
    Ok(())
}

fn cmd_ddl(path: &Path) -> anyhow::Result<()> {
    let schema = Schema::load(path)
        .with_context(|| format!("Failed to load schema: {}", path.display()))?;
    for (table, field, missing) in schema.validate() {
        eprintln!(
            "warning: {}.{} references unknown table '{}'",
            table, field, missing
        );
    }
    println!("{}", create_schema_sql(&schema));
    Ok(())
}

async fn cmd_tables(name: &str, format: OutputFormat) -> anyhow::Result<()> {
    let mut manager = open_existing(name).await?;
    let db = manager.database().ok_or_else(|| anyhow!("Database not open"))?;

    let mut listing = Vec::new();
    for table in db.list_tables().await? {
        let columns = db.table_columns(&table).await?;
        listing.push((table, columns));
    }
    manager.close().await;

    match format {
        OutputFormat::Json => {
            let mut value = serde_json::Map::new();
            for (table, columns) in listing {
                value.insert(table, serde_json::to_value(columns)?);
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            for (table, columns) in listing {
                println!("{}", table);
                for column in columns {
                    println!(
                        "  {} {}{}{}",
                        column.name,
                        column.declared_type,
                        if column.not_null { " NOT NULL" } else { "" },
                        if column.primary_key { " PRIMARY KEY" } else { "" }
                    );
                }
            }
        }
    }
    Ok(())
}

async fn cmd_query(name: &str, table: &str, format: OutputFormat) -> anyhow::Result<()> {
    let mut manager = open_existing(name).await?;
    let outcome = manager.query_table(&QueryRequest::new(table)).await;
    manager.close().await;

    match (outcome, format) {
        (Ok(rows), OutputFormat::Text) => {
            for row in rows {
                println!("{}", row);
            }
            Ok(())
        }
        (outcome, _) => emit(Envelope::from(outcome), format, false),
    }
}

async fn cmd_insert(
    name: &str,
    table: &str,
    row: &str,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let object: serde_json::Map<String, Value> =
        serde_json::from_str(row).context("Row must be a JSON object")?;
    let request = object
        .into_iter()
        .fold(InsertRequest::new(table), |request, (field, value)| {
            request.value(field, value)
        });

    let mut manager = open_existing(name).await?;
    let envelope = Envelope::from(manager.insert_record(&request).await);
    manager.close().await;
    emit(envelope, format, quiet)
}

async fn cmd_update(
    name: &str,
    table: &str,
    field: &str,
    pk: i64,
    value: &str,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let request = UpdateRequest::new(table, field, pk, parse_value(value));

    let mut manager = open_existing(name).await?;
    let envelope = Envelope::from(manager.update_cell(&request).await);
    manager.close().await;
    emit(envelope, format, quiet)
}

async fn cmd_delete(
    name: &str,
    table: &str,
    pk: i64,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut manager = open_existing(name).await?;
    let envelope = Envelope::from(manager.delete_record(&DeleteRequest::new(table, pk)).await);
    manager.close().await;
    emit(envelope, format, quiet)
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Open a database that must already exist on disk
async fn open_existing(name: &str) -> anyhow::Result<DatabaseManager> {
    let config = Config::load()?;
    let path = config.storage.database_path(name);
    if !path.exists() {
        bail!(
            "Database '{}' not found at {}. Run `tablewright create {}` first.",
            name,
            path.display(),
            name
        );
    }

    debug!(name = %name, path = %path.display(), "Opening database");
    let mut manager = DatabaseManager::new(&config);
    manager.open(name).await?;
    Ok(manager)
}

/// Print an envelope; a failed one becomes the command's error
fn emit(envelope: Envelope, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(&envelope)?);
    } else if envelope.success && !quiet {
        println!("{}", display(&envelope.response));
    }

    if envelope.success {
        Ok(())
    } else {
        Err(anyhow!("{}", display(&envelope.response)))
    }
}

/// Strings print bare, everything else as JSON
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
