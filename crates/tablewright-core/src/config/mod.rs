//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::storage::{DatabaseConfig, ZeroRowDelete};

/// Tablewright configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rows: RowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `<name>.db` and its `<name>.json` schema artifact
    pub data_dir: PathBuf,
    /// Directory holding `<name>/tables.json` and `<name>/inserts.json`
    pub seed_dir: PathBuf,
    pub foreign_keys: bool,
    pub wal: bool,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowConfig {
    pub zero_row_delete: ZeroRowDelete,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("database"),
            seed_dir: PathBuf::from("seed"),
            foreign_keys: true,
            wal: false,
            max_connections: 1,
        }
    }
}

impl StorageConfig {
    /// Store file for a database name
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.db", name))
    }

    /// Schema artifact paired with a database name
    pub fn schema_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }

    /// Seed table definitions for a database name
    pub fn seed_tables_path(&self, name: &str) -> PathBuf {
        self.seed_dir.join(name).join("tables.json")
    }

    /// Seed insert requests for a database name
    pub fn seed_inserts_path(&self, name: &str) -> PathBuf {
        self.seed_dir.join(name).join("inserts.json")
    }

    /// Connection settings for the named database
    pub fn database_config(&self, name: &str) -> DatabaseConfig {
        DatabaseConfig::with_path(self.database_path(name))
            .max_connections(self.max_connections)
            .foreign_keys(self.foreign_keys)
            .wal(self.wal)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("TABLEWRIGHT_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("tablewright")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.max_connections == 0 {
            return Err(anyhow!("storage.max_connections must be at least 1"));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "storage.data_dir" => Ok(self.storage.data_dir.display().to_string()),
            "storage.seed_dir" => Ok(self.storage.seed_dir.display().to_string()),
            "storage.foreign_keys" => Ok(self.storage.foreign_keys.to_string()),
            "storage.wal" => Ok(self.storage.wal.to_string()),
            "storage.max_connections" => Ok(self.storage.max_connections.to_string()),
            "rows.zero_row_delete" => Ok(self.rows.zero_row_delete.as_str().to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `tablewright config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "storage.data_dir" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("storage.data_dir must not be empty"));
                }
                self.storage.data_dir = PathBuf::from(value);
            }
            "storage.seed_dir" => {
                self.storage.seed_dir = PathBuf::from(value);
            }
            "storage.foreign_keys" => {
                self.storage.foreign_keys = value
                    .parse()
                    .with_context(|| format!("Invalid foreign_keys value: {}", value))?;
            }
            "storage.wal" => {
                self.storage.wal = value
                    .parse()
                    .with_context(|| format!("Invalid wal value: {}", value))?;
            }
            "storage.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.storage.max_connections = max;
            }
            "rows.zero_row_delete" => {
                self.rows.zero_row_delete = value.parse()?;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `tablewright config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "storage.data_dir",
            "storage.seed_dir",
            "storage.foreign_keys",
            "storage.wal",
            "storage.max_connections",
            "rows.zero_row_delete",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.data_dir, PathBuf::from("database"));
        assert!(config.storage.foreign_keys);
        assert_eq!(config.storage.max_connections, 1);
        assert_eq!(config.rows.zero_row_delete, ZeroRowDelete::Fail);
        config.validate().unwrap();
    }

    #[test]
    fn test_paths_derive_from_name() {
        let storage = StorageConfig::default();
        assert_eq!(
            storage.database_path("auctionDB"),
            PathBuf::from("database/auctionDB.db")
        );
        assert_eq!(
            storage.schema_path("auctionDB"),
            PathBuf::from("database/auctionDB.json")
        );
        assert_eq!(
            storage.seed_inserts_path("auctionDB"),
            PathBuf::from("seed/auctionDB/inserts.json")
        );
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut config = Config::default();
        config.set("rows.zero_row_delete", "succeed").unwrap();
        config.set("storage.max_connections", "4").unwrap();
        config.set("storage.data_dir", "/var/lib/tw").unwrap();

        assert_eq!(config.get("rows.zero_row_delete").unwrap(), "succeed");
        assert_eq!(config.get("storage.max_connections").unwrap(), "4");
        assert_eq!(config.get("storage.data_dir").unwrap(), "/var/lib/tw");
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("storage.max_connections", "0").is_err());
        assert!(config.set("storage.foreign_keys", "maybe").is_err());
        assert!(config.set("rows.zero_row_delete", "ignore").is_err());
        assert!(config.set("no.such.key", "1").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_list_covers_every_key() {
        let items = Config::default().list().unwrap();
        assert_eq!(items.len(), 6);
        assert!(items.iter().any(|(k, v)| k == "rows.zero_row_delete" && v == "fail"));
    }

    #[test]
    fn test_toml_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[rows]\nzero_row_delete = \"succeed\"\n").unwrap();
        assert_eq!(config.rows.zero_row_delete, ZeroRowDelete::Succeed);
        assert_eq!(config.storage, StorageConfig::default());

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
