//! TOML configuration for a store and the tables it should hold.
//!
//! ```toml
//! [database]
//! path = "/var/lib/sensors"
//! name = "readings.db"
//!
//! [logging]
//! level = "debug"
//!
//! [[tables]]
//! name = "readings"
//! columns = ["ts", "sensor", "value"]
//! column_types = ["text", "text", "real"]
//! primary_key = ["ts", "sensor"]
//!
//! [data_logger]
//! table = "readings"
//! ```
//!
//! Every section is optional. Without `[database]` the store is in-memory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::schema::{Schema, TableDefinition};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    #[serde(default)]
    pub data_logger: Option<DataLoggerConfig>,
}

/// Location of the store. See `sqlite::resolve_descriptor` for how the two
/// fields combine.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TableConfig {
    pub name: String,
    pub columns: Vec<String>,
    pub column_types: Vec<String>,
    #[serde(default)]
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DataLoggerConfig {
    pub table: String,
}

impl TableConfig {
    pub fn to_definition(&self) -> Result<TableDefinition> {
        TableDefinition::from_lists(
            &self.name,
            &self.columns,
            &self.column_types,
            &self.primary_key,
        )
    }
}

impl StoreConfig {
    /// Reads and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every table definition and that the data logger table is declared.
    pub fn validate(&self) -> Result<()> {
        let schema = self.schema()?;
        for (i, table) in schema.tables.iter().enumerate() {
            if schema.tables[..i]
                .iter()
                .any(|t| t.name.eq_ignore_ascii_case(&table.name))
            {
                return Err(Error::Config(format!(
                    "table {} declared more than once",
                    table.name
                )));
            }
        }
        if let Some(logger) = &self.data_logger {
            if schema.table(&logger.table).is_none() {
                return Err(Error::Config(format!(
                    "data_logger table {} is not declared in [[tables]]",
                    logger.table
                )));
            }
        }
        Ok(())
    }

    pub fn schema(&self) -> Result<Schema> {
        self.tables
            .iter()
            .try_fold(Schema::new(), |schema, table| {
                Ok(schema.add_table(table.to_definition()?))
            })
    }

    /// Definition of the table the data logger writes to, if one is configured.
    pub fn data_logger_table(&self) -> Result<Option<TableDefinition>> {
        let Some(logger) = &self.data_logger else {
            return Ok(None);
        };
        self.schema()?
            .table(&logger.table)
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                Error::Config(format!(
                    "data_logger table {} is not declared in [[tables]]",
                    logger.table
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[database]
path = "/var/lib/sensors"
name = "readings.db"

[logging]
level = "debug"

[[tables]]
name = "readings"
columns = ["ts", "sensor", "value"]
column_types = ["text", "text", "real"]
primary_key = ["ts", "sensor"]

[data_logger]
table = "readings"
"#;

    #[test]
    fn test_full_config() {
        let config = StoreConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.database.name.as_deref(), Some("readings.db"));
        assert_eq!(config.logging.level, "debug");
        let table = config.data_logger_table().unwrap().unwrap();
        assert_eq!(table.column_names(), vec!["ts", "sensor", "value"]);
        assert_eq!(table.primary_key, vec!["ts", "sensor"]);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.database.path.is_none());
        assert!(config.data_logger_table().unwrap().is_none());
    }

    #[test]
    fn test_mismatched_column_types_rejected() {
        let err = StoreConfig::from_toml_str(
            r#"
[[tables]]
name = "t"
columns = ["a", "b"]
column_types = ["integer"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_undeclared_logger_table_rejected() {
        let err = StoreConfig::from_toml_str("[data_logger]\ntable = \"missing\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_duplicate_tables_rejected() {
        let err = StoreConfig::from_toml_str(
            r#"
[[tables]]
name = "t"
columns = ["a"]
column_types = ["integer"]

[[tables]]
name = "T"
columns = ["b"]
column_types = ["text"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let err = StoreConfig::from_toml_str("[database\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = StoreConfig::from_file("/nonexistent/store.toml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
