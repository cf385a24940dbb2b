//! Table definitions and introspected table layouts.

use crate::error::{ensure_same_len, Error, Result};
use crate::names::{quote_identifier, validate_column_type, NameList};

/// Set of tables a database is expected to hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    /// Columns forming the (possibly composite) primary key, in key order.
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Declared type, passed through to the store (`integer`, `text`, ...).
    pub data_type: String,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.into(),
            data_type: data_type.into(),
        });
        self
    }

    pub fn with_primary_key(mut self, columns: impl Into<NameList>) -> Self {
        self.primary_key = columns.into().into_vec();
        self
    }

    /// Builds a definition from parallel column/type lists and validates it.
    pub fn from_lists(
        name: &str,
        columns: impl Into<NameList>,
        column_types: impl Into<NameList>,
        primary_key: impl Into<NameList>,
    ) -> Result<Self> {
        let columns = columns.into();
        let column_types = column_types.into();
        ensure_same_len("columns", columns.len(), "column types", column_types.len())?;
        let definition = columns
            .iter()
            .zip(column_types.iter())
            .fold(Self::new(name), |def, (column, data_type)| {
                def.with_column(column, data_type)
            })
            .with_primary_key(primary_key);
        definition.validate()?;
        Ok(definition)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Checks names, types and that the primary key only names declared columns.
    pub fn validate(&self) -> Result<()> {
        quote_identifier(&self.name)?;
        if self.columns.is_empty() {
            return Err(Error::NoColumns {
                table: self.name.clone(),
            });
        }
        for column in &self.columns {
            quote_identifier(&column.name)?;
            validate_column_type(&column.data_type)?;
        }
        if let Some(column) = self
            .primary_key
            .iter()
            .find(|key| !self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(key)))
        {
            return Err(Error::InvalidPrimaryKey {
                column: column.clone(),
            });
        }
        Ok(())
    }

    /// `CREATE TABLE` statement for this definition.
    pub fn create_sql(&self) -> Result<String> {
        self.validate()?;
        let mut entries = self
            .columns
            .iter()
            .map(|c| {
                Ok(format!(
                    "{} {}",
                    quote_identifier(&c.name)?,
                    validate_column_type(&c.data_type)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        if !self.primary_key.is_empty() {
            let keys = self
                .primary_key
                .iter()
                .map(|k| quote_identifier(k))
                .collect::<Result<Vec<_>>>()?;
            entries.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }
        Ok(format!(
            "CREATE TABLE {} ({})",
            quote_identifier(&self.name)?,
            entries.join(", ")
        ))
    }
}

/// Layout of an existing table as reported by the store catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    /// 1-based position within the primary key, `None` if not part of it.
    pub primary_key_position: Option<u32>,
}

impl TableInfo {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Primary key columns ordered by key position.
    pub fn primary_key(&self) -> Vec<&str> {
        let mut keyed: Vec<_> = self
            .columns
            .iter()
            .filter_map(|c| c.primary_key_position.map(|pos| (pos, c.name.as_str())))
            .collect();
        keyed.sort_by_key(|(pos, _)| *pos);
        keyed.into_iter().map(|(_, name)| name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sql_with_composite_key() {
        let table = TableDefinition::from_lists(
            "readings",
            ["ts", "sensor", "value"],
            ["text", "text", "real"],
            ["ts", "sensor"],
        )
        .unwrap();
        assert_eq!(
            table.create_sql().unwrap(),
            concat!(
                r#"CREATE TABLE "readings" ("ts" text, "sensor" text, "value" real, "#,
                r#"PRIMARY KEY ("ts", "sensor"))"#
            )
        );
    }

    #[test]
    fn test_create_sql_single_column_without_key() {
        let table = TableDefinition::from_lists("t", "ID", "integer", NameList::empty()).unwrap();
        assert_eq!(table.create_sql().unwrap(), r#"CREATE TABLE "t" ("ID" integer)"#);
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(matches!(
            TableDefinition::from_lists("t", ["a", "b"], ["int"], NameList::empty()),
            Err(Error::LengthMismatch { .. })
        ));
        assert!(matches!(
            TableDefinition::from_lists("t", ["a"], ["int"], "b"),
            Err(Error::InvalidPrimaryKey { .. })
        ));
        assert!(matches!(
            TableDefinition::new("t").validate(),
            Err(Error::NoColumns { .. })
        ));
        assert!(matches!(
            TableDefinition::new("bad name").with_column("a", "int").validate(),
            Err(Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_primary_key_ignores_case() {
        let table = TableDefinition::from_lists("t", "id", "integer", "ID").unwrap();
        assert_eq!(
            table.create_sql().unwrap(),
            r#"CREATE TABLE "t" ("id" integer, PRIMARY KEY ("ID"))"#
        );
    }

    #[test]
    fn test_schema_lookup_ignores_case() {
        let schema =
            Schema::new().add_table(TableDefinition::new("Users").with_column("id", "integer"));
        assert!(schema.table("users").is_some());
        assert!(schema.table("other").is_none());
    }

    #[test]
    fn test_table_info_primary_key_order() {
        let info = TableInfo {
            name: "t".to_string(),
            columns: vec![
                ColumnInfo {
                    name: "a".to_string(),
                    data_type: "int".to_string(),
                    not_null: false,
                    primary_key_position: Some(2),
                },
                ColumnInfo {
                    name: "b".to_string(),
                    data_type: "int".to_string(),
                    not_null: false,
                    primary_key_position: Some(1),
                },
                ColumnInfo {
                    name: "c".to_string(),
                    data_type: "text".to_string(),
                    not_null: false,
                    primary_key_position: None,
                },
            ],
        };
        assert_eq!(info.primary_key(), vec!["b", "a"]);
        assert_eq!(info.column_names(), vec!["a", "b", "c"]);
    }
}
