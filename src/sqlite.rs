//! Connection manager, schema operations and row/query operations.
//!
//! A [`Database`] owns exactly one SQLite handle. All operations run to
//! completion on the caller's thread. Values are always bound as statement
//! parameters; only validated, quoted identifiers reach the statement text.
//!
//! # Commit handling
//!
//! Mutating operations take a `commit` flag. With `commit = false` a deferred
//! transaction is opened (if none is pending) and left open; the next call with
//! `commit = true`, or [`Database::commit`], commits everything pending.

use std::path::Path;

use rusqlite::{params_from_iter, Batch, Connection};
use tracing::{debug, error, info, warn};

use crate::config::StoreConfig;
use crate::error::{ensure_same_len, Error, Result};
use crate::names::{quote_identifier, validate_column_type, NameList};
use crate::schema::{ColumnInfo, Schema, TableDefinition, TableInfo};
use crate::value::{Row, Value};

/// Descriptor SQLite understands as "private in-memory database".
pub const MEMORY_DESCRIPTOR: &str = ":memory:";

/// Resolves the store descriptor from an optional directory and file name.
///
/// Both present: the joined path. Only a name: the name verbatim. Otherwise the
/// in-memory descriptor. Empty strings count as absent.
pub fn resolve_descriptor(path: Option<&Path>, name: Option<&str>) -> String {
    let path = path.filter(|p| !p.as_os_str().is_empty());
    let name = name.filter(|n| !n.is_empty());
    match (path, name) {
        (Some(path), Some(name)) => path.join(name).to_string_lossy().into_owned(),
        (None, Some(name)) => name.to_string(),
        _ => MEMORY_DESCRIPTOR.to_string(),
    }
}

pub struct Database {
    conn: Connection,
    descriptor: String,
}

impl Database {
    /// Opens a file-backed or in-memory database, see [`resolve_descriptor`].
    pub fn open(path: Option<&Path>, name: Option<&str>) -> Result<Self> {
        let descriptor = resolve_descriptor(path, name);
        let opened = if descriptor == MEMORY_DESCRIPTOR {
            Connection::open_in_memory()
        } else {
            Connection::open(&descriptor)
        };
        let conn = opened.map_err(|source| Error::Connection {
            descriptor: descriptor.clone(),
            source,
        })?;
        info!(descriptor = %descriptor, "setup of database connection");
        Ok(Self { conn, descriptor })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(None, None)
    }

    /// Opens the database named by the `[database]` section of `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open(
            config.database.path.as_deref(),
            config.database.name.as_deref(),
        )
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Whether work deferred with `commit = false` is waiting for a commit.
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Commits deferred work. Does nothing when nothing is pending.
    pub fn commit(&self) -> Result<()> {
        if self.in_transaction() {
            debug!(descriptor = %self.descriptor, "committing");
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Closes the handle, reporting close failures. Uncommitted work is
    /// discarded by the store. Dropping a `Database` also closes it.
    pub fn close(self) -> Result<()> {
        if self.in_transaction() {
            warn!(descriptor = %self.descriptor, "closing with uncommitted changes");
        }
        let Self { conn, descriptor } = self;
        conn.close().map_err(|(_, source)| Error::Connection {
            descriptor: descriptor.clone(),
            source,
        })?;
        info!(descriptor = %descriptor, "closed database connection");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Schema operations
    // ---------------------------------------------------------------------

    /// Creates a table and verifies it against the live catalog.
    ///
    /// `columns` and `column_types` must align; `primary_key` (possibly empty)
    /// must only name entries of `columns`. Returns `Ok(false)` when the
    /// statement ran but the table cannot be found afterwards. Store rejections,
    /// such as an already existing table, are returned as errors.
    pub fn create_table(
        &self,
        table_name: &str,
        columns: impl Into<NameList>,
        column_types: impl Into<NameList>,
        primary_key: impl Into<NameList>,
    ) -> Result<bool> {
        let definition =
            TableDefinition::from_lists(table_name, columns, column_types, primary_key)?;
        self.create_table_from(&definition)
    }

    pub fn create_table_from(&self, definition: &TableDefinition) -> Result<bool> {
        let sql = definition.create_sql()?;
        debug!(sql = %sql, "creating table");
        self.conn.execute_batch(&sql)?;
        if self.table_exists(&definition.name)? {
            info!(table = %definition.name, "created table");
            Ok(true)
        } else {
            warn!(table = %definition.name, "error creating and verifying table");
            Ok(false)
        }
    }

    /// Creates every table of `schema` that does not exist yet.
    pub fn initialize_schema(&self, schema: &Schema) -> Result<()> {
        for table in &schema.tables {
            if self.table_exists(&table.name)? {
                debug!(table = %table.name, "table already present");
                continue;
            }
            if !self.create_table_from(table)? {
                return Err(Error::table_not_found(&table.name));
            }
        }
        Ok(())
    }

    /// Looks the table (or view) up in the store catalog. Never cached.
    ///
    /// Views resolve like tables so they can be introspected; writing to one
    /// fails in the store.
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        debug!(table = table_name, "checking for table");
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (
                SELECT 1 FROM sqlite_master
                WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE
                UNION ALL
                SELECT 1 FROM sqlite_temp_master
                WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE
            )",
            [table_name],
            |row| row.get(0),
        )?;
        if !exists {
            debug!(table = table_name, "table not there");
        }
        Ok(exists)
    }

    fn require_table(&self, table_name: &str) -> Result<()> {
        if self.table_exists(table_name)? {
            Ok(())
        } else {
            Err(Error::table_not_found(table_name))
        }
    }

    /// Column names in declaration order, read from the shape of a zero-row
    /// projection of the table.
    pub fn get_columns(&self, table_name: &str) -> Result<Vec<String>> {
        self.require_table(table_name)?;
        debug!(table = table_name, "getting column names");
        let sql = format!("SELECT * FROM {} LIMIT 0", quote_identifier(table_name)?);
        let stmt = self.conn.prepare(&sql)?;
        Ok(stmt.column_names().into_iter().map(String::from).collect())
    }

    /// Declared layout of the table: column names, types, not-null flags and
    /// primary key positions.
    pub fn describe_table(&self, table_name: &str) -> Result<TableInfo> {
        self.require_table(table_name)?;
        let mut stmt = self.conn.prepare(
            "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid",
        )?;
        let columns = stmt
            .query_map([table_name], |row| {
                let pk: u32 = row.get(3)?;
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                    not_null: row.get(2)?,
                    primary_key_position: (pk > 0).then_some(pk),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(TableInfo {
            name: table_name.to_string(),
            columns,
        })
    }

    pub fn add_column_to_table(
        &self,
        table: &str,
        column_name: &str,
        column_type: &str,
        commit: bool,
    ) -> Result<()> {
        self.require_table(table)?;
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quote_identifier(table)?,
            quote_identifier(column_name)?,
            validate_column_type(column_type)?
        );
        debug!(table, column = column_name, "adding column");
        self.execute_sql(&sql, commit)
    }

    // ---------------------------------------------------------------------
    // Row / query operations
    // ---------------------------------------------------------------------

    /// Inserts one row. `values[i]` goes into `columns[i]`; unnamed columns
    /// take their default (usually null). Returns the number of rows inserted.
    ///
    /// Values are bound, never spliced into the statement, so quote
    /// characters inside text are stored verbatim.
    pub fn insert_single_row(
        &self,
        table: &str,
        values: &[Value],
        columns: impl Into<NameList>,
        commit: bool,
    ) -> Result<usize> {
        self.require_table(table)?;
        let columns = columns.into();
        ensure_same_len("values", values.len(), "columns", columns.len())?;

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table)?)
        } else {
            let names = columns
                .iter()
                .map(quote_identifier)
                .collect::<Result<Vec<_>>>()?;
            let placeholders = (1..=values.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_identifier(table)?,
                names.join(", "),
                placeholders.join(", ")
            )
        };
        debug!(table, sql = %sql, values = ?values, "inserting values into table");
        self.execute_bound(&sql, values.iter(), commit)
    }

    /// Sets `updated_column = value` on rows matching every
    /// `hit_columns[i] = hit_values[i]` pair, conjoined in the given order.
    ///
    /// Empty conditions update every row of the table; prefer
    /// [`Database::update_all_rows`] when that is the intent. Returns the
    /// number of rows changed, which may be zero.
    pub fn update_value(
        &self,
        table: &str,
        updated_column: &str,
        value: impl Into<Value>,
        hit_columns: impl Into<NameList>,
        hit_values: &[Value],
        commit: bool,
    ) -> Result<usize> {
        let hit_columns = hit_columns.into();
        ensure_same_len(
            "hit columns",
            hit_columns.len(),
            "hit values",
            hit_values.len(),
        )?;
        if hit_columns.is_empty() {
            warn!(table, column = updated_column, "update without conditions applies to all rows");
        }
        self.update_where(table, updated_column, value.into(), &hit_columns, hit_values, commit)
    }

    /// Sets `updated_column = value` on every row of the table.
    pub fn update_all_rows(
        &self,
        table: &str,
        updated_column: &str,
        value: impl Into<Value>,
        commit: bool,
    ) -> Result<usize> {
        self.update_where(table, updated_column, value.into(), &NameList::empty(), &[], commit)
    }

    fn update_where(
        &self,
        table: &str,
        updated_column: &str,
        value: Value,
        hit_columns: &NameList,
        hit_values: &[Value],
        commit: bool,
    ) -> Result<usize> {
        self.require_table(table)?;
        let mut sql = format!(
            "UPDATE {} SET {} = ?1 WHERE 1 = 1",
            quote_identifier(table)?,
            quote_identifier(updated_column)?
        );
        for (i, column) in hit_columns.iter().enumerate() {
            sql.push_str(&format!(" AND {} = ?{}", quote_identifier(column)?, i + 2));
        }
        debug!(table, sql = %sql, value = %value, "updating values");
        self.execute_bound(&sql, std::iter::once(&value).chain(hit_values), commit)
    }

    /// Runs arbitrary statement text (one or more statements). Errors are
    /// returned to the caller unchanged.
    pub fn execute_sql(&self, sql: &str, commit: bool) -> Result<()> {
        debug!(sql, "executing statement");
        self.in_commit_scope(commit, |conn| conn.execute_batch(sql).map(|()| 0))?;
        Ok(())
    }

    fn execute_bound<'v>(
        &self,
        sql: &str,
        values: impl Iterator<Item = &'v Value>,
        commit: bool,
    ) -> Result<usize> {
        self.in_commit_scope(commit, |conn| conn.execute(sql, params_from_iter(values)))
    }

    /// Runs `op` inside a deferred transaction when `commit` is false, and
    /// commits everything pending afterwards when it is true.
    fn in_commit_scope<F>(&self, commit: bool, op: F) -> Result<usize>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<usize>,
    {
        if !commit && self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        let changed = op(&self.conn)?;
        if commit {
            self.commit()?;
        }
        Ok(changed)
    }

    /// Lenient read: runs `sql` and returns every row, or `None` when the
    /// query fails. Failures are logged, never returned, so exploratory
    /// queries cannot take the caller down. An empty result is `Some(vec![])`.
    pub fn get_data(&self, sql: &str) -> Option<Vec<Row>> {
        match self.try_get_data(sql) {
            Ok(rows) => Some(rows),
            Err(err) => {
                error!(sql, error = %err, "error executing sql");
                None
            }
        }
    }

    /// Strict read: like [`Database::get_data`] but returns the error.
    ///
    /// `sql` must hold a single statement; trailing statements are rejected
    /// rather than skipped. Empty text yields no rows.
    pub fn try_get_data(&self, sql: &str) -> Result<Vec<Row>> {
        debug!(sql, "executing query");
        let mut batch = Batch::new(&self.conn, sql);
        let Some(mut stmt) = batch.next()? else {
            return Ok(Vec::new());
        };
        if batch.next()?.is_some() {
            return Err(rusqlite::Error::MultipleStatement.into());
        }
        let width = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(Value::from))
                    .collect::<rusqlite::Result<Row>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("descriptor", &self.descriptor)
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_resolve_descriptor() {
        let dir = PathBuf::from("/var/lib/sensors");
        assert_eq!(
            resolve_descriptor(Some(&dir), Some("readings.db")),
            dir.join("readings.db").to_string_lossy()
        );
        assert_eq!(resolve_descriptor(None, Some("local.db")), "local.db");
        assert_eq!(resolve_descriptor(Some(Path::new("")), Some("local.db")), "local.db");
        assert_eq!(resolve_descriptor(Some(&dir), None), MEMORY_DESCRIPTOR);
        assert_eq!(resolve_descriptor(None, Some("")), MEMORY_DESCRIPTOR);
        assert_eq!(resolve_descriptor(None, None), MEMORY_DESCRIPTOR);
    }

    #[test]
    fn test_commit_scope_defers_and_commits() {
        let db = Database::open_in_memory().unwrap();
        db.execute_sql("CREATE TABLE t (a integer)", true).unwrap();
        assert!(!db.in_transaction());

        db.execute_sql("INSERT INTO t VALUES (1)", false).unwrap();
        assert!(db.in_transaction());
        db.execute_sql("INSERT INTO t VALUES (2)", false).unwrap();
        assert!(db.in_transaction());

        db.execute_sql("INSERT INTO t VALUES (3)", true).unwrap();
        assert!(!db.in_transaction());
        assert_eq!(db.get_data("SELECT count(*) FROM t"), Some(vec![vec![Value::Integer(3)]]));

        db.commit().unwrap();
        assert!(!db.in_transaction());
    }
}
