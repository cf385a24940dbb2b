//! Appends timestamped readings to a configured table.
//!
//! Each row is `[timestamp] ++ read arguments ++ readings`, aligned with the
//! table's configured columns.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::{ensure_same_len, Result};
use crate::schema::TableDefinition;
use crate::sqlite::Database;
use crate::value::Value;

pub struct DataLogger<'db> {
    db: &'db Database,
    table: TableDefinition,
}

impl<'db> DataLogger<'db> {
    pub fn new(db: &'db Database, table: TableDefinition) -> Self {
        Self { db, table }
    }

    pub fn table(&self) -> &TableDefinition {
        &self.table
    }

    /// Creates the table if it is missing. Returns whether it had to be created.
    pub fn ensure_table(&self) -> Result<bool> {
        if self.db.table_exists(&self.table.name)? {
            return Ok(false);
        }
        warn!(
            table = %self.table.name,
            columns = ?self.table.column_names(),
            "table not existing, creating it"
        );
        self.db.create_table_from(&self.table)
    }

    /// Writes one row stamped with the current local time.
    pub fn write_values(&self, read_args: &[Value], readings: &[Value]) -> Result<usize> {
        self.write_values_at(Local::now().naive_local(), read_args, readings)
    }

    pub fn write_values_at(
        &self,
        timestamp: NaiveDateTime,
        read_args: &[Value],
        readings: &[Value],
    ) -> Result<usize> {
        let values: Vec<Value> = std::iter::once(Value::from(timestamp))
            .chain(read_args.iter().cloned())
            .chain(readings.iter().cloned())
            .collect();
        let columns = self.table.column_names();
        ensure_same_len("logged values", values.len(), "columns", columns.len())?;
        debug!(table = %self.table.name, values = ?values, "writing entry");
        self.db
            .insert_single_row(&self.table.name, &values, columns, true)
    }
}
