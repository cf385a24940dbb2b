//! Error types for the access layer.
//!
//! Write-path operations return these errors to the caller unchanged. The
//! lenient read path (`Database::get_data`) logs them and reports `None`
//! instead.

use std::path::PathBuf;

/// Result type for access layer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Access layer errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The store could not be opened or closed.
    #[error("connection to database '{descriptor}' failed: {source}")]
    Connection {
        descriptor: String,
        #[source]
        source: rusqlite::Error,
    },

    /// An operation that needs an existing table was called without one.
    #[error("table not found: {table}")]
    TableNotFound { table: String },

    /// A uniqueness, primary key or other constraint rejected the statement.
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[source] rusqlite::Error),

    /// The store rejected the statement text.
    #[error("query failed: {0}")]
    Query(#[source] rusqlite::Error),

    /// Table or column name outside `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid identifier: {name:?}")]
    InvalidIdentifier { name: String },

    /// Column type containing characters that cannot appear in a type name.
    #[error("invalid column type: {column_type:?}")]
    InvalidColumnType { column_type: String },

    /// Two sequences that must align positionally have different lengths.
    #[error("{left} has {left_len} entries but {right} has {right_len}")]
    LengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    /// A primary key column that is not declared in the table.
    #[error("primary key column {column:?} is not a column of the table")]
    InvalidPrimaryKey { column: String },

    /// A table definition without any columns.
    #[error("table {table} has no columns")]
    NoColumns { table: String },

    /// Configuration is well-formed TOML but semantically wrong.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the expected layout.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    pub fn length_mismatch(
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    ) -> Self {
        Self::LengthMismatch {
            left,
            left_len,
            right,
            right_len,
        }
    }

    #[must_use]
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound { .. })
    }

    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        let constraint = matches!(
            &err,
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation
        );
        if constraint {
            Self::ConstraintViolation(err)
        } else {
            Self::Query(err)
        }
    }
}

/// Fails with `LengthMismatch` unless both sequences have the same length.
pub(crate) fn ensure_same_len(
    left: &'static str,
    left_len: usize,
    right: &'static str,
    right_len: usize,
) -> Result<()> {
    if left_len == right_len {
        Ok(())
    } else {
        Err(Error::length_mismatch(left, left_len, right, right_len))
    }
}
