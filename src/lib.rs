//! Minimal access layer over an embedded SQLite store.
//!
//! # Intention
//!
//! - Open a file-backed or in-memory database and own its single handle.
//! - Manage table structure: create, check existence, list and add columns.
//! - Write single rows, update values, run arbitrary statements and ad-hoc reads.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - No query planning, pooling, migrations or explicit transaction API.
//!
//! # Failure contract
//!
//! Every write-path operation returns [`Result`]; nothing is swallowed.
//! [`Database::get_data`] is the one deliberate exception: it logs failures
//! and returns `None`, keeping "query failed" distinct from "no rows".

pub mod config;
pub mod data_logger;
pub mod error;
pub mod logging;
pub mod names;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use config::StoreConfig;
pub use data_logger::DataLogger;
pub use error::{Error, Result};
pub use names::NameList;
pub use schema::{ColumnDefinition, ColumnInfo, Schema, TableDefinition, TableInfo};
pub use sqlite::{Database, MEMORY_DESCRIPTOR};
pub use value::{Row, Value};
