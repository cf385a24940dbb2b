//! Name sequences and identifier validation.
//!
//! Table and column names cannot be bound as parameters, so they are the only
//! caller input interpolated into statement text. Every name passes
//! [`quote_identifier`] first.

use crate::error::{Error, Result};

/// Ordered list of names (columns, column types or primary key columns).
///
/// Converts from a single `&str` as well as from slices, arrays and vectors,
/// so a one-column call reads `create_table("t", "id", "integer", "id")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList(Vec<String>);

impl NameList {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|n| n == name)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for NameList {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for NameList {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<&[&str]> for NameList {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for NameList {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl<const N: usize> From<&[&str; N]> for NameList {
    fn from(names: &[&str; N]) -> Self {
        Self(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl From<Vec<&str>> for NameList {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for NameList {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<&[String]> for NameList {
    fn from(names: &[String]) -> Self {
        Self(names.to_vec())
    }
}

impl From<&Vec<String>> for NameList {
    fn from(names: &Vec<String>) -> Self {
        Self(names.clone())
    }
}

/// Checks `name` against `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// Validates `name` and returns it double-quoted for use in statement text.
pub fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name).map(|name| format!("\"{name}\""))
}

/// Checks a declared column type such as `integer`, `VARCHAR(20)`,
/// `DECIMAL(10, 2)` or `INTEGER NOT NULL`.
pub fn validate_column_type(column_type: &str) -> Result<&str> {
    let trimmed = column_type.trim();
    let mut depth = 0i32;
    let mut valid = trimmed.starts_with(|c: char| c.is_ascii_alphabetic());
    for c in trimmed.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c.is_ascii_alphanumeric() => {}
            '_' | ' ' | ',' | '+' | '-' | '.' => {}
            _ => valid = false,
        }
        if depth < 0 {
            valid = false;
        }
    }
    if valid && depth == 0 {
        Ok(trimmed)
    } else {
        Err(Error::InvalidColumnType {
            column_type: column_type.to_string(),
        })
    }
}
