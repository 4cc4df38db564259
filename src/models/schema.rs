use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SyncError;

/// Canonical column type, independent of the catalog's spelling of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    /// A sequence-backed integer; implies NOT NULL and carries no default.
    Serial,
    Varchar(u32),
    Text,
    Numeric(u32, u32),
    Boolean,
    Date,
    Time,
    Timestamp,
    Jsonb,
    /// A native type with no canonical form, carried through verbatim.
    Other(String),
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Serial => write!(f, "SERIAL"),
            ColumnType::Varchar(len) => write!(f, "VARCHAR({})", len),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Numeric(precision, scale) => write!(f, "NUMERIC({},{})", precision, scale),
            ColumnType::Boolean => write!(f, "BOOLEAN"),
            ColumnType::Date => write!(f, "DATE"),
            ColumnType::Time => write!(f, "TIME"),
            ColumnType::Timestamp => write!(f, "TIMESTAMP"),
            ColumnType::Jsonb => write!(f, "JSONB"),
            ColumnType::Other(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
    pub indexes: Vec<IndexSchema>,
    pub foreign_keys: Vec<ForeignKeySchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    pub is_nullable: bool,
    /// Normalized default expression, ready to splice into DDL.
    pub default: Option<String>,
    /// 1-based position within the table.
    pub ordinal: u32,
}

/// An explicitly created index, recorded as its full catalog definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeySchema {
    pub name: String,
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

impl TableSchema {
    /// Checks that the snapshot does not contradict itself: column names are
    /// unique and ordinal positions increase strictly.
    pub fn ensure_consistent(&self) -> Result<(), SyncError> {
        let mut seen = HashSet::new();
        let mut last = 0u32;
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SyncError::Inconsistency(format!(
                    "table {}: duplicate column {}",
                    self.table_name, column.name
                )));
            }
            if column.ordinal <= last {
                return Err(SyncError::Inconsistency(format!(
                    "table {}: ordinal positions do not increase at column {}",
                    self.table_name, column.name
                )));
            }
            last = column.ordinal;
        }
        Ok(())
    }
}
