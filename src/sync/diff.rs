use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::schema::TableSchema;

/// Structural difference between two schema snapshots, by name only.
/// Tables and columns present on both sides are never compared further.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub tables_only_in_source: Vec<String>,
    pub tables_only_in_target: Vec<String>,
    pub altered_tables: BTreeMap<String, TableDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDiff {
    pub columns_only_in_source: Vec<String>,
    pub columns_only_in_target: Vec<String>,
}

impl SchemaDiff {
    /// Compares two snapshots. Names are matched case-sensitively; column
    /// lists keep the owning side's ordinal order, table lists are sorted.
    pub fn between(source: &[TableSchema], target: &[TableSchema]) -> Self {
        let source_names: HashSet<&str> =
            source.iter().map(|t| t.table_name.as_str()).collect();
        let target_names: HashSet<&str> =
            target.iter().map(|t| t.table_name.as_str()).collect();

        let mut tables_only_in_source: Vec<String> = source
            .iter()
            .filter(|t| !target_names.contains(t.table_name.as_str()))
            .map(|t| t.table_name.clone())
            .collect();
        tables_only_in_source.sort();

        let mut tables_only_in_target: Vec<String> = target
            .iter()
            .filter(|t| !source_names.contains(t.table_name.as_str()))
            .map(|t| t.table_name.clone())
            .collect();
        tables_only_in_target.sort();

        let mut altered_tables = BTreeMap::new();
        for source_table in source {
            let Some(target_table) = target
                .iter()
                .find(|t| t.table_name == source_table.table_name)
            else {
                continue;
            };
            let source_columns: HashSet<&str> = source_table
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            let target_columns: HashSet<&str> = target_table
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .collect();

            let columns_only_in_source: Vec<String> = source_table
                .columns
                .iter()
                .filter(|c| !target_columns.contains(c.name.as_str()))
                .map(|c| c.name.clone())
                .collect();
            let columns_only_in_target: Vec<String> = target_table
                .columns
                .iter()
                .filter(|c| !source_columns.contains(c.name.as_str()))
                .map(|c| c.name.clone())
                .collect();

            if !columns_only_in_source.is_empty() || !columns_only_in_target.is_empty() {
                altered_tables.insert(
                    source_table.table_name.clone(),
                    TableDiff {
                        columns_only_in_source,
                        columns_only_in_target,
                    },
                );
            }
        }

        SchemaDiff {
            tables_only_in_source,
            tables_only_in_target,
            altered_tables,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables_only_in_source.is_empty()
            && self.tables_only_in_target.is_empty()
            && self.altered_tables.is_empty()
    }

    /// True when nothing remains to add to the target. Structures that exist
    /// only on the target side do not count; they are never acted upon.
    pub fn target_is_covered(&self) -> bool {
        self.tables_only_in_source.is_empty()
            && self
                .altered_tables
                .values()
                .all(|t| t.columns_only_in_source.is_empty())
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "schemas match");
        }
        if !self.tables_only_in_source.is_empty() {
            writeln!(
                f,
                "tables only in source: {}",
                self.tables_only_in_source.join(", ")
            )?;
        }
        if !self.tables_only_in_target.is_empty() {
            writeln!(
                f,
                "tables only in target: {}",
                self.tables_only_in_target.join(", ")
            )?;
        }
        for (table, diff) in &self.altered_tables {
            writeln!(f, "table {}:", table)?;
            if !diff.columns_only_in_source.is_empty() {
                writeln!(
                    f,
                    "  columns only in source: {}",
                    diff.columns_only_in_source.join(", ")
                )?;
            }
            if !diff.columns_only_in_target.is_empty() {
                writeln!(
                    f,
                    "  columns only in target: {}",
                    diff.columns_only_in_target.join(", ")
                )?;
            }
        }
        Ok(())
    }
}
