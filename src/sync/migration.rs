use std::collections::HashSet;

use crate::models::schema::TableSchema;
use crate::sync::diff::SchemaDiff;

/// Renders the additive migration for `diff`, synthesizing every statement
/// from the source snapshot. Phases are separated by a blank line and run in
/// dependency order: schema preamble (when `schema` is given), missing
/// tables, their indexes, column additions, and finally foreign keys, so
/// every referenced table exists before its constraint lands.
///
/// Structures that exist only on the target side never produce statements;
/// the script contains no DROP of any kind.
pub fn render_script(diff: &SchemaDiff, source: &[TableSchema], schema: Option<&str>) -> String {
    let mut phases: Vec<Vec<String>> = Vec::new();

    if let Some(schema) = schema {
        phases.push(vec![
            format!("CREATE SCHEMA IF NOT EXISTS {};", schema),
            format!("SET search_path TO {};", schema),
        ]);
    }

    let missing: Vec<&TableSchema> = diff
        .tables_only_in_source
        .iter()
        .filter_map(|name| source.iter().find(|t| &t.table_name == name))
        .collect();

    let tables: Vec<String> = missing.iter().map(|t| t.create_table_sql()).collect();
    if !tables.is_empty() {
        phases.push(tables);
    }

    let indexes: Vec<String> = missing
        .iter()
        .flat_map(|t| t.indexes.iter().map(|index| index.create_index_sql()))
        .collect();
    if !indexes.is_empty() {
        phases.push(indexes);
    }

    let mut additions = Vec::new();
    for (table_name, table_diff) in &diff.altered_tables {
        let Some(table) = source.iter().find(|t| &t.table_name == table_name) else {
            continue;
        };
        let wanted: HashSet<&str> = table_diff
            .columns_only_in_source
            .iter()
            .map(String::as_str)
            .collect();
        for column in &table.columns {
            if wanted.contains(column.name.as_str()) {
                additions.push(format!(
                    "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {};",
                    table_name,
                    column.name,
                    column.ddl_fragment()
                ));
            }
        }
    }
    if !additions.is_empty() {
        phases.push(additions);
    }

    let constraints: Vec<String> = missing
        .iter()
        .flat_map(|t| {
            t.foreign_keys
                .iter()
                .map(|fk| fk.add_constraint_sql(&t.table_name))
        })
        .collect();
    if !constraints.is_empty() {
        phases.push(constraints);
    }

    phases
        .iter()
        .map(|phase| phase.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
