use crate::models::schema::{ColumnSchema, ColumnType, ForeignKeySchema, IndexSchema, TableSchema};

impl ColumnSchema {
    /// The column's DDL fragment: type, nullability, default.
    pub fn ddl_fragment(&self) -> String {
        let mut sql = self.column_type.to_string();
        if self.column_type == ColumnType::Serial {
            // the sequence supplies both the default and the NOT NULL
            return sql;
        }
        if !self.is_nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }
}

impl TableSchema {
    /// Renders the table as a single idempotent CREATE statement. The first
    /// serial column doubles as the primary key.
    pub fn create_table_sql(&self) -> String {
        let mut defs = Vec::with_capacity(self.columns.len());
        let mut key_rendered = false;
        for column in &self.columns {
            let mut def = format!("{} {}", column.name, column.ddl_fragment());
            if column.column_type == ColumnType::Serial && !key_rendered {
                def.push_str(" PRIMARY KEY");
                key_rendered = true;
            }
            defs.push(def);
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            self.table_name,
            defs.join(", ")
        )
    }

    /// Per-table statements in dependency order: the table itself, its
    /// indexes, then its foreign keys.
    pub fn statements(&self) -> Vec<String> {
        let mut out = vec![self.create_table_sql()];
        out.extend(self.indexes.iter().map(|index| index.create_index_sql()));
        out.extend(
            self.foreign_keys
                .iter()
                .map(|fk| fk.add_constraint_sql(&self.table_name)),
        );
        out
    }
}

impl IndexSchema {
    /// Replays the recorded definition, patched with IF NOT EXISTS so the
    /// script can run against a target that already has the index.
    pub fn create_index_sql(&self) -> String {
        let def = self.definition.trim().trim_end_matches(';').trim_end();
        let sql = if def.contains(" IF NOT EXISTS ") {
            def.to_string()
        } else if let Some(rest) = def.strip_prefix("CREATE UNIQUE INDEX ") {
            format!("CREATE UNIQUE INDEX IF NOT EXISTS {}", rest)
        } else if let Some(rest) = def.strip_prefix("CREATE INDEX ") {
            format!("CREATE INDEX IF NOT EXISTS {}", rest)
        } else {
            def.to_string()
        };
        format!("{};", sql)
    }
}

impl ForeignKeySchema {
    pub fn add_constraint_sql(&self, table: &str) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({});",
            table, self.name, self.column, self.references_table, self.references_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, column_type: ColumnType, ordinal: u32) -> ColumnSchema {
        ColumnSchema {
            name: name.to_string(),
            column_type,
            is_nullable: true,
            default: None,
            ordinal,
        }
    }

    #[test]
    fn fragment_orders_nullability_before_default() {
        let mut state = column("state", ColumnType::Varchar(50), 1);
        state.is_nullable = false;
        state.default = Some("'Maharashtra'".to_string());
        assert_eq!(
            state.ddl_fragment(),
            "VARCHAR(50) NOT NULL DEFAULT 'Maharashtra'"
        );
    }

    #[test]
    fn serial_fragment_carries_no_constraints() {
        let id = column("id", ColumnType::Serial, 1);
        assert_eq!(id.ddl_fragment(), "SERIAL");
    }

    #[test]
    fn create_table_renders_on_one_line() {
        let mut name = column("name", ColumnType::Varchar(100), 2);
        name.is_nullable = false;
        let table = TableSchema {
            table_name: "farmer".to_string(),
            columns: vec![column("id", ColumnType::Serial, 1), name],
            indexes: vec![],
            foreign_keys: vec![],
        };
        assert_eq!(
            table.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS farmer (id SERIAL PRIMARY KEY, name VARCHAR(100) NOT NULL);"
        );
    }

    #[test]
    fn only_first_serial_becomes_primary_key() {
        let table = TableSchema {
            table_name: "audit".to_string(),
            columns: vec![
                column("id", ColumnType::Serial, 1),
                column("revision", ColumnType::Serial, 2),
            ],
            indexes: vec![],
            foreign_keys: vec![],
        };
        assert_eq!(
            table.create_table_sql(),
            "CREATE TABLE IF NOT EXISTS audit (id SERIAL PRIMARY KEY, revision SERIAL);"
        );
    }

    #[test]
    fn index_definition_gains_if_not_exists() {
        let index = IndexSchema {
            name: "idx_farmer_code".to_string(),
            definition: "CREATE INDEX idx_farmer_code ON farmer USING btree (code)".to_string(),
        };
        assert_eq!(
            index.create_index_sql(),
            "CREATE INDEX IF NOT EXISTS idx_farmer_code ON farmer USING btree (code);"
        );
    }

    #[test]
    fn unique_index_definition_gains_if_not_exists() {
        let index = IndexSchema {
            name: "farmer_code_key".to_string(),
            definition: "CREATE UNIQUE INDEX farmer_code_key ON farmer USING btree (code);"
                .to_string(),
        };
        assert_eq!(
            index.create_index_sql(),
            "CREATE UNIQUE INDEX IF NOT EXISTS farmer_code_key ON farmer USING btree (code);"
        );
    }

    #[test]
    fn guarded_definition_is_not_patched_twice() {
        let index = IndexSchema {
            name: "idx_qty".to_string(),
            definition: "CREATE INDEX IF NOT EXISTS idx_qty ON milk_collection (qty_ltr)"
                .to_string(),
        };
        assert_eq!(
            index.create_index_sql(),
            "CREATE INDEX IF NOT EXISTS idx_qty ON milk_collection (qty_ltr);"
        );
    }

    #[test]
    fn foreign_key_statement_format() {
        let fk = ForeignKeySchema {
            name: "milk_collection_farmer_id_fkey".to_string(),
            column: "farmer_id".to_string(),
            references_table: "farmer".to_string(),
            references_column: "id".to_string(),
        };
        assert_eq!(
            fk.add_constraint_sql("milk_collection"),
            "ALTER TABLE milk_collection ADD CONSTRAINT milk_collection_farmer_id_fkey \
             FOREIGN KEY (farmer_id) REFERENCES farmer(id);"
        );
    }

    #[test]
    fn statements_follow_dependency_order() {
        let table = TableSchema {
            table_name: "milk_collection".to_string(),
            columns: vec![
                column("id", ColumnType::Serial, 1),
                column("farmer_id", ColumnType::Integer, 2),
            ],
            indexes: vec![IndexSchema {
                name: "idx_mc_farmer".to_string(),
                definition: "CREATE INDEX idx_mc_farmer ON milk_collection (farmer_id)"
                    .to_string(),
            }],
            foreign_keys: vec![ForeignKeySchema {
                name: "milk_collection_farmer_id_fkey".to_string(),
                column: "farmer_id".to_string(),
                references_table: "farmer".to_string(),
                references_column: "id".to_string(),
            }],
        };
        let statements = table.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS milk_collection"));
        assert!(statements[1].starts_with("CREATE INDEX IF NOT EXISTS idx_mc_farmer"));
        assert!(statements[2].starts_with("ALTER TABLE milk_collection ADD CONSTRAINT"));
    }
}
