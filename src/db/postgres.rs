use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::{
    errors::SyncError,
    models::schema::{ColumnSchema, ForeignKeySchema, IndexSchema, TableSchema},
    sync::mapper::{RawColumn, TypeMapper},
};

use super::{DbClient, Transaction};

// Casts keep sqlx away from the information_schema domain types
// (sql_identifier, cardinal_number), which it cannot decode directly.
const TABLES_QUERY: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = $1 AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT column_name::text AS column_name,
           data_type::text AS data_type,
           character_maximum_length::int AS character_maximum_length,
           numeric_precision::int AS numeric_precision,
           numeric_scale::int AS numeric_scale,
           is_nullable::text AS is_nullable,
           column_default::text AS column_default,
           ordinal_position::int AS ordinal_position
    FROM information_schema.columns
    WHERE table_schema = $1 AND table_name = $2
    ORDER BY ordinal_position
"#;

const INDEXES_QUERY: &str = r#"
    SELECT tablename::text AS tablename,
           indexname::text AS indexname,
           indexdef::text AS indexdef
    FROM pg_indexes
    WHERE schemaname = $1 AND indexname NOT LIKE '%\_pkey'
    ORDER BY indexname
"#;

const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT tc.constraint_name::text AS constraint_name,
           tc.table_name::text AS table_name,
           kcu.column_name::text AS column_name,
           ccu.table_name::text AS references_table,
           ccu.column_name::text AS references_column
    FROM information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
      ON tc.constraint_name = kcu.constraint_name
     AND tc.table_schema = kcu.table_schema
    JOIN information_schema.constraint_column_usage AS ccu
      ON ccu.constraint_name = tc.constraint_name
     AND ccu.table_schema = tc.table_schema
    WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = $1
    ORDER BY tc.constraint_name
"#;

pub struct PostgresClient {
    pub pool: PgPool,
    mapper: TypeMapper,
}

impl PostgresClient {
    pub async fn connect(database_url: &str) -> Result<Self, SyncError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            mapper: TypeMapper::default(),
        })
    }

    async fn table_columns(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnSchema>, SyncError> {
        let rows = sqlx::query(COLUMNS_QUERY)
            .bind(schema)
            .bind(table)
            .fetch_all(&mut **tx)
            .await
            .map_err(SyncError::Sqlx)?;

        let mut columns = Vec::with_capacity(rows.len());
        let mut last_ordinal = 0i32;
        for row in &rows {
            let raw = RawColumn {
                name: row.try_get("column_name")?,
                data_type: row.try_get("data_type")?,
                max_length: row.try_get("character_maximum_length")?,
                numeric_precision: row.try_get("numeric_precision")?,
                numeric_scale: row.try_get("numeric_scale")?,
                is_nullable: row.try_get::<String, _>("is_nullable")? == "YES",
                default: row.try_get("column_default")?,
                ordinal: row.try_get("ordinal_position")?,
            };
            if raw.ordinal <= last_ordinal {
                return Err(SyncError::Inconsistency(format!(
                    "table {}: ordinal positions do not increase at column {}",
                    table, raw.name
                )));
            }
            last_ordinal = raw.ordinal;
            columns.push(self.mapper.map_column(&raw)?);
        }

        // Dropped columns leave gaps in the catalog positions; the recorded
        // ordinals are renumbered so snapshots stay comparable across servers.
        for (i, column) in columns.iter_mut().enumerate() {
            column.ordinal = (i + 1) as u32;
        }
        Ok(columns)
    }

    async fn schema_indexes(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        schema: &str,
    ) -> Result<HashMap<String, Vec<IndexSchema>>, SyncError> {
        let rows = sqlx::query(INDEXES_QUERY)
            .bind(schema)
            .fetch_all(&mut **tx)
            .await
            .map_err(SyncError::Sqlx)?;

        let mut indexes: HashMap<String, Vec<IndexSchema>> = HashMap::new();
        for row in &rows {
            let table: String = row.try_get("tablename")?;
            indexes.entry(table).or_default().push(IndexSchema {
                name: row.try_get("indexname")?,
                definition: row.try_get("indexdef")?,
            });
        }
        Ok(indexes)
    }

    async fn schema_foreign_keys(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        schema: &str,
    ) -> Result<HashMap<String, Vec<ForeignKeySchema>>, SyncError> {
        let rows = sqlx::query(FOREIGN_KEYS_QUERY)
            .bind(schema)
            .fetch_all(&mut **tx)
            .await
            .map_err(SyncError::Sqlx)?;

        let mut foreign_keys: HashMap<String, Vec<ForeignKeySchema>> = HashMap::new();
        for row in &rows {
            let table: String = row.try_get("table_name")?;
            foreign_keys.entry(table).or_default().push(ForeignKeySchema {
                name: row.try_get("constraint_name")?,
                column: row.try_get("column_name")?,
                references_table: row.try_get("references_table")?,
                references_column: row.try_get("references_column")?,
            });
        }
        Ok(foreign_keys)
    }
}

#[async_trait]
impl DbClient for PostgresClient {
    async fn execute(&self, query: &str) -> Result<(), SyncError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(SyncError::Sqlx)?;
        Ok(())
    }

    async fn begin_transaction<'a>(
        &'a self,
    ) -> Result<Box<dyn Transaction + Send + 'a>, SyncError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SyncError::Transaction(e.to_string()))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn server_version(&self) -> Result<String, SyncError> {
        let row = sqlx::query("SELECT version()")
            .fetch_one(&self.pool)
            .await
            .map_err(SyncError::Sqlx)?;
        let version: String = row.try_get(0)?;
        Ok(version)
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, SyncError> {
        let rows = sqlx::query(TABLES_QUERY)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(SyncError::Sqlx)?;

        rows.iter()
            .map(|row| row.try_get("table_name").map_err(SyncError::from))
            .collect()
    }

    async fn introspect_schema(&self, schema: &str) -> Result<Vec<TableSchema>, SyncError> {
        // One transaction for the whole snapshot, so tables, columns, indexes
        // and constraints come from a single point in time.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SyncError::Transaction(e.to_string()))?;

        let rows = sqlx::query(TABLES_QUERY)
            .bind(schema)
            .fetch_all(&mut *tx)
            .await
            .map_err(SyncError::Sqlx)?;
        let names: Vec<String> = rows
            .iter()
            .map(|row| row.try_get("table_name").map_err(SyncError::from))
            .collect::<Result<_, _>>()?;

        let mut indexes = self.schema_indexes(&mut tx, schema).await?;
        let mut foreign_keys = self.schema_foreign_keys(&mut tx, schema).await?;

        let mut tables = Vec::with_capacity(names.len());
        for table_name in names {
            let columns = self.table_columns(&mut tx, schema, &table_name).await?;
            let table = TableSchema {
                columns,
                indexes: indexes.remove(&table_name).unwrap_or_default(),
                foreign_keys: foreign_keys.remove(&table_name).unwrap_or_default(),
                table_name,
            };
            table.ensure_consistent()?;
            tables.push(table);
        }

        tx.commit()
            .await
            .map_err(|e| SyncError::Transaction(e.to_string()))?;
        log::debug!("introspected {} tables in schema {}", tables.len(), schema);
        Ok(tables)
    }
}

pub struct PostgresTransaction<'a> {
    tx: sqlx::Transaction<'a, sqlx::Postgres>,
}

#[async_trait]
impl<'a> Transaction for PostgresTransaction<'a> {
    async fn execute(&mut self, query: &str) -> Result<(), SyncError> {
        sqlx::query(query)
            .execute(&mut *self.tx)
            .await
            .map_err(SyncError::Sqlx)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), SyncError> {
        self.tx
            .commit()
            .await
            .map_err(|e| SyncError::Transaction(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> Result<(), SyncError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| SyncError::Transaction(e.to_string()))
    }
}
