use crate::{errors::SyncError, models::schema::TableSchema};
use async_trait::async_trait;

pub mod postgres;

#[async_trait]
pub trait DbClient {
    async fn execute(&self, query: &str) -> Result<(), SyncError>;
    async fn begin_transaction<'a>(&'a self)
        -> Result<Box<dyn Transaction + Send + 'a>, SyncError>;
    /// Server version string, used as a connection check.
    async fn server_version(&self) -> Result<String, SyncError>;
    /// Base table names in `schema`, sorted by name.
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, SyncError>;
    /// Full snapshot of `schema`: tables with columns, indexes and foreign
    /// keys, read inside one transaction.
    async fn introspect_schema(&self, schema: &str) -> Result<Vec<TableSchema>, SyncError>;

    /// Runs every statement of `script` inside one transaction and returns
    /// how many were applied. The first failure rolls the whole script back
    /// and reports the offending statement.
    async fn apply_script(&self, script: &str) -> Result<usize, SyncError> {
        let statements = split_statements(script);
        if statements.is_empty() {
            return Ok(0);
        }

        let mut tx = self.begin_transaction().await?;
        for (i, statement) in statements.iter().enumerate() {
            log::debug!("applying statement {}/{}", i + 1, statements.len());
            if let Err(err) = tx.execute(statement).await {
                let reason = err.to_string();
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!("rollback failed: {}", rollback_err);
                }
                return Err(SyncError::Apply {
                    statement: statement.clone(),
                    reason,
                });
            }
        }
        tx.commit().await?;
        Ok(statements.len())
    }
}

#[async_trait]
pub trait Transaction {
    async fn execute(&mut self, query: &str) -> Result<(), SyncError>;
    async fn commit(self: Box<Self>) -> Result<(), SyncError>;
    async fn rollback(self: Box<Self>) -> Result<(), SyncError>;
}

/// Splits a script on statement-terminating semicolons, ignoring semicolons
/// inside quoted literals. Blank fragments are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in script.chars() {
        match ch {
            '\'' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ';' if !in_quotes => {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    statements
}
