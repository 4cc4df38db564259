use std::fs;

use db::{postgres::PostgresClient, DbClient};
use errors::SyncError;
use models::connections::ConnectionConfig;
use models::schema::TableSchema;
use sync::diff::SchemaDiff;
use sync::migration::render_script;

pub mod db;
pub mod errors;
pub mod models;
pub mod sync;

/// A source/target pair kept structurally in sync. Plans are computed from
/// two introspection passes; scripts only ever run against the target.
pub struct SyncSession {
    source: Box<dyn DbClient + Send + Sync>,
    target: Box<dyn DbClient + Send + Sync>,
    source_schema: String,
    target_schema: String,
}

/// Snapshots, diff and the migration script of one planning pass.
#[derive(Debug)]
pub struct SyncPlan {
    pub source_tables: Vec<TableSchema>,
    pub target_tables: Vec<TableSchema>,
    pub diff: SchemaDiff,
    pub script: String,
}

impl SyncPlan {
    /// Writes the migration script, newline terminated.
    pub fn write_script(&self, path: &str) -> Result<(), SyncError> {
        fs::write(path, format!("{}\n", self.script))?;
        Ok(())
    }

    /// Writes the source snapshot as pretty-printed JSON.
    pub fn write_snapshot(&self, path: &str) -> Result<(), SyncError> {
        fs::write(path, serde_json::to_string_pretty(&self.source_tables)?)?;
        Ok(())
    }
}

impl SyncSession {
    pub fn new(
        source: Box<dyn DbClient + Send + Sync>,
        target: Box<dyn DbClient + Send + Sync>,
        source_schema: impl Into<String>,
        target_schema: impl Into<String>,
    ) -> Self {
        SyncSession {
            source,
            target,
            source_schema: source_schema.into(),
            target_schema: target_schema.into(),
        }
    }

    pub async fn connect(
        source: &ConnectionConfig,
        target: &ConnectionConfig,
    ) -> Result<Self, SyncError> {
        let source_client = PostgresClient::connect(&source.database_url).await?;
        log::info!("source connected: {}", source_client.server_version().await?);
        let target_client = PostgresClient::connect(&target.database_url).await?;
        log::info!("target connected: {}", target_client.server_version().await?);

        Ok(SyncSession::new(
            Box::new(source_client),
            Box::new(target_client),
            source.schema.clone(),
            target.schema.clone(),
        ))
    }

    /// Introspects both sides and renders the additive script that would
    /// make the target structurally cover the source.
    pub async fn plan(&self) -> Result<SyncPlan, SyncError> {
        let source_tables = self.source.introspect_schema(&self.source_schema).await?;
        let target_tables = self.target.introspect_schema(&self.target_schema).await?;
        let diff = SchemaDiff::between(&source_tables, &target_tables);
        let script = render_script(&diff, &source_tables, Some(&self.target_schema));
        Ok(SyncPlan {
            source_tables,
            target_tables,
            diff,
            script,
        })
    }

    /// Applies a plan's script to the target inside one transaction and
    /// returns the number of statements run.
    pub async fn apply(&self, plan: &SyncPlan) -> Result<usize, SyncError> {
        self.target.apply_script(&plan.script).await
    }

    /// Re-introspects both sides and reports whether anything remains to add
    /// to the target. Target-only structures are ignored.
    pub async fn verify(&self) -> Result<bool, SyncError> {
        let plan = self.plan().await?;
        Ok(plan.diff.target_is_covered())
    }
}
