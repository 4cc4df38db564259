use std::env;

use pgsync::models::connections::ConnectionConfig;
use pgsync::SyncSession;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let source = ConnectionConfig::from_env("SOURCE")?;
    let target = ConnectionConfig::from_env("TARGET")?;

    let session = SyncSession::connect(&source, &target).await?;
    let plan = session.plan().await?;

    log::info!(
        "source schema {} has {} tables, target schema {} has {}",
        source.schema,
        plan.source_tables.len(),
        target.schema,
        plan.target_tables.len()
    );
    if !plan.diff.tables_only_in_target.is_empty() {
        log::warn!(
            "tables only in target, left untouched: {}",
            plan.diff.tables_only_in_target.join(", ")
        );
    }
    for (table, table_diff) in &plan.diff.altered_tables {
        if !table_diff.columns_only_in_target.is_empty() {
            log::warn!(
                "table {}: columns only in target, left untouched: {}",
                table,
                table_diff.columns_only_in_target.join(", ")
            );
        }
    }
    print!("{}", plan.diff);

    if let Ok(path) = env::var("SYNC_SNAPSHOT") {
        plan.write_snapshot(&path)?;
        log::info!("source schema snapshot written to {}", path);
    }

    let output = env::var("SYNC_OUTPUT").unwrap_or_else(|_| "schema_sync.sql".to_string());
    plan.write_script(&output)?;
    println!("migration script written to {}", output);

    if env::var("SYNC_APPLY").map(|v| v == "1").unwrap_or(false) {
        let applied = session.apply(&plan).await?;
        log::info!("applied {} statements to target", applied);
        if session.verify().await? {
            println!("target schema now covers the source");
        } else {
            log::warn!("target schema still differs after apply");
        }
    }

    Ok(())
}
