use std::env;

use serde::{Deserialize, Serialize};

use crate::errors::SyncError;

/// Where one side of a sync run connects, and which schema it reads.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConnectionConfig {
    pub database_url: String,
    pub schema: String,
}

impl ConnectionConfig {
    pub fn new(database_url: impl Into<String>, schema: impl Into<String>) -> Self {
        ConnectionConfig {
            database_url: database_url.into(),
            schema: schema.into(),
        }
    }

    /// Reads `<PREFIX>_DATABASE_URL` and `<PREFIX>_SCHEMA` from the
    /// environment. The schema falls back to `SYNC_SCHEMA`, then to `public`.
    pub fn from_env(prefix: &str) -> Result<Self, SyncError> {
        let url_var = format!("{}_DATABASE_URL", prefix);
        let database_url = env::var(&url_var)
            .map_err(|_| SyncError::Config(format!("{} must be set", url_var)))?;
        let schema = env::var(format!("{}_SCHEMA", prefix))
            .or_else(|_| env::var("SYNC_SCHEMA"))
            .unwrap_or_else(|_| "public".to_string());
        Ok(ConnectionConfig {
            database_url,
            schema,
        })
    }
}
