//! CLI execution context.

use chrono::{Local, NaiveDate};
use khata_db::{CatalogLookup, Database, DbConfig, DocumentService};
use std::path::PathBuf;
use tracing::debug;

use crate::config::KhataConfig;
use crate::error::CliResult;

/// Everything a command needs: configuration and an open database.
pub struct Context {
    pub config: KhataConfig,
    pub db: Database,
    /// Print machine-readable JSON instead of text.
    pub json: bool,
}

impl Context {
    /// Opens the database named by `--db`, the config, or the data dir.
    pub async fn open(config: KhataConfig, db_override: Option<PathBuf>, json: bool) -> CliResult<Self> {
        let path = config.database_path(db_override)?;
        debug!(path = %path.display(), "Opening database");

        let db_config = DbConfig::new(path).max_connections(config.database.max_connections);
        let db = Database::new(db_config).await?;

        Ok(Context { config, db, json })
    }

    /// Context over a fresh in-memory database.
    #[cfg(test)]
    pub async fn in_memory(config: KhataConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Context {
            config,
            db,
            json: false,
        }
    }

    pub fn documents(&self) -> DocumentService<Database> {
        DocumentService::new(self.db.clone(), self.config.documents.numbering())
    }

    pub fn lookup(&self) -> CatalogLookup<Database> {
        CatalogLookup::new(self.db.clone())
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
