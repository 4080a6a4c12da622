//! Database layer for the Past Papers services
//!
//! Provides:
//! - SeaORM entity models
//! - The `PaperStore` abstraction and its SeaORM-backed `Repository`
//! - Connection handle lifecycle (connect, schema, ping, close)

pub mod models;
mod repository;

pub use repository::{PaperStore, Repository};

use crate::config::DatabaseConfig;
use crate::db::models::{PaperColumn, PaperEntity};
use crate::errors::{AppError, Result};
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

/// Name of the composite (unit_code, year_taken) lookup index
pub const PAPER_KEY_INDEX: &str = "idx_papers_unit_code_year_taken";

/// Owned handle to the store connection.
///
/// Opened once at startup, cloned into router state (clones share the
/// underlying pool) and released with [`DbPool::close`].
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Open a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!(backend = ?conn.get_database_backend(), "Database connection established");

        Ok(Self { conn })
    }

    /// Create the papers table and its lookup index if they are missing
    pub async fn ensure_schema(&self, unique_composite_key: bool) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let mut table = schema.create_table_from_entity(PaperEntity);
        table.if_not_exists();
        self.conn.execute(backend.build(&table)).await?;

        let mut index = Index::create();
        index
            .name(PAPER_KEY_INDEX)
            .table(PaperEntity)
            .col(PaperColumn::UnitCode)
            .col(PaperColumn::YearTaken)
            .if_not_exists();
        if unique_composite_key {
            index.unique();
        }
        self.conn.execute(backend.build(&index)).await?;

        info!(unique_composite_key, "Paper schema ready");
        Ok(())
    }

    /// The underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })
    }

    /// Release the connection pool
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Close failed: {}", e),
            })?;

        info!("Database connection closed");
        Ok(())
    }
}
