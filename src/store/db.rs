use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::schema::SCHEMA_SQL;

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    /// Open (creating if missing) the sqlite store behind `database_url`.
    /// Foreign keys are enforced so join rows cannot outlive their parents.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!("connected to db");
        Ok(Self { pool })
    }

    /// In-memory store for tests. A single connection keeps the database alive
    /// for the pool's lifetime.
    #[cfg(test)]
    pub async fn memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Apply the idempotent DDL bundle.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}
