//! # clinic-db
//!
//! Persistence layer for the clinic directory:
//! - **Relational store**: companies, users, doctors through `sqlx::AnyPool`,
//!   PostgreSQL in production and SQLite in lite mode
//! - **Object storage**: profile images in S3/MinIO or on the local disk

pub mod repository;
pub mod storage;

use anyhow::{Context, Result};
use clinic_common::config::DatabaseConfig;
use sqlx::AnyPool;

/// Shared database state passed through Axum extractors.
#[derive(Clone)]
pub struct Database {
    pub pool: AnyPool,
}

impl Database {
    /// Connect to the configured database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        tracing::info!("Connecting to database...");
        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await
            .context("Failed to connect to database")?;
        tracing::info!("Connected to database");

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Health check: verify the database is reachable.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
