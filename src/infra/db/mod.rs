//! Database connection and schema management.
//!
//! Postgres in deployment; SQLite (including `sqlite::memory:`) works for
//! local runs and tests since the schema only uses portable column types.

use std::collections::HashSet;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr,
    EntityTrait, QueryOrder, Statement,
};
use sea_orm_migration::{seaql_migrations, MigratorTrait};

use crate::config::Config;

pub mod migrations;

pub use migrations::Migrator;

/// Shared handle to the user database.
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Connect to `DATABASE_URL` and bring the schema up to date.
    pub async fn connect(config: &Config) -> Result<Self, DbErr> {
        Self::connect_url(&config.database_url).await
    }

    /// Connect to `url` and bring the schema up to date.
    pub async fn connect_url(url: &str) -> Result<Self, DbErr> {
        let database = Self::open(url).await?;

        database.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Schema migration failed");
            e
        })?;

        tracing::info!(backend = ?database.connection.get_database_backend(), "Database ready");
        Ok(database)
    }

    /// Connect without touching the schema; `migrate` drives it by hand.
    pub async fn connect_without_migrations(config: &Config) -> Result<Self, DbErr> {
        Self::open(&config.database_url).await
    }

    async fn open(url: &str) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(url);
        // Each pooled connection would open its own in-memory database.
        if url.contains(":memory:") {
            options.max_connections(1);
        }
        let connection = SeaDatabase::connect(options).await?;
        Ok(Self { connection })
    }

    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(&self.connection, None).await
    }

    /// Revert the most recent migration.
    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        Migrator::down(&self.connection, Some(1)).await
    }

    /// Every known migration paired with whether it has been applied.
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|row| row.version)
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|migration| {
                let name = migration.name().to_string();
                let done = applied.contains(&name);
                (name, done)
            })
            .collect())
    }

    /// Drop every table and migrate from scratch.
    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        Migrator::fresh(&self.connection).await
    }

    /// Round-trip a trivial query; used by the health check.
    pub async fn ping(&self) -> Result<(), DbErr> {
        let backend = self.connection.get_database_backend();
        self.connection
            .execute(Statement::from_string(backend, "SELECT 1"))
            .await
            .map(|_| ())
    }
}
