//! Test utilities for database operations.
//!
//! Provides a migrated throwaway database for integration tests.

use std::sync::Arc;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Tables in dependency order (children first).
const TABLES: [&str; 6] = ["likes", "comments", "photos", "follows", "bans", "users"];

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh in-memory `SQLite` database with all migrations applied.
    ///
    /// The pool is capped at one connection: every connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        Self::with_options(opt).await
    }

    /// Connect to `url` and apply all migrations.
    pub async fn connect(url: &str) -> Result<Self, DbErr> {
        Self::with_options(ConnectOptions::new(url)).await
    }

    async fn with_options(opt: ConnectOptions) -> Result<Self, DbErr> {
        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!("Created test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.conn.as_ref()
    }

    /// Get a shared handle to the connection.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Delete all rows from every table.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let backend = self.conn.get_database_backend();
        for table in TABLES {
            self.conn
                .execute(Statement::from_string(
                    backend,
                    format!("DELETE FROM \"{table}\""),
                ))
                .await?;
        }

        info!("Cleaned up test database");
        Ok(())
    }

    /// Count rows in a table.
    pub async fn count_rows(&self, table: &str) -> Result<i64, DbErr> {
        let backend = self.conn.get_database_backend();
        let row = self
            .conn
            .query_one(Statement::from_string(
                backend,
                format!("SELECT COUNT(*) AS n FROM \"{table}\""),
            ))
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(table.to_string()))?;

        row.try_get("", "n")
    }
}
