//! Database layer for photoshare.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use photoshare_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt).await.map_err(map_db_err)
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None).await.map_err(map_db_err)
}

/// Translate a store error into the application taxonomy.
///
/// Unique violations are `Conflict`, foreign key violations (a referenced row
/// vanished under a concurrent delete) are `Conflict`, pool exhaustion is
/// `Unavailable`. Anything else is an opaque `Database` error.
///
/// Conflict messages are fixed; the store's own text is only logged.
#[must_use]
pub fn map_db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(%detail, "unique constraint violation");
            return AppError::Conflict("Already exists".to_string());
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            tracing::debug!(%detail, "foreign key constraint violation");
            return AppError::Conflict("Referenced record no longer exists".to_string());
        }
        _ => {}
    }

    match err {
        DbErr::ConnectionAcquire(e) => AppError::Unavailable(e.to_string()),
        other => AppError::Database(other.to_string()),
    }
}
