//! Persistence for legislative notices.
//!
//! [`LegislationStore`] is the seam the pipeline and the API depend on.
//! [`PgLegislationStore`] backs it with PostgreSQL through
//! [`LegislationRepo`](repositories::LegislationRepo);
//! [`MemoryLegislationStore`] backs it with an in-process map for tests and
//! database-less runs.

pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub use error::StoreError;
pub use memory::MemoryLegislationStore;
pub use store::{LegislationStore, PgLegislationStore};

/// Connection pool type used throughout the workspace.
pub type DbPool = sqlx::PgPool;

/// Create a connection pool for `database_url`.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to prove the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
