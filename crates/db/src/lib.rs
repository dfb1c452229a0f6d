//! Persistence for the Folio wiki engine.
//!
//! Row models and zero-sized `*Repo` structs over [`DbPool`], the
//! [`WikiStore`](store::WikiStore) trait the engine talks to, and two
//! implementations of it: [`PgStore`](store::PgStore) and the in-process
//! [`MemoryStore`](memory::MemoryStore).

use sqlx::postgres::PgPoolOptions;

pub mod constraints;
pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{PgStore, WikiStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Apply the migrations in `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
