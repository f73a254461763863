//! Schema migration runner.
//!
//! Migrations live as plain SQL files under `migrations/` and are embedded
//! at compile time via `sqlx::migrate!`, forward-only, with no down
//! migrations.

use sqlx::PgPool;

use crate::error::DbError;

pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))
}
