//! MetricsSvc: click recording for the popularity signal tables.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::EntryStore;
use crate::error::{DbError, ServiceError};

#[derive(Clone)]
pub struct MetricsSvc {
    store: EntryStore,
    pool: PgPool,
}

impl MetricsSvc {
    pub fn new(store: EntryStore, pool: PgPool) -> Self {
        Self { store, pool }
    }

    pub async fn record_click(&self, entry_id: Uuid) -> Result<(), ServiceError> {
        if entry_id.is_nil() {
            return Err(ServiceError::InvalidArgument("entry_id is required".to_string()));
        }

        let entry = self.store.get(entry_id).await?;
        if entry.is_none() {
            return Err(ServiceError::NotFound(format!("entry not found: {entry_id}")));
        }

        sqlx::query("INSERT INTO click_metrics (entry_id, clicked_at) VALUES ($1, $2)")
            .bind(entry_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    /// A pool that never actually connects; fine here because
    /// `record_click` rejects a nil `entry_id` before touching the store.
    fn lazy_pool() -> PgPool {
        PgPoolOptions::new().connect_lazy_with(PgConnectOptions::new())
    }

    #[tokio::test]
    async fn nil_entry_id_is_rejected() {
        let pool = lazy_pool();
        let svc = MetricsSvc::new(EntryStore::new(pool.clone()), pool);

        let result = svc.record_click(Uuid::nil()).await;
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    }
}
