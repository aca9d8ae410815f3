//! Postgres-backed repository implementations.
//!
//! The pushdown strategy: joining, grouping, sorting, and limiting happen in
//! SQL so the database index does the ranking work. Semantics match the
//! in-memory strategy in [`crate::infra::memory`] row for row.

mod blogs;
mod comments;
mod engagement;
mod influencers;
mod rankings;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}

/// Aggregate counters come back from Postgres as `BIGINT`; schema checks keep
/// them non-negative, so clamping only guards against manual data edits.
pub(crate) fn convert_count(value: i64) -> u64 {
    value.max(0) as u64
}
