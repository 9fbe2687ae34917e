//! Postgres-backed persistence for the menu document.

mod menu;

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::application::repos::RepoError;

/// Pool wrapper implementing the menu repository.
#[derive(Clone)]
pub struct PostgresMenuStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PostgresMenuStore {
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
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
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
    }

    pub(crate) fn op_timeout(&self) -> Duration {
        self.op_timeout
    }
}

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        other => RepoError::from_persistence(other),
    }
}
