use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::types::Json;

use crate::{
    application::repos::{MenuRecord, MenuRepo, RepoError},
    domain::menu::MenuDocument,
};

use super::{PostgresMenuStore, map_sqlx_error};

const READY_PROBE_INTERVAL: Duration = Duration::from_millis(250);

#[derive(sqlx::FromRow)]
struct MenuRow {
    document: Json<MenuDocument>,
    version: i64,
}

impl From<MenuRow> for MenuRecord {
    fn from(row: MenuRow) -> Self {
        Self {
            document: row.document.0,
            version: row.version,
        }
    }
}

impl PostgresMenuStore {
    async fn with_deadline<T>(
        &self,
        op: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, RepoError> {
        match tokio::time::timeout(self.op_timeout(), op).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(RepoError::Timeout),
        }
    }
}

#[async_trait]
impl MenuRepo for PostgresMenuStore {
    async fn await_ready(&self, timeout: Duration) -> Result<(), RepoError> {
        let probe = async {
            loop {
                if self.health_check().await.is_ok() {
                    return;
                }
                tokio::time::sleep(READY_PROBE_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, probe)
            .await
            .map_err(|_| RepoError::Timeout)
    }

    async fn load_menu(&self) -> Result<Option<MenuRecord>, RepoError> {
        let row = self
            .with_deadline(
                sqlx::query_as::<_, MenuRow>(
                    "SELECT document, version FROM menu_documents WHERE id",
                )
                .fetch_optional(self.pool()),
            )
            .await?;
        Ok(row.map(MenuRecord::from))
    }

    async fn replace_menu(
        &self,
        document: &MenuDocument,
        expected_version: i64,
    ) -> Result<i64, RepoError> {
        let row = self
            .with_deadline(
                sqlx::query(
                    "UPDATE menu_documents \
                     SET document = $1, version = version + 1, updated_at = now() \
                     WHERE id AND version = $2 \
                     RETURNING version",
                )
                .bind(Json(document))
                .bind(expected_version)
                .fetch_optional(self.pool()),
            )
            .await?;

        match row {
            Some(row) => row.try_get("version").map_err(map_sqlx_error),
            None => {
                // Either no document exists or someone wrote in between.
                let exists = self
                    .with_deadline(
                        sqlx::query("SELECT 1 FROM menu_documents WHERE id")
                            .fetch_optional(self.pool()),
                    )
                    .await?;
                match exists {
                    Some(_) => Err(RepoError::Conflict {
                        expected: expected_version,
                    }),
                    None => Err(RepoError::NotFound),
                }
            }
        }
    }

    async fn create_menu(&self, document: &MenuDocument) -> Result<i64, RepoError> {
        let row = self
            .with_deadline(
                sqlx::query(
                    "INSERT INTO menu_documents (id, document, version) \
                     VALUES (TRUE, $1, 1) \
                     ON CONFLICT (id) DO NOTHING \
                     RETURNING version",
                )
                .bind(Json(document))
                .fetch_optional(self.pool()),
            )
            .await?;

        match row {
            Some(row) => row.try_get("version").map_err(map_sqlx_error),
            None => Err(RepoError::Conflict { expected: 0 }),
        }
    }
}
