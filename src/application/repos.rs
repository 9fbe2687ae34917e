//! Repository traits describing persistence adapters.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::menu::MenuDocument;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("menu document not found")]
    NotFound,
    #[error("store operation timed out")]
    Timeout,
    #[error("menu version conflict (expected {expected})")]
    Conflict { expected: i64 },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// The menu document together with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuRecord {
    pub document: MenuDocument,
    pub version: i64,
}

/// Persistence seam for the singleton menu aggregate.
///
/// Reads fetch the whole document; writes replace it wholesale, guarded by
/// the version loaded alongside it. There is no partial update.
#[async_trait]
pub trait MenuRepo: Send + Sync {
    /// Resolve once the store can serve queries, or fail within `timeout`.
    async fn await_ready(&self, timeout: Duration) -> Result<(), RepoError>;

    /// Fetch the document, or `None` on an uninitialized deployment.
    async fn load_menu(&self) -> Result<Option<MenuRecord>, RepoError>;

    /// Replace the document if its stored version still equals
    /// `expected_version`; returns the new version. A concurrent write in
    /// between surfaces as [`RepoError::Conflict`].
    async fn replace_menu(
        &self,
        document: &MenuDocument,
        expected_version: i64,
    ) -> Result<i64, RepoError>;

    /// Create the document on a fresh deployment. Fails with
    /// [`RepoError::Conflict`] if one already exists.
    async fn create_menu(&self, document: &MenuDocument) -> Result<i64, RepoError>;
}
