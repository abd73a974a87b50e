// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Durable job store on SQLite.
//!
//! ```text
//! Store::open(path) / Store::in_memory()
//!   SqliteConnectOptions  WAL, foreign keys, busy_timeout 5s
//!   SqlitePool            one connection
//!   migrations::run       ordered, SHA-256 identified, once each
//!
//! releases ──< release_assets
//!          ──< release_symbolic_links
//!          ──< release_mission_scripts
//! download_jobs >──< extract_job_dependencies >── extract_jobs
//! ```
//!
//! Job rows carry `release_id` without a foreign key: cancelling a release's
//! jobs and deleting its rows are separate steps owned by different
//! components.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tracing::debug;

use crate::error::{FsError, DropzoneResult, StoreResult};

pub mod jobs;
pub mod migrations;
pub mod releases;
pub mod repos;

pub use jobs::{
    DownloadJob, Downloads, ExtractJob, Extracts, JobKind, JobState, JobStatus, JobSummary,
    JobTable, NewJob,
};
pub use repos::{AssetRepository, SubscriptionRepository, SymbolicLinkRepository};

/// Current time as Unix epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Handle to the job store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if needed) the database at `path` and migrates it.
    ///
    /// # Errors
    ///
    /// Returns `FsError` if the parent directory cannot be created and
    /// `StoreError` if the database cannot be opened or migrated.
    pub async fn open(path: &Path) -> DropzoneResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FsError::io(parent, e))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        debug!(path = %path.display(), "opened job store");
        Ok(Self::migrated(pool).await?)
    }

    /// A private in-memory database.
    ///
    /// The pool keeps its single connection forever; closing it would drop
    /// the database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be created or migrated.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> StoreResult<Self> {
        let applied = migrations::run(&pool, migrations::MIGRATIONS).await?;
        if applied > 0 {
            debug!(applied, "applied migrations");
        }
        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests;
