// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Ordered schema migrations.
//!
//! ```text
//! schema_migrations(name PK, hash, applied_at)
//!
//! for each Migration in order:
//!   recorded, same hash     --> skip
//!   recorded, other hash    --> StoreError::MigrationChanged
//!   not recorded            --> BEGIN; sql; INSERT record; COMMIT
//! ```

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::info;

use super::now_millis;
use crate::error::{StoreError, StoreResult};

/// One schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    /// Hex SHA-256 of the migration's SQL.
    #[must_use]
    pub fn hash(&self) -> String {
        format!("{:x}", Sha256::digest(self.sql.as_bytes()))
    }
}

/// The schema, oldest first. Never edit an entry once released.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_releases",
        sql: r"
CREATE TABLE releases (
    release_id   TEXT PRIMARY KEY NOT NULL,
    mod_id       TEXT NOT NULL,
    mod_name     TEXT NOT NULL,
    version      TEXT NOT NULL,
    dependencies TEXT NOT NULL DEFAULT '[]',
    created_at   INTEGER NOT NULL
);

CREATE TABLE release_assets (
    release_id TEXT NOT NULL REFERENCES releases (release_id) ON DELETE CASCADE,
    id         TEXT NOT NULL,
    name       TEXT NOT NULL,
    is_archive INTEGER NOT NULL,
    urls       TEXT NOT NULL DEFAULT '[]',
    position   INTEGER NOT NULL,
    PRIMARY KEY (release_id, id)
);

CREATE TABLE release_symbolic_links (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id     TEXT NOT NULL REFERENCES releases (release_id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    src            TEXT NOT NULL,
    dest           TEXT NOT NULL,
    dest_root      TEXT NOT NULL,
    installed_path TEXT
);

CREATE TABLE release_mission_scripts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id TEXT NOT NULL REFERENCES releases (release_id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    purpose    TEXT NOT NULL,
    path       TEXT NOT NULL,
    root       TEXT NOT NULL,
    run_on     TEXT NOT NULL
);
",
    },
    Migration {
        name: "0002_job_queues",
        sql: r"
CREATE TABLE download_jobs (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id         TEXT NOT NULL,
    asset_id           TEXT NOT NULL,
    url                TEXT NOT NULL,
    target_directory   TEXT NOT NULL,
    status             TEXT NOT NULL DEFAULT 'PENDING'
                       CHECK (status IN ('PENDING', 'IN_PROGRESS', 'COMPLETED')),
    attempt            INTEGER NOT NULL DEFAULT 0,
    max_attempts       INTEGER NOT NULL DEFAULT 3,
    next_attempt_after INTEGER NOT NULL DEFAULT 0,
    progress_percent   INTEGER NOT NULL DEFAULT 0,
    created_at         INTEGER NOT NULL
);
CREATE INDEX idx_download_jobs_claim ON download_jobs (status, created_at, id);
CREATE INDEX idx_download_jobs_release ON download_jobs (release_id);

CREATE TABLE extract_jobs (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id         TEXT NOT NULL,
    asset_id           TEXT NOT NULL,
    archive_path       TEXT NOT NULL,
    target_directory   TEXT NOT NULL,
    status             TEXT NOT NULL DEFAULT 'PENDING'
                       CHECK (status IN ('PENDING', 'IN_PROGRESS', 'COMPLETED')),
    attempt            INTEGER NOT NULL DEFAULT 0,
    max_attempts       INTEGER NOT NULL DEFAULT 3,
    next_attempt_after INTEGER NOT NULL DEFAULT 0,
    progress_percent   INTEGER NOT NULL DEFAULT 0,
    created_at         INTEGER NOT NULL
);
CREATE INDEX idx_extract_jobs_claim ON extract_jobs (status, created_at, id);
CREATE INDEX idx_extract_jobs_release ON extract_jobs (release_id);

CREATE TABLE extract_job_dependencies (
    extract_job_id  INTEGER NOT NULL REFERENCES extract_jobs (id) ON DELETE CASCADE,
    download_job_id INTEGER NOT NULL,
    PRIMARY KEY (extract_job_id, download_job_id)
);
CREATE INDEX idx_extract_job_dependencies_download
    ON extract_job_dependencies (download_job_id);
",
    },
];

/// Applies every migration not yet recorded, returning how many ran.
///
/// # Errors
///
/// Returns `StoreError::MigrationChanged` if a recorded migration's SQL no
/// longer matches its hash, and `StoreError::Sqlx` if a statement fails; a
/// failing migration is rolled back as a whole.
pub async fn run(pool: &SqlitePool, migrations: &[Migration]) -> StoreResult<usize> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name       TEXT PRIMARY KEY NOT NULL,
            hash       TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let recorded: BTreeMap<String, String> =
        sqlx::query_as::<_, (String, String)>("SELECT name, hash FROM schema_migrations")
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let mut applied = 0;
    for migration in migrations {
        let hash = migration.hash();

        if let Some(previous) = recorded.get(migration.name) {
            if *previous != hash {
                return Err(StoreError::MigrationChanged {
                    name: migration.name.to_string(),
                    recorded: previous.clone(),
                    found: hash,
                });
            }
            continue;
        }

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_migrations (name, hash, applied_at) VALUES (?1, ?2, ?3)")
            .bind(migration.name)
            .bind(&hash)
            .bind(now_millis())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(migration = migration.name, "applied migration");
        applied += 1;
    }

    Ok(applied)
}
