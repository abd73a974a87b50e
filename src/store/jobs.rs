// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Download and extract job rows.
//!
//! ```text
//!            claim_next                 complete
//! PENDING ──────────────> IN_PROGRESS ──────────> COMPLETED
//!    ^                        │
//!    └──── requeue / stall ───┘
//! ```
//!
//! A job is eligible for claiming when it is `PENDING`, has attempts left,
//! its backoff has elapsed and, for extracts, every download it depends on
//! is `COMPLETED`. A `PENDING` job with no attempts left is stalled and is
//! never claimed again.

use std::fmt;

use serde::Serialize;
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;

use super::{Store, now_millis};
use crate::error::{StoreError, StoreResult};

/// Lifecycle state of a job row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
}

impl JobStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for JobStatus {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(StoreError::InvalidValue {
                column: "status",
                value,
            }),
        }
    }
}

/// Columns shared by both job tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct JobState {
    pub id: i64,
    pub release_id: String,
    pub asset_id: String,
    pub target_directory: String,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub attempt: i64,
    pub max_attempts: i64,
    /// Epoch milliseconds before which the job is not claimed.
    pub next_attempt_after: i64,
    pub progress_percent: i64,
    pub created_at: i64,
}

impl JobState {
    /// Out of attempts without completing.
    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        !matches!(self.status, JobStatus::Completed) && self.attempt >= self.max_attempts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DownloadJob {
    pub url: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub state: JobState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ExtractJob {
    pub archive_path: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub state: JobState,
}

/// Per-release aggregate over both job tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow)]
pub struct JobSummary {
    pub total: i64,
    /// `PENDING` with attempts left.
    pub pending: i64,
    pub stalled: i64,
    pub downloading: i64,
    pub extracting: i64,
    /// Mean `progress_percent` over every row, 0 without rows.
    pub progress: f64,
}

/// Fields common to a job insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub release_id: String,
    pub asset_id: String,
    pub target_directory: String,
    pub max_attempts: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Download,
    Extract,
}

impl JobKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Extract => "extract",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job table, so the queue and its store operations are written once.
pub trait JobTable: Send + Sync + 'static {
    type Job: for<'r> FromRow<'r, SqliteRow> + Clone + fmt::Debug + Send + Sync + Unpin + 'static;

    const KIND: JobKind;
    const TABLE: &'static str;
    const COLUMNS: &'static str;
    /// Extra claim condition on alias `j`.
    const ELIGIBLE: &'static str;

    fn state(job: &Self::Job) -> &JobState;
}

/// Marker for `download_jobs`.
#[derive(Debug, Clone, Copy)]
pub struct Downloads;

impl JobTable for Downloads {
    type Job = DownloadJob;

    const KIND: JobKind = JobKind::Download;
    const TABLE: &'static str = "download_jobs";
    const COLUMNS: &'static str = "url, id, release_id, asset_id, target_directory, status, \
                                   attempt, max_attempts, next_attempt_after, progress_percent, \
                                   created_at";
    const ELIGIBLE: &'static str = "";

    fn state(job: &DownloadJob) -> &JobState {
        &job.state
    }
}

/// Marker for `extract_jobs`.
#[derive(Debug, Clone, Copy)]
pub struct Extracts;

impl JobTable for Extracts {
    type Job = ExtractJob;

    const KIND: JobKind = JobKind::Extract;
    const TABLE: &'static str = "extract_jobs";
    const COLUMNS: &'static str = "archive_path, id, release_id, asset_id, target_directory, \
                                   status, attempt, max_attempts, next_attempt_after, \
                                   progress_percent, created_at";
    const ELIGIBLE: &'static str = "AND NOT EXISTS (
            SELECT 1 FROM extract_job_dependencies d
            WHERE d.extract_job_id = j.id
              AND NOT EXISTS (
                  SELECT 1 FROM download_jobs dj
                  WHERE dj.id = d.download_job_id AND dj.status = 'COMPLETED'
              )
        )";

    fn state(job: &ExtractJob) -> &JobState {
        &job.state
    }
}

impl Store {
    /// Inserts a `PENDING` download job and returns its id.
    pub async fn insert_download_job(&self, job: &NewJob, url: &str) -> StoreResult<i64> {
        let id = sqlx::query_scalar(
            "INSERT INTO download_jobs
                (release_id, asset_id, url, target_directory, max_attempts, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
        )
        .bind(&job.release_id)
        .bind(&job.asset_id)
        .bind(url)
        .bind(&job.target_directory)
        .bind(job.max_attempts)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Inserts a `PENDING` extract job that waits for `depends_on`.
    pub async fn insert_extract_job(
        &self,
        job: &NewJob,
        archive_path: &str,
        depends_on: &[i64],
    ) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO extract_jobs
                (release_id, asset_id, archive_path, target_directory, max_attempts, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id",
        )
        .bind(&job.release_id)
        .bind(&job.asset_id)
        .bind(archive_path)
        .bind(&job.target_directory)
        .bind(job.max_attempts)
        .bind(now_millis())
        .fetch_one(&mut *tx)
        .await?;

        for download_id in depends_on {
            sqlx::query(
                "INSERT OR IGNORE INTO extract_job_dependencies (extract_job_id, download_job_id)
                 VALUES (?1, ?2)",
            )
            .bind(id)
            .bind(download_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Download ids an extract job waits for.
    pub async fn extract_dependencies(&self, extract_job_id: i64) -> StoreResult<Vec<i64>> {
        let ids = sqlx::query_scalar(
            "SELECT download_job_id FROM extract_job_dependencies
             WHERE extract_job_id = ?1
             ORDER BY download_job_id",
        )
        .bind(extract_job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn find_job<T: JobTable>(&self, id: i64) -> StoreResult<Option<T::Job>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", T::COLUMNS, T::TABLE);
        let job = sqlx::query_as::<_, T::Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// Jobs of one release, oldest first.
    pub async fn jobs_for_release<T: JobTable>(&self, release_id: &str) -> StoreResult<Vec<T::Job>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE release_id = ?1 ORDER BY created_at, id",
            T::COLUMNS,
            T::TABLE
        );
        let jobs = sqlx::query_as::<_, T::Job>(&sql)
            .bind(release_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    /// Oldest job left `IN_PROGRESS` by a previous run.
    pub async fn find_in_progress<T: JobTable>(&self) -> StoreResult<Option<T::Job>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE status = 'IN_PROGRESS' ORDER BY created_at, id LIMIT 1",
            T::COLUMNS,
            T::TABLE
        );
        let job = sqlx::query_as::<_, T::Job>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// Atomically moves the oldest eligible job to `IN_PROGRESS`.
    pub async fn claim_next<T: JobTable>(&self, now: i64) -> StoreResult<Option<T::Job>> {
        let sql = format!(
            "UPDATE {table}
             SET status = 'IN_PROGRESS', progress_percent = 0
             WHERE id = (
                 SELECT j.id FROM {table} j
                 WHERE j.status = 'PENDING'
                   AND j.attempt < j.max_attempts
                   AND j.next_attempt_after <= ?1
                   {eligible}
                 ORDER BY j.created_at, j.id
                 LIMIT 1
             )
             AND status = 'PENDING'
             RETURNING {columns}",
            table = T::TABLE,
            eligible = T::ELIGIBLE,
            columns = T::COLUMNS,
        );
        let job = sqlx::query_as::<_, T::Job>(&sql)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// Raises the stored progress; it never goes down while a job runs.
    ///
    /// Returns false if the row no longer exists.
    pub async fn update_progress<T: JobTable>(&self, id: i64, percent: u8) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE {} SET progress_percent = MAX(progress_percent, ?1) WHERE id = ?2",
            T::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(i64::from(percent.min(100)))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Marks a running job `COMPLETED` at 100%.
    ///
    /// Returns false if the row is gone or not `IN_PROGRESS`.
    pub async fn complete_job<T: JobTable>(&self, id: i64) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE {} SET status = 'COMPLETED', progress_percent = 100
             WHERE id = ?1 AND status = 'IN_PROGRESS'",
            T::TABLE
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Puts a job back to `PENDING` until `next_attempt_after`.
    ///
    /// `spend_attempt` adds one to the attempt counter, capped at
    /// `max_attempts`. Returns the new counter, or `None` if the row is gone.
    pub async fn requeue_job<T: JobTable>(
        &self,
        id: i64,
        next_attempt_after: i64,
        spend_attempt: bool,
    ) -> StoreResult<Option<i64>> {
        let sql = format!(
            "UPDATE {}
             SET status = 'PENDING',
                 attempt = MIN(attempt + ?1, max_attempts),
                 next_attempt_after = ?2
             WHERE id = ?3
             RETURNING attempt",
            T::TABLE
        );
        let attempt = sqlx::query_scalar(&sql)
            .bind(i64::from(spend_attempt))
            .bind(next_attempt_after)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(attempt)
    }

    /// Exhausts a job's attempts so it is never claimed again.
    pub async fn stall_job<T: JobTable>(&self, id: i64) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE {} SET status = 'PENDING', attempt = max_attempts WHERE id = ?1",
            T::TABLE
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes every job of a release, with its dependency rows.
    pub async fn delete_jobs_for_release<T: JobTable>(&self, release_id: &str) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;

        if matches!(T::KIND, JobKind::Extract) {
            sqlx::query(
                "DELETE FROM extract_job_dependencies
                 WHERE extract_job_id IN (SELECT id FROM extract_jobs WHERE release_id = ?1)",
            )
            .bind(release_id)
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!("DELETE FROM {} WHERE release_id = ?1", T::TABLE);
        let result = sqlx::query(&sql).bind(release_id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Mean progress of a release's jobs in one table, `None` without jobs.
    pub async fn release_progress<T: JobTable>(&self, release_id: &str) -> StoreResult<Option<f64>> {
        let sql = format!(
            "SELECT AVG(progress_percent) FROM {} WHERE release_id = ?1",
            T::TABLE
        );
        let mean = sqlx::query_scalar::<_, Option<f64>>(&sql)
            .bind(release_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(mean)
    }

    /// Counts and mean progress over a release's download and extract rows.
    pub async fn job_summary(&self, release_id: &str) -> StoreResult<JobSummary> {
        let summary = sqlx::query_as::<_, JobSummary>(
            "SELECT
                 COUNT(*) AS total,
                 COALESCE(SUM(status = 'PENDING' AND attempt < max_attempts), 0) AS pending,
                 COALESCE(SUM(status <> 'COMPLETED' AND attempt >= max_attempts), 0) AS stalled,
                 COALESCE(SUM(kind = 'download' AND status = 'IN_PROGRESS'), 0) AS downloading,
                 COALESCE(SUM(kind = 'extract' AND status = 'IN_PROGRESS'), 0) AS extracting,
                 COALESCE(AVG(progress_percent), 0.0) AS progress
             FROM (
                 SELECT 'download' AS kind, status, attempt, max_attempts, progress_percent
                 FROM download_jobs WHERE release_id = ?1
                 UNION ALL
                 SELECT 'extract' AS kind, status, attempt, max_attempts, progress_percent
                 FROM extract_jobs WHERE release_id = ?1
             )",
        )
        .bind(release_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}
