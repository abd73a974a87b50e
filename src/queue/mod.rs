// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Single-flight job queues.
//!
//! ```text
//! JobQueue<T>::run(shutdown)
//!   loop:
//!     run_once
//!       adopt IN_PROGRESS row  |  claim oldest eligible PENDING row
//!       active slot <- { id, release_id, child token }
//!       JobRunner::run(job, ctx) ──progress──> flume ──> writer task
//!                                                        MAX(progress) in store
//!                                                        row gone => cancel
//!       row watchdog: every row_check, row gone => cancel
//!       settle outcome
//!     idle: wait for notify() | poll interval | shutdown
//! ```
//!
//! Outcome policy:
//!
//! | outcome            | row                                             |
//! |--------------------|-------------------------------------------------|
//! | `Ok`               | `COMPLETED`, 100%                               |
//! | `Validation`       | `PENDING` after backoff, attempt unchanged      |
//! | rejected input     | stalled immediately                             |
//! | other, shutdown    | left `IN_PROGRESS`, adopted on next start       |
//! | other              | `PENDING` after backoff, attempt + 1            |

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{DropzoneResult, StoreResult};
use crate::store::{JobState, JobTable, Store, now_millis};
use crate::tools::{Progress, ToolContext};

pub mod download;
pub mod extract;

pub use download::{DownloadQueue, DownloadRunner};
pub use extract::{ExtractQueue, ExtractRunner};

/// Executes one job of table `T`, returning the produced artifact.
///
/// # Lifetime
///
/// Returns `BoxFuture` so queues can hold runners as trait objects.
pub trait JobRunner<T: JobTable>: Send + Sync {
    fn run<'a>(
        &'a self,
        job: &'a T::Job,
        ctx: &'a ToolContext,
    ) -> BoxFuture<'a, DropzoneResult<PathBuf>>;
}

/// How long a cancel waits for the aborted process to exit.
const ABORT_GRACE: Duration = Duration::from_secs(10);

/// How often a running job checks that its row still exists.
///
/// Another process holding the same database (the CLI) removes a release by
/// deleting its rows; the running job notices here.
const ROW_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// The job currently running in a queue.
#[derive(Debug)]
struct ActiveJob {
    id: i64,
    release_id: String,
    token: CancellationToken,
    /// Cancelled once the runner has returned.
    finished: CancellationToken,
}

/// Scheduler for one job table; at most one job runs at a time.
pub struct JobQueue<T: JobTable> {
    store: Store,
    runner: Arc<dyn JobRunner<T>>,
    retry_delay: Duration,
    poll_interval: Duration,
    row_check: Duration,
    active: Mutex<Option<ActiveJob>>,
    wake: Notify,
}

impl<T: JobTable> JobQueue<T> {
    #[must_use]
    pub fn new(
        store: Store,
        runner: Arc<dyn JobRunner<T>>,
        retry_delay: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            runner,
            retry_delay,
            poll_interval,
            row_check: ROW_CHECK_INTERVAL,
            active: Mutex::new(None),
            wake: Notify::new(),
        }
    }

    /// Overrides how often the running job's row is checked.
    #[must_use]
    pub fn with_row_check(mut self, interval: Duration) -> Self {
        self.row_check = interval;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Asks the loop to try a claim now.
    pub fn notify(&self) {
        self.wake.notify_one();
    }

    /// Id of the running job, if any.
    #[must_use]
    pub fn active_job(&self) -> Option<i64> {
        self.slot().as_ref().map(|active| active.id)
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ActiveJob>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs jobs until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(queue = %T::KIND, poll_secs = self.poll_interval.as_secs(), "queue started");

        while !shutdown.is_cancelled() {
            match self.run_once(&shutdown).await {
                // a job just finished: look for the next one right away
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => error!(queue = %T::KIND, error = %e, "queue step failed"),
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = self.wake.notified() => {}
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!(queue = %T::KIND, "queue stopped");
    }

    /// Adopts or claims one job and runs it to an outcome.
    ///
    /// Returns false when nothing was eligible.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read or updated.
    pub async fn run_once(&self, shutdown: &CancellationToken) -> DropzoneResult<bool> {
        let job = if let Some(job) = self.store.find_in_progress::<T>().await? {
            let state = T::state(&job);
            info!(
                queue = %T::KIND,
                job_id = state.id,
                release_id = %state.release_id,
                attempt = state.attempt,
                "resuming interrupted job"
            );
            job
        } else if let Some(job) = self.store.claim_next::<T>(now_millis()).await? {
            job
        } else {
            return Ok(false);
        };

        self.execute(job, shutdown).await?;
        Ok(true)
    }

    async fn execute(&self, job: T::Job, shutdown: &CancellationToken) -> DropzoneResult<()> {
        let state = T::state(&job).clone();
        let token = shutdown.child_token();
        let finished = CancellationToken::new();

        *self.slot() = Some(ActiveJob {
            id: state.id,
            release_id: state.release_id.clone(),
            token: token.clone(),
            finished: finished.clone(),
        });

        info!(
            queue = %T::KIND,
            job_id = state.id,
            release_id = %state.release_id,
            attempt = state.attempt,
            "job started"
        );

        let (tx, rx) = flume::unbounded::<u8>();
        let writer = tokio::spawn(write_progress::<T>(
            self.store.clone(),
            state.id,
            rx,
            token.clone(),
        ));
        let watchdog = tokio::spawn(watch_row::<T>(
            self.store.clone(),
            state.id,
            self.row_check,
            token.clone(),
            finished.clone(),
        ));

        let ctx = ToolContext::new(
            token.clone(),
            Arc::new(move |progress: Progress| {
                let _ = tx.send(progress.percent);
            }),
        );
        let result = self.runner.run(&job, &ctx).await;
        finished.cancel();
        drop(ctx);

        if let Err(e) = writer.await {
            warn!(queue = %T::KIND, job_id = state.id, error = %e, "progress writer failed");
        }
        if let Err(e) = watchdog.await {
            warn!(queue = %T::KIND, job_id = state.id, error = %e, "row watchdog failed");
        }

        {
            let mut slot = self.slot();
            if slot.as_ref().is_some_and(|active| active.id == state.id) {
                *slot = None;
            }
        }

        self.settle(&state, &token, result, shutdown).await?;
        Ok(())
    }

    async fn settle(
        &self,
        state: &JobState,
        token: &CancellationToken,
        result: DropzoneResult<PathBuf>,
        shutdown: &CancellationToken,
    ) -> StoreResult<()> {
        let id = state.id;
        let queue = T::KIND.as_str();

        let error = match result {
            Ok(artifact) => {
                if self.store.complete_job::<T>(id).await? {
                    info!(
                        queue,
                        job_id = id,
                        release_id = %state.release_id,
                        artifact = %artifact.display(),
                        "job completed"
                    );
                } else {
                    debug!(queue, job_id = id, "job row removed before completion");
                }
                return Ok(());
            }
            Err(e) => e,
        };

        if error.is_rejected_input() {
            self.store.stall_job::<T>(id).await?;
            error!(
                queue,
                job_id = id,
                release_id = %state.release_id,
                error = %error,
                stalled = true,
                "job rejected"
            );
            return Ok(());
        }

        let next_attempt_after = now_millis().saturating_add(millis(self.retry_delay));

        if error.is_validation() {
            if self.store.requeue_job::<T>(id, next_attempt_after, false).await?.is_some() {
                warn!(
                    queue,
                    job_id = id,
                    release_id = %state.release_id,
                    attempt = state.attempt,
                    error = %error,
                    retry_in_secs = self.retry_delay.as_secs(),
                    "job could not start"
                );
            }
            return Ok(());
        }

        if shutdown.is_cancelled() {
            info!(queue, job_id = id, "job interrupted by shutdown");
            return Ok(());
        }

        match self.store.requeue_job::<T>(id, next_attempt_after, true).await? {
            Some(attempt) if attempt >= state.max_attempts => warn!(
                queue,
                job_id = id,
                release_id = %state.release_id,
                attempt,
                error = %error,
                stalled = true,
                "job failed and will not be retried"
            ),
            Some(attempt) => warn!(
                queue,
                job_id = id,
                release_id = %state.release_id,
                attempt,
                error = %error,
                retry_in_secs = self.retry_delay.as_secs(),
                "job failed"
            ),
            None if token.is_cancelled() => {
                debug!(queue, job_id = id, "cancelled job discarded");
            }
            None => debug!(queue, job_id = id, "job row removed while running"),
        }
        Ok(())
    }

    /// Aborts the release's running job and deletes all its rows.
    ///
    /// Waits up to ten seconds for an aborted process to exit before the
    /// rows go.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the rows cannot be deleted.
    pub async fn cancel_jobs_for_release(&self, release_id: &str) -> StoreResult<u64> {
        let aborted = {
            let mut slot = self.slot();
            if slot.as_ref().is_some_and(|active| active.release_id == release_id) {
                slot.take()
            } else {
                None
            }
        };
        if let Some(active) = aborted {
            info!(queue = %T::KIND, job_id = active.id, release_id, "aborting running job");
            active.token.cancel();
            if tokio::time::timeout(ABORT_GRACE, active.finished.cancelled())
                .await
                .is_err()
            {
                warn!(queue = %T::KIND, job_id = active.id, "aborted job still running");
            }
        }

        let deleted = self.store.delete_jobs_for_release::<T>(release_id).await?;
        debug!(queue = %T::KIND, release_id, deleted, "deleted release jobs");
        Ok(deleted)
    }

    /// Mean progress of the release's rows in this queue, 0 without rows.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub async fn overall_progress_for_release(&self, release_id: &str) -> StoreResult<f64> {
        Ok(self
            .store
            .release_progress::<T>(release_id)
            .await?
            .unwrap_or(0.0))
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Persists progress updates of the active job.
///
/// Stops when every sender is dropped. Cancels `token` if the row vanished.
async fn write_progress<T: JobTable>(
    store: Store,
    id: i64,
    updates: flume::Receiver<u8>,
    token: CancellationToken,
) {
    let mut last = None;
    while let Ok(percent) = updates.recv_async().await {
        if last.is_some_and(|previous| percent <= previous) {
            continue;
        }
        last = Some(percent);

        match store.update_progress::<T>(id, percent).await {
            Ok(true) => {}
            Ok(false) => {
                info!(queue = %T::KIND, job_id = id, "job row removed, aborting");
                token.cancel();
                break;
            }
            Err(e) => warn!(queue = %T::KIND, job_id = id, error = %e, "failed to record progress"),
        }
    }
}

/// Cancels `token` once row `id` is gone; returns when the job finishes.
async fn watch_row<T: JobTable>(
    store: Store,
    id: i64,
    interval: Duration,
    token: CancellationToken,
    finished: CancellationToken,
) {
    loop {
        tokio::select! {
            () = finished.cancelled() => return,
            () = token.cancelled() => return,
            () = tokio::time::sleep(interval) => {}
        }

        match store.find_job::<T>(id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                info!(queue = %T::KIND, job_id = id, "job row removed, aborting");
                token.cancel();
                return;
            }
            Err(e) => warn!(queue = %T::KIND, job_id = id, error = %e, "failed to check job row"),
        }
    }
}
