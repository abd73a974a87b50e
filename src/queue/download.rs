// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Download queue: one wget run per URL.

use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;

use super::{JobQueue, JobRunner};
use crate::error::{DropzoneResult, StoreResult};
use crate::store::{DownloadJob, Downloads, NewJob};
use crate::tools::{DownloaderTool, ToolContext};

pub type DownloadQueue = JobQueue<Downloads>;

impl DownloadQueue {
    /// Queues a download of `url` and wakes the loop.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the row cannot be inserted.
    pub async fn push(&self, job: &NewJob, url: &str) -> StoreResult<i64> {
        let id = self.store.insert_download_job(job, url).await?;
        self.notify();
        Ok(id)
    }
}

/// Runs download jobs through [`DownloaderTool`].
#[derive(Debug, Clone)]
pub struct DownloadRunner {
    tool: DownloaderTool,
}

impl DownloadRunner {
    #[must_use]
    pub const fn new(tool: DownloaderTool) -> Self {
        Self { tool }
    }
}

impl JobRunner<Downloads> for DownloadRunner {
    fn run<'a>(
        &'a self,
        job: &'a DownloadJob,
        ctx: &'a ToolContext,
    ) -> BoxFuture<'a, DropzoneResult<PathBuf>> {
        Box::pin(
            self.tool
                .download(&job.url, Path::new(&job.state.target_directory), ctx),
        )
    }
}
