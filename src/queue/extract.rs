// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Extract queue: one 7z run per archive asset, once all its parts are in.

use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;

use super::{JobQueue, JobRunner};
use crate::error::{DropzoneResult, StoreResult};
use crate::store::{ExtractJob, Extracts, NewJob};
use crate::tools::{ExtractorTool, ToolContext};

pub type ExtractQueue = JobQueue<Extracts>;

impl ExtractQueue {
    /// Queues an extraction that starts once `depends_on` have completed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the rows cannot be inserted.
    pub async fn push(&self, job: &NewJob, archive_path: &str, depends_on: &[i64]) -> StoreResult<i64> {
        let id = self
            .store
            .insert_extract_job(job, archive_path, depends_on)
            .await?;
        self.notify();
        Ok(id)
    }
}

/// Runs extract jobs through [`ExtractorTool`].
#[derive(Debug, Clone)]
pub struct ExtractRunner {
    tool: ExtractorTool,
}

impl ExtractRunner {
    #[must_use]
    pub const fn new(tool: ExtractorTool) -> Self {
        Self { tool }
    }
}

impl JobRunner<Extracts> for ExtractRunner {
    fn run<'a>(
        &'a self,
        job: &'a ExtractJob,
        ctx: &'a ToolContext,
    ) -> BoxFuture<'a, DropzoneResult<PathBuf>> {
        Box::pin(self.tool.extract(
            Path::new(&job.archive_path),
            Path::new(&job.state.target_directory),
            ctx,
        ))
    }
}
