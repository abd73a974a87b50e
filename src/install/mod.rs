// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Turns a release's assets into queued jobs.
//!
//! ```text
//! install(release)
//!   mkdir {working_dir}/{release}
//!   asset, N urls        --> N download jobs
//!   archive asset        --> + 1 extract job of the first part,
//!                            waiting for all N downloads
//!   archive, 0 urls      --> warning, no jobs
//!
//! remove(release)
//!   cancel extract jobs, cancel download jobs
//!   rm -rf {working_dir}/{release}      missing is fine
//! ```

use std::io;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{DropzoneResult, FsError};
use crate::paths::PathService;
use crate::queue::{DownloadQueue, ExtractQueue};
use crate::store::{AssetRepository, NewJob};
use crate::tools::DownloaderTool;

/// Jobs queued by one [`InstallService::install`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallPlan {
    pub downloads: usize,
    pub extracts: usize,
}

/// Release asset orchestrator.
#[derive(Clone)]
pub struct InstallService {
    paths: Arc<PathService>,
    assets: Arc<dyn AssetRepository>,
    downloads: Arc<DownloadQueue>,
    extracts: Arc<ExtractQueue>,
    max_attempts: i64,
}

impl InstallService {
    #[must_use]
    pub fn new(
        paths: Arc<PathService>,
        assets: Arc<dyn AssetRepository>,
        downloads: Arc<DownloadQueue>,
        extracts: Arc<ExtractQueue>,
        max_attempts: u32,
    ) -> Self {
        Self {
            paths,
            assets,
            downloads,
            extracts,
            max_attempts: i64::from(max_attempts),
        }
    }

    /// Queues every download and extraction of the release.
    ///
    /// # Errors
    ///
    /// - `PathError::EscapesRoot` if the release id or a download's file name
    ///   leaves its directory.
    /// - `ValidationError::InvalidUrl` if an asset url does not parse.
    /// - `FsError` if the release directory cannot be created.
    /// - `StoreError` if assets cannot be read or jobs inserted.
    pub async fn install(&self, release_id: &str) -> DropzoneResult<InstallPlan> {
        let release_dir = self.paths.release_dir(release_id)?;
        tokio::fs::create_dir_all(&release_dir)
            .await
            .map_err(|e| FsError::io(&release_dir, e))?;
        let target_directory = release_dir.to_string_lossy().into_owned();

        let mut plan = InstallPlan::default();
        for asset in self.assets.assets_for_release(release_id).await? {
            if asset.is_archive && asset.urls.is_empty() {
                warn!(release_id, asset_id = %asset.id, "archive asset has no urls, skipping");
                continue;
            }

            // resolve every url before queueing anything for this asset
            let mut targets = Vec::with_capacity(asset.urls.len());
            for url in &asset.urls {
                targets.push(DownloaderTool::target_file(&release_dir, url)?);
            }
            let archive_path = if asset.is_archive {
                targets.into_iter().next()
            } else {
                None
            };

            let job = NewJob {
                release_id: release_id.to_string(),
                asset_id: asset.id.clone(),
                target_directory: target_directory.clone(),
                max_attempts: self.max_attempts,
            };

            let mut download_ids = Vec::with_capacity(asset.urls.len());
            for url in &asset.urls {
                download_ids.push(self.downloads.push(&job, url).await?);
            }
            plan.downloads += download_ids.len();

            if let Some(archive_path) = archive_path {
                let archive_path = archive_path.to_string_lossy();
                let id = self
                    .extracts
                    .push(&job, &archive_path, &download_ids)
                    .await?;
                debug!(
                    release_id,
                    asset_id = %asset.id,
                    extract_job_id = id,
                    parts = download_ids.len(),
                    "queued extraction"
                );
                plan.extracts += 1;
            }
        }

        info!(
            release_id,
            downloads = plan.downloads,
            extracts = plan.extracts,
            "release queued"
        );
        Ok(plan)
    }

    /// Cancels the release's jobs and deletes its directory.
    ///
    /// # Errors
    ///
    /// - `StoreError` if job rows cannot be deleted.
    /// - `PathError::EscapesRoot` for a release id outside the working dir.
    pub async fn remove(&self, release_id: &str) -> DropzoneResult<()> {
        self.extracts.cancel_jobs_for_release(release_id).await?;
        self.downloads.cancel_jobs_for_release(release_id).await?;

        let release_dir = self.paths.release_dir(release_id)?;
        match tokio::fs::remove_dir_all(&release_dir).await {
            Ok(()) => debug!(path = %release_dir.display(), "deleted release directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %release_dir.display(),
                error = %e,
                "failed to delete release directory"
            ),
        }

        info!(release_id, "release files removed");
        Ok(())
    }
}
