// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release lifecycle façade.
//!
//! ```text
//! add(descriptor)   validate --> save rows --> InstallService::install
//!                   (install failure rolls the release back)
//! remove(id)        ToggleService::disable --> InstallService::remove
//!                   --> delete rows
//! enable / disable  ToggleService
//! list()            rows + JobSummary + LinkCounts --> InstalledRelease
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{DropzoneResult, StoreError};
use crate::install::{InstallPlan, InstallService};
use crate::model::{InstalledRelease, Release, ReleaseDescriptor, ReleaseStatus};
use crate::store::{JobSummary, Store, SubscriptionRepository};
use crate::toggle::{LinkCounts, ToggleService};

/// Status shown for a release.
///
/// Stalled jobs win over everything so an operator notices them; links only
/// matter once no job is left to run.
#[must_use]
pub fn release_status(jobs: &JobSummary, links: LinkCounts) -> ReleaseStatus {
    if jobs.stalled > 0 {
        ReleaseStatus::Stalled
    } else if jobs.downloading > 0 {
        ReleaseStatus::Downloading
    } else if jobs.extracting > 0 {
        ReleaseStatus::Extracting
    } else if jobs.pending > 0 {
        ReleaseStatus::Queued
    } else if links.total > 0 && links.all_installed() {
        ReleaseStatus::Enabled
    } else {
        ReleaseStatus::Ready
    }
}

/// Subscription orchestrator.
#[derive(Clone)]
pub struct SubscriptionService {
    releases: Arc<dyn SubscriptionRepository>,
    store: Store,
    install: InstallService,
    toggle: ToggleService,
}

impl SubscriptionService {
    #[must_use]
    pub fn new(
        releases: Arc<dyn SubscriptionRepository>,
        store: Store,
        install: InstallService,
        toggle: ToggleService,
    ) -> Self {
        Self {
            releases,
            store,
            install,
            toggle,
        }
    }

    /// Persists a release and queues its jobs.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidValue` for a descriptor with a blank id or
    ///   duplicated asset ids.
    /// - `StoreError::ReleaseExists` if the release is already known.
    /// - Any error of [`InstallService::install`]; the release is then
    ///   removed again.
    pub async fn add(&self, descriptor: &ReleaseDescriptor) -> DropzoneResult<InstallPlan> {
        descriptor.validate()?;
        let release_id = descriptor.release_id.as_str();

        self.releases.save(descriptor).await?;
        info!(
            release_id,
            mod_id = %descriptor.mod_id,
            version = %descriptor.version,
            "release added"
        );

        match self.install.install(release_id).await {
            Ok(plan) => Ok(plan),
            Err(e) => {
                warn!(release_id, error = %e, "install failed, rolling back");
                if let Err(cleanup) = self.install.remove(release_id).await {
                    warn!(release_id, error = %cleanup, "rollback left files behind");
                }
                self.releases.delete(release_id).await?;
                Err(e)
            }
        }
    }

    /// Disables, cancels and deletes a release.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ReleaseNotFound` for an unknown release, and
    /// errors of the toggle and install services.
    pub async fn remove(&self, release_id: &str) -> DropzoneResult<()> {
        self.require(release_id).await?;

        self.toggle.disable(release_id).await?;
        self.install.remove(release_id).await?;
        self.releases.delete(release_id).await?;

        info!(release_id, "release removed");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StoreError::ReleaseNotFound` for an unknown release, and
    /// errors of [`ToggleService::enable`].
    pub async fn enable(&self, release_id: &str) -> DropzoneResult<usize> {
        self.require(release_id).await?;
        self.toggle.enable(release_id).await
    }

    /// # Errors
    ///
    /// Returns `StoreError::ReleaseNotFound` for an unknown release, and
    /// errors of [`ToggleService::disable`].
    pub async fn disable(&self, release_id: &str) -> DropzoneResult<usize> {
        self.require(release_id).await?;
        self.toggle.disable(release_id).await
    }

    /// Every known release with its live status, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub async fn list(&self) -> DropzoneResult<Vec<InstalledRelease>> {
        let releases = self.releases.list().await?;
        let mut installed = Vec::with_capacity(releases.len());
        for release in releases {
            installed.push(self.describe(release).await?);
        }
        Ok(installed)
    }

    /// Status of one release.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ReleaseNotFound` for an unknown release.
    pub async fn status(&self, release_id: &str) -> DropzoneResult<InstalledRelease> {
        let release = self.require(release_id).await?;
        self.describe(release).await
    }

    async fn describe(&self, release: Release) -> DropzoneResult<InstalledRelease> {
        let jobs = self.store.job_summary(&release.release_id).await?;
        let links = self.toggle.link_counts(&release.release_id).await?;

        Ok(InstalledRelease {
            status: release_status(&jobs, links),
            progress_percent: jobs.progress,
            enabled: links.total > 0 && links.all_installed(),
            mod_id: release.mod_id,
            release_id: release.release_id,
            mod_name: release.mod_name,
            version: release.version,
        })
    }

    async fn require(&self, release_id: &str) -> DropzoneResult<Release> {
        self.releases
            .find(release_id)
            .await?
            .ok_or_else(|| StoreError::ReleaseNotFound(release_id.to_string()).into())
    }
}
