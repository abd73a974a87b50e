// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Component wiring.
//!
//! ```text
//! Config
//!   |
//!   +--> Store (migrations) ------------------------------+
//!   +--> DownloaderTool --> DownloadRunner --> DownloadQueue
//!   +--> ExtractorTool  --> ExtractRunner  --> ExtractQueue
//!   +--> PathService --+--> ToggleService                 |
//!                      +--> InstallService <--- queues ---+
//!                                |
//!                       SubscriptionService
//! ```
//!
//! CLI commands that only mutate state (`install`, `remove`, ...) build a
//! [`Daemon`] without running it; the `serve` process picks the new rows up
//! on its next poll and aborts a running job whose row was deleted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::DropzoneResult;
use crate::install::InstallService;
use crate::paths::PathService;
use crate::queue::{DownloadQueue, DownloadRunner, ExtractQueue, ExtractRunner, JobQueue};
use crate::store::Store;
use crate::subscription::SubscriptionService;
use crate::toggle::ToggleService;
use crate::tools::{DownloaderTool, ExtractorTool};

/// All services of one daemon process.
pub struct Daemon {
    store: Store,
    downloads: Arc<DownloadQueue>,
    extracts: Arc<ExtractQueue>,
    subscriptions: SubscriptionService,
}

impl Daemon {
    /// Opens the store and builds every service.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingKey` if `paths.working_dir` is not set.
    /// - `StoreError` if the database cannot be opened or migrated.
    pub async fn from_config(config: &Config) -> DropzoneResult<Self> {
        let paths = Arc::new(PathService::from_config(&config.paths)?);
        let database = config.paths.database()?;
        let store = Store::open(&database).await?;
        let shared = Arc::new(store.clone());

        let downloads: Arc<DownloadQueue> = Arc::new(JobQueue::new(
            store.clone(),
            Arc::new(DownloadRunner::new(DownloaderTool::new(&config.tools.wget))),
            config.queue.retry_delay(),
            config.queue.download_poll(),
        ));
        let extracts: Arc<ExtractQueue> = Arc::new(JobQueue::new(
            store.clone(),
            Arc::new(ExtractRunner::new(ExtractorTool::new(&config.tools.sevenz))),
            config.queue.retry_delay(),
            config.queue.extract_poll(),
        ));

        let install = InstallService::new(
            Arc::clone(&paths),
            shared.clone(),
            Arc::clone(&downloads),
            Arc::clone(&extracts),
            config.queue.max_attempts,
        );
        let toggle = ToggleService::new(paths, shared.clone());
        let subscriptions = SubscriptionService::new(shared, store.clone(), install, toggle);

        info!(database = %database.display(), "daemon ready");
        Ok(Self {
            store,
            downloads,
            extracts,
            subscriptions,
        })
    }

    #[must_use]
    pub const fn subscriptions(&self) -> &SubscriptionService {
        &self.subscriptions
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn downloads(&self) -> &DownloadQueue {
        &self.downloads
    }

    #[must_use]
    pub fn extracts(&self) -> &ExtractQueue {
        &self.extracts
    }

    /// Runs both queues until `shutdown` is cancelled.
    ///
    /// Jobs interrupted by the shutdown stay `IN_PROGRESS` and are adopted
    /// by the next run.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("queues started");
        tokio::join!(
            self.downloads.run(shutdown.clone()),
            self.extracts.run(shutdown.clone()),
        );
        info!("queues stopped");
    }

    /// Closes the store after the queues have stopped.
    pub async fn close(self) {
        self.store.close().await;
    }
}
