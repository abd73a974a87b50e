// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository capabilities handed to the services.
//!
//! Each trait has one implementation, [`Store`]; services hold them as
//! `Arc<dyn ...>` so tests can inject their own.
//!
//! # Lifetime
//!
//! Methods return `BoxFuture` so the traits stay object safe.

use futures_util::future::BoxFuture;

use super::Store;
use crate::error::StoreResult;
use crate::model::{Asset, MissionScript, Release, ReleaseDescriptor, SymbolicLink};

/// Asset lookup for the release asset orchestrator.
pub trait AssetRepository: Send + Sync {
    fn assets_for_release<'a>(&'a self, release_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Asset>>>;
}

/// Link lookup and install bookkeeping for the toggle service.
pub trait SymbolicLinkRepository: Send + Sync {
    fn links_for_release<'a>(
        &'a self,
        release_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<SymbolicLink>>>;

    /// `None` clears the installed path.
    fn set_installed_path<'a>(
        &'a self,
        link_id: i64,
        installed_path: Option<&'a str>,
    ) -> BoxFuture<'a, StoreResult<()>>;
}

/// Release persistence for the subscription orchestrator.
pub trait SubscriptionRepository: Send + Sync {
    fn save<'a>(&'a self, descriptor: &'a ReleaseDescriptor) -> BoxFuture<'a, StoreResult<()>>;

    fn find<'a>(&'a self, release_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Release>>>;

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<Release>>>;

    fn mission_scripts<'a>(
        &'a self,
        release_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<MissionScript>>>;

    /// Returns false if the release was unknown.
    fn delete<'a>(&'a self, release_id: &'a str) -> BoxFuture<'a, StoreResult<bool>>;
}

impl AssetRepository for Store {
    fn assets_for_release<'a>(&'a self, release_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Asset>>> {
        Box::pin(self.release_assets(release_id))
    }
}

impl SymbolicLinkRepository for Store {
    fn links_for_release<'a>(
        &'a self,
        release_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<SymbolicLink>>> {
        Box::pin(self.release_links(release_id))
    }

    fn set_installed_path<'a>(
        &'a self,
        link_id: i64,
        installed_path: Option<&'a str>,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(self.set_link_installed_path(link_id, installed_path))
    }
}

impl SubscriptionRepository for Store {
    fn save<'a>(&'a self, descriptor: &'a ReleaseDescriptor) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(self.save_release(descriptor))
    }

    fn find<'a>(&'a self, release_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Release>>> {
        Box::pin(self.find_release(release_id))
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<Release>>> {
        Box::pin(self.list_releases())
    }

    fn mission_scripts<'a>(
        &'a self,
        release_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<MissionScript>>> {
        Box::pin(self.release_mission_scripts(release_id))
    }

    fn delete<'a>(&'a self, release_id: &'a str) -> BoxFuture<'a, StoreResult<bool>> {
        Box::pin(self.delete_release(release_id))
    }
}
