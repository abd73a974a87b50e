// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symbolic link toggling.
//!
//! ```text
//! enable(release)
//!   for link not yet installed:
//!     src  = secure_join({working_dir}/{release}, link.src)
//!     dest = secure_join(dest_root(link.dest_root), link.dest)
//!     mkdir -p dirname(dest); symlink(src, dest)   file or dir by src
//!     installed_path <- dest
//!
//! disable(release)
//!   for link with installed_path:
//!     remove entry (missing is fine); installed_path <- NULL
//! ```
//!
//! Escaping paths and unconfigured roots abort the whole call. Filesystem
//! failures are per link: logged, skipped, and the next link is tried.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{DropzoneResult, FsError};
use crate::paths::PathService;
use crate::store::SymbolicLinkRepository;

/// How many of a release's links exist on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounts {
    pub total: usize,
    pub installed: usize,
}

impl LinkCounts {
    #[must_use]
    pub const fn all_installed(self) -> bool {
        self.installed == self.total
    }
}

/// Creates and removes a release's links.
#[derive(Clone)]
pub struct ToggleService {
    paths: Arc<PathService>,
    links: Arc<dyn SymbolicLinkRepository>,
}

impl ToggleService {
    #[must_use]
    pub fn new(paths: Arc<PathService>, links: Arc<dyn SymbolicLinkRepository>) -> Self {
        Self { paths, links }
    }

    /// Creates every missing link of the release, returning how many were made.
    ///
    /// # Errors
    ///
    /// - `PathError::EscapesRoot` if a link source or destination leaves its root.
    /// - `ConfigError::MissingKey` if a destination root is not configured.
    /// - `StoreError` if link rows cannot be read or updated.
    pub async fn enable(&self, release_id: &str) -> DropzoneResult<usize> {
        let mut created = 0;

        for link in self.links.links_for_release(release_id).await? {
            if link.is_installed() {
                continue;
            }

            let src = self.paths.link_source(release_id, &link.src)?;
            let dest = self.paths.link_destination(link.dest_root, &link.dest)?;

            match create_link(&src, &dest).await {
                Ok(()) => {
                    let installed = dest.to_string_lossy();
                    self.links
                        .set_installed_path(link.id, Some(installed.as_ref()))
                        .await?;
                    debug!(
                        link = %link.name,
                        src = %src.display(),
                        dest = %dest.display(),
                        "linked"
                    );
                    created += 1;
                }
                Err(e) => warn!(
                    release_id,
                    link = %link.name,
                    error = %e,
                    "failed to create link"
                ),
            }
        }

        info!(release_id, created, "release enabled");
        Ok(created)
    }

    /// Removes every installed link of the release, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if link rows cannot be read or updated.
    pub async fn disable(&self, release_id: &str) -> DropzoneResult<usize> {
        let mut removed = 0;

        for link in self.links.links_for_release(release_id).await? {
            let Some(installed) = link.installed_path.as_deref() else {
                continue;
            };

            match remove_link(Path::new(installed)).await {
                Ok(()) => {
                    self.links.set_installed_path(link.id, None).await?;
                    debug!(link = %link.name, path = installed, "unlinked");
                    removed += 1;
                }
                Err(e) => warn!(
                    release_id,
                    link = %link.name,
                    error = %e,
                    "failed to remove link"
                ),
            }
        }

        info!(release_id, removed, "release disabled");
        Ok(removed)
    }

    /// True when every link of the release is installed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if link rows cannot be read.
    pub async fn is_enabled(&self, release_id: &str) -> DropzoneResult<bool> {
        Ok(self.link_counts(release_id).await?.all_installed())
    }

    /// # Errors
    ///
    /// Returns `StoreError` if link rows cannot be read.
    pub async fn link_counts(&self, release_id: &str) -> DropzoneResult<LinkCounts> {
        let links = self.links.links_for_release(release_id).await?;
        Ok(LinkCounts {
            total: links.len(),
            installed: links.iter().filter(|l| l.is_installed()).count(),
        })
    }
}

async fn create_link(src: &Path, dest: &Path) -> Result<(), FsError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FsError::io(parent, e))?;
    }
    symlink(src, dest).await.map_err(|e| FsError::io(dest, e))
}

#[cfg(unix)]
async fn symlink(src: &Path, dest: &Path) -> io::Result<()> {
    tokio::fs::symlink(src, dest).await
}

#[cfg(windows)]
async fn symlink(src: &Path, dest: &Path) -> io::Result<()> {
    let is_dir = tokio::fs::metadata(src).await.is_ok_and(|m| m.is_dir());
    if is_dir {
        tokio::fs::symlink_dir(src, dest).await
    } else {
        tokio::fs::symlink_file(src, dest).await
    }
}

/// Removes the link itself, never what it points to.
async fn remove_link(path: &Path) -> Result<(), FsError> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(FsError::io(path, e)),
    };

    let result = if is_dir_entry(&metadata) {
        tokio::fs::remove_dir(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(FsError::io(path, e)),
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn is_dir_entry(metadata: &std::fs::Metadata) -> bool {
    // symlinks to directories are unlinked like files
    metadata.is_dir()
}

#[cfg(windows)]
fn is_dir_entry(metadata: &std::fs::Metadata) -> bool {
    use std::os::windows::fs::FileTypeExt;
    metadata.file_type().is_symlink_dir() || metadata.is_dir()
}

#[cfg(test)]
mod tests;
