// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use super::ToggleService;
use crate::error::{ConfigError, DropzoneError};
use crate::model::{DestRoot, SymbolicLinkSpec};
use crate::paths::PathService;
use crate::store::Store;
use crate::test_utils::{capture_warnings, sample_descriptor};

struct Fixture {
    dir: TempDir,
    store: Arc<Store>,
    toggle: ToggleService,
}

impl Fixture {
    async fn new(links: Vec<SymbolicLinkSpec>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathService::new(dir.path().join("work"), Some(dir.path().join("dcs")), None);
        let store = Arc::new(Store::in_memory().await.unwrap());

        let mut descriptor = sample_descriptor("r1");
        descriptor.symbolic_links = links;
        store.save_release(&descriptor).await.unwrap();
        std::fs::create_dir_all(dir.path().join("work/r1/Liveries")).unwrap();
        std::fs::write(dir.path().join("work/r1/readme.txt"), b"hi").unwrap();

        let toggle = ToggleService::new(Arc::new(paths), store.clone());
        Self { dir, store, toggle }
    }

    fn dcs(&self, rel: &str) -> PathBuf {
        self.dir.path().join("dcs").join(rel)
    }
}

fn link(name: &str, src: &str, dest: &str, root: DestRoot) -> SymbolicLinkSpec {
    SymbolicLinkSpec {
        name: name.to_string(),
        src: src.to_string(),
        dest: dest.to_string(),
        dest_root: root,
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_enable_then_disable() {
    let fx = Fixture::new(vec![
        link("liveries", "Liveries", "Liveries/mod-a", DestRoot::DcsWorkingDir),
        link("readme", "readme.txt", "Docs/mod-a.txt", DestRoot::DcsWorkingDir),
    ])
    .await;

    assert!(!fx.toggle.is_enabled("r1").await.unwrap());
    assert_eq!(fx.toggle.enable("r1").await.unwrap(), 2);
    assert!(fx.toggle.is_enabled("r1").await.unwrap());

    let target = std::fs::read_link(fx.dcs("Liveries/mod-a")).unwrap();
    assert_eq!(target, fx.dir.path().join("work/r1/Liveries"));
    assert_eq!(std::fs::read(fx.dcs("Docs/mod-a.txt")).unwrap(), b"hi");

    let links = fx.store.release_links("r1").await.unwrap();
    assert_eq!(
        links[0].installed_path.as_deref(),
        Some(fx.dcs("Liveries/mod-a").to_str().unwrap())
    );

    // already installed links are left alone
    assert_eq!(fx.toggle.enable("r1").await.unwrap(), 0);

    assert_eq!(fx.toggle.disable("r1").await.unwrap(), 2);
    assert!(!fx.toggle.is_enabled("r1").await.unwrap());
    assert!(std::fs::symlink_metadata(fx.dcs("Liveries/mod-a")).is_err());
    assert!(std::fs::symlink_metadata(fx.dcs("Docs/mod-a.txt")).is_err());
    assert!(fx.dir.path().join("work/r1/Liveries").is_dir());
    assert!(
        fx.store
            .release_links("r1")
            .await
            .unwrap()
            .iter()
            .all(|l| l.installed_path.is_none())
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_link_is_skipped() {
    let fx = Fixture::new(vec![
        link("occupied", "Liveries", "Taken", DestRoot::DcsWorkingDir),
        link("liveries", "Liveries", "Liveries/mod-a", DestRoot::DcsWorkingDir),
    ])
    .await;
    std::fs::create_dir_all(fx.dcs("")).unwrap();
    std::fs::write(fx.dcs("Taken"), b"user file").unwrap();

    let (created, logs) = capture_warnings(|| fx.toggle.enable("r1")).await;
    assert_eq!(created.unwrap(), 1);
    assert!(logs.contains("failed to create link"), "{logs}");

    let links = fx.store.release_links("r1").await.unwrap();
    assert!(!links[0].is_installed());
    assert!(links[1].is_installed());
    assert!(!fx.toggle.is_enabled("r1").await.unwrap());
    assert_eq!(std::fs::read(fx.dcs("Taken")).unwrap(), b"user file");
}

#[cfg(unix)]
#[tokio::test]
async fn test_disable_tolerates_missing_entry() {
    let fx = Fixture::new(vec![link(
        "liveries",
        "Liveries",
        "Liveries/mod-a",
        DestRoot::DcsWorkingDir,
    )])
    .await;
    fx.toggle.enable("r1").await.unwrap();
    std::fs::remove_file(fx.dcs("Liveries/mod-a")).unwrap();

    assert_eq!(fx.toggle.disable("r1").await.unwrap(), 1);
    assert!(!fx.store.release_links("r1").await.unwrap()[0].is_installed());
}

#[tokio::test]
async fn test_escaping_source_is_fatal() {
    let fx = Fixture::new(vec![link(
        "evil",
        "../../etc",
        "Liveries/evil",
        DestRoot::DcsWorkingDir,
    )])
    .await;

    let err = fx.toggle.enable("r1").await.unwrap_err();
    assert!(err.is_path_escape(), "{err}");
    assert!(std::fs::symlink_metadata(fx.dcs("Liveries/evil")).is_err());
}

#[tokio::test]
async fn test_escaping_destination_is_fatal() {
    let fx = Fixture::new(vec![link(
        "evil",
        "Liveries",
        "../outside",
        DestRoot::DcsWorkingDir,
    )])
    .await;

    let err = fx.toggle.enable("r1").await.unwrap_err();
    assert!(err.is_path_escape(), "{err}");
    assert!(!fx.dir.path().join("outside").exists());
}

#[tokio::test]
async fn test_unconfigured_root_is_config_error() {
    let fx = Fixture::new(vec![link(
        "install",
        "Liveries",
        "Mods/mod-a",
        DestRoot::DcsInstallDir,
    )])
    .await;

    match fx.toggle.enable("r1").await.unwrap_err() {
        DropzoneError::Config(e) => {
            assert!(matches!(*e, ConfigError::MissingKey { ref key, .. } if key == "dcs_install_dir"));
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_release_without_links_is_enabled() {
    let fx = Fixture::new(Vec::new()).await;
    assert!(fx.toggle.is_enabled("r1").await.unwrap());
    assert_eq!(fx.toggle.enable("r1").await.unwrap(), 0);
}
