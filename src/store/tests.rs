// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::migrations::{self, Migration, MIGRATIONS};
use super::*;
use crate::error::StoreError;
use crate::model::{Asset, DestRoot, MissionScript, ReleaseDescriptor, SymbolicLinkSpec};

fn descriptor(release_id: &str) -> ReleaseDescriptor {
    ReleaseDescriptor {
        release_id: release_id.to_string(),
        mod_id: "mod-a".to_string(),
        mod_name: "Mod A".to_string(),
        version: "1.0.0".to_string(),
        dependencies: vec!["mod-base".to_string()],
        assets: vec![
            Asset {
                id: "main".to_string(),
                name: "Main".to_string(),
                is_archive: true,
                urls: vec![
                    "https://cdn.example/part.7z.001".to_string(),
                    "https://cdn.example/part.7z.002".to_string(),
                ],
            },
            Asset {
                id: "readme".to_string(),
                name: "Readme".to_string(),
                is_archive: false,
                urls: vec!["https://cdn.example/README.txt".to_string()],
            },
        ],
        symbolic_links: vec![SymbolicLinkSpec {
            name: "liveries".to_string(),
            src: "Liveries".to_string(),
            dest: "Liveries/mod-a".to_string(),
            dest_root: DestRoot::DcsWorkingDir,
        }],
        mission_scripts: vec![MissionScript {
            name: "init".to_string(),
            purpose: "setup".to_string(),
            path: "Scripts/init.lua".to_string(),
            root: DestRoot::DcsInstallDir,
            run_on: "MISSION_START".to_string(),
        }],
    }
}

fn new_job(release_id: &str, asset_id: &str) -> NewJob {
    NewJob {
        release_id: release_id.to_string(),
        asset_id: asset_id.to_string(),
        target_directory: format!("/work/{release_id}"),
        max_attempts: 3,
    }
}

#[tokio::test]
async fn test_migrations_run_once() {
    let store = Store::in_memory().await.unwrap();
    let applied = migrations::run(store.pool(), MIGRATIONS).await.unwrap();
    assert_eq!(applied, 0);

    let names: Vec<String> =
        sqlx::query_scalar("SELECT name FROM schema_migrations ORDER BY name")
            .fetch_all(store.pool())
            .await
            .unwrap();
    assert_eq!(names, ["0001_releases", "0002_job_queues"]);
}

#[test]
fn test_migration_hash_is_sha256_hex() {
    let migration = Migration {
        name: "x",
        sql: "",
    };
    insta::assert_snapshot!(
        migration.hash(),
        @"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[tokio::test]
async fn test_changed_migration_is_rejected() {
    let store = Store::in_memory().await.unwrap();
    let edited = [Migration {
        name: MIGRATIONS[0].name,
        sql: "CREATE TABLE releases (release_id TEXT);",
    }];

    let err = migrations::run(store.pool(), &edited).await.unwrap_err();
    assert!(
        matches!(&err, StoreError::MigrationChanged { name, .. } if name == "0001_releases"),
        "{err}"
    );
}

#[tokio::test]
async fn test_new_migration_is_applied_after_existing() {
    let store = Store::in_memory().await.unwrap();
    let mut list = MIGRATIONS.to_vec();
    list.push(Migration {
        name: "9999_extra",
        sql: "CREATE TABLE extra (id INTEGER PRIMARY KEY);",
    });

    assert_eq!(migrations::run(store.pool(), &list).await.unwrap(), 1);
    assert_eq!(migrations::run(store.pool(), &list).await.unwrap(), 0);
}

#[tokio::test]
async fn test_open_creates_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("dropzone.sqlite3");

    let store = Store::open(&path).await.unwrap();
    store.save_release(&descriptor("r1")).await.unwrap();
    store.close().await;
    assert!(path.is_file());

    // reopening keeps data and does not re-run migrations
    let store = Store::open(&path).await.unwrap();
    assert!(store.find_release("r1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_save_and_read_release() {
    let store = Store::in_memory().await.unwrap();
    let desc = descriptor("r1");
    store.save_release(&desc).await.unwrap();

    let release = store.find_release("r1").await.unwrap().unwrap();
    assert_eq!(release, desc.release());

    let assets = store.release_assets("r1").await.unwrap();
    assert_eq!(assets, desc.assets);

    let links = store.release_links("r1").await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].dest_root, DestRoot::DcsWorkingDir);
    assert!(!links[0].is_installed());

    let scripts = store.release_mission_scripts("r1").await.unwrap();
    assert_eq!(scripts, desc.mission_scripts);
}

#[tokio::test]
async fn test_duplicate_release_is_rejected() {
    let store = Store::in_memory().await.unwrap();
    store.save_release(&descriptor("r1")).await.unwrap();

    let err = store.save_release(&descriptor("r1")).await.unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"release 'r1' already exists");
    assert_eq!(store.release_assets("r1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_link_installed_path_round_trip() {
    let store = Store::in_memory().await.unwrap();
    store.save_release(&descriptor("r1")).await.unwrap();
    let link = store.release_links("r1").await.unwrap().remove(0);

    store
        .set_link_installed_path(link.id, Some("/dcs/Liveries/mod-a"))
        .await
        .unwrap();
    let link = store.release_links("r1").await.unwrap().remove(0);
    assert_eq!(link.installed_path.as_deref(), Some("/dcs/Liveries/mod-a"));

    store.set_link_installed_path(link.id, None).await.unwrap();
    assert!(!store.release_links("r1").await.unwrap()[0].is_installed());
}

#[tokio::test]
async fn test_delete_release_cascades() {
    let store = Store::in_memory().await.unwrap();
    store.save_release(&descriptor("r1")).await.unwrap();
    store.save_release(&descriptor("r2")).await.unwrap();

    assert!(store.delete_release("r1").await.unwrap());
    assert!(!store.delete_release("r1").await.unwrap());

    assert!(store.release_assets("r1").await.unwrap().is_empty());
    assert!(store.release_links("r1").await.unwrap().is_empty());
    assert!(store.release_mission_scripts("r1").await.unwrap().is_empty());
    assert_eq!(store.release_assets("r2").await.unwrap().len(), 2);

    let ids: Vec<String> = store
        .list_releases()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.release_id)
        .collect();
    assert_eq!(ids, ["r2"]);
}

#[tokio::test]
async fn test_claim_oldest_first_and_single_flight() {
    let store = Store::in_memory().await.unwrap();
    let first = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();
    let second = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/2")
        .await
        .unwrap();

    let claimed = store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();
    assert_eq!(claimed.state.id, first);
    assert_eq!(claimed.state.status, JobStatus::InProgress);
    assert_eq!(claimed.url, "https://cdn.example/1");

    let adopted = store.find_in_progress::<Downloads>().await.unwrap().unwrap();
    assert_eq!(adopted.state.id, first);

    let next = store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();
    assert_eq!(next.state.id, second);
    assert!(store.claim_next::<Downloads>(now_millis()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_respects_backoff() {
    let store = Store::in_memory().await.unwrap();
    let id = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();
    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();

    let later = now_millis() + 30_000;
    let attempt = store.requeue_job::<Downloads>(id, later, true).await.unwrap();
    assert_eq!(attempt, Some(1));

    assert!(store.claim_next::<Downloads>(now_millis()).await.unwrap().is_none());
    let job = store.claim_next::<Downloads>(later).await.unwrap().unwrap();
    assert_eq!(job.state.attempt, 1);
}

#[tokio::test]
async fn test_requeue_without_spending_attempt() {
    let store = Store::in_memory().await.unwrap();
    let id = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();
    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();

    let attempt = store.requeue_job::<Downloads>(id, 0, false).await.unwrap();
    assert_eq!(attempt, Some(0));
    assert_eq!(store.requeue_job::<Downloads>(999, 0, true).await.unwrap(), None);
}

#[tokio::test]
async fn test_exhausted_job_is_never_claimed() {
    let store = Store::in_memory().await.unwrap();
    let id = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();

    for expected in 1..=3 {
        store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();
        let attempt = store.requeue_job::<Downloads>(id, 0, true).await.unwrap();
        assert_eq!(attempt, Some(expected));
    }
    // capped at max_attempts
    assert_eq!(store.requeue_job::<Downloads>(id, 0, true).await.unwrap(), Some(3));

    assert!(store.claim_next::<Downloads>(i64::MAX).await.unwrap().is_none());
    let job = store.find_job::<Downloads>(id).await.unwrap().unwrap();
    assert_eq!(job.state.status, JobStatus::Pending);
    assert!(job.state.is_stalled());
}

#[tokio::test]
async fn test_stall_job() {
    let store = Store::in_memory().await.unwrap();
    let id = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();
    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();

    assert!(store.stall_job::<Downloads>(id).await.unwrap());
    let job = store.find_job::<Downloads>(id).await.unwrap().unwrap();
    assert!(job.state.is_stalled());
    assert!(store.claim_next::<Downloads>(i64::MAX).await.unwrap().is_none());
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let store = Store::in_memory().await.unwrap();
    let id = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();
    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();

    assert!(store.update_progress::<Downloads>(id, 40).await.unwrap());
    assert!(store.update_progress::<Downloads>(id, 25).await.unwrap());
    let job = store.find_job::<Downloads>(id).await.unwrap().unwrap();
    assert_eq!(job.state.progress_percent, 40);

    assert!(store.complete_job::<Downloads>(id).await.unwrap());
    let job = store.find_job::<Downloads>(id).await.unwrap().unwrap();
    assert_eq!(job.state.status, JobStatus::Completed);
    assert_eq!(job.state.progress_percent, 100);

    assert!(!store.update_progress::<Downloads>(999, 10).await.unwrap());
}

#[tokio::test]
async fn test_complete_requires_in_progress() {
    let store = Store::in_memory().await.unwrap();
    let id = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();
    assert!(!store.complete_job::<Downloads>(id).await.unwrap());
}

#[tokio::test]
async fn test_extract_waits_for_every_dependency() {
    let store = Store::in_memory().await.unwrap();
    let d1 = store
        .insert_download_job(&new_job("r1", "main"), "https://cdn.example/part.7z.001")
        .await
        .unwrap();
    let d2 = store
        .insert_download_job(&new_job("r1", "main"), "https://cdn.example/part.7z.002")
        .await
        .unwrap();
    let extract = store
        .insert_extract_job(&new_job("r1", "main"), "/work/r1/part.7z.001", &[d1, d2])
        .await
        .unwrap();
    assert_eq!(store.extract_dependencies(extract).await.unwrap(), [d1, d2]);

    assert!(store.claim_next::<Extracts>(now_millis()).await.unwrap().is_none());

    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();
    store.complete_job::<Downloads>(d1).await.unwrap();
    assert!(store.claim_next::<Extracts>(now_millis()).await.unwrap().is_none());

    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();
    store.complete_job::<Downloads>(d2).await.unwrap();
    let job = store.claim_next::<Extracts>(now_millis()).await.unwrap().unwrap();
    assert_eq!(job.state.id, extract);
    assert_eq!(job.archive_path, "/work/r1/part.7z.001");
}

#[tokio::test]
async fn test_dangling_dependency_blocks_extract() {
    let store = Store::in_memory().await.unwrap();
    store
        .insert_extract_job(&new_job("r1", "main"), "/work/r1/a.7z", &[42])
        .await
        .unwrap();
    assert!(store.claim_next::<Extracts>(i64::MAX).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_jobs_for_release_is_scoped() {
    let store = Store::in_memory().await.unwrap();
    let d1 = store
        .insert_download_job(&new_job("r1", "main"), "https://cdn.example/1")
        .await
        .unwrap();
    let d2 = store
        .insert_download_job(&new_job("r2", "main"), "https://cdn.example/2")
        .await
        .unwrap();
    let e1 = store
        .insert_extract_job(&new_job("r1", "main"), "/work/r1/1", &[d1])
        .await
        .unwrap();
    let e2 = store
        .insert_extract_job(&new_job("r2", "main"), "/work/r2/2", &[d2])
        .await
        .unwrap();

    assert_eq!(store.delete_jobs_for_release::<Extracts>("r1").await.unwrap(), 1);
    assert_eq!(store.delete_jobs_for_release::<Downloads>("r1").await.unwrap(), 1);

    assert!(store.find_job::<Extracts>(e1).await.unwrap().is_none());
    assert!(store.extract_dependencies(e1).await.unwrap().is_empty());
    assert!(store.find_job::<Downloads>(d1).await.unwrap().is_none());

    assert!(store.find_job::<Extracts>(e2).await.unwrap().is_some());
    assert_eq!(store.extract_dependencies(e2).await.unwrap(), [d2]);
    assert!(store.find_job::<Downloads>(d2).await.unwrap().is_some());
}

#[tokio::test]
async fn test_release_progress() {
    let store = Store::in_memory().await.unwrap();
    assert_eq!(store.release_progress::<Downloads>("r1").await.unwrap(), None);

    let d1 = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();
    store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/2")
        .await
        .unwrap();
    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();
    store.update_progress::<Downloads>(d1, 50).await.unwrap();

    assert_eq!(store.release_progress::<Downloads>("r1").await.unwrap(), Some(25.0));
}

#[tokio::test]
async fn test_job_summary() {
    let store = Store::in_memory().await.unwrap();
    assert_eq!(store.job_summary("r1").await.unwrap(), JobSummary::default());

    let d1 = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/1")
        .await
        .unwrap();
    let d2 = store
        .insert_download_job(&new_job("r1", "a"), "https://cdn.example/2")
        .await
        .unwrap();
    store
        .insert_extract_job(&new_job("r1", "a"), "/work/r1/1", &[d1, d2])
        .await
        .unwrap();

    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();
    store.complete_job::<Downloads>(d1).await.unwrap();
    store.claim_next::<Downloads>(now_millis()).await.unwrap().unwrap();
    store.update_progress::<Downloads>(d2, 50).await.unwrap();

    let summary = store.job_summary("r1").await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.downloading, 1);
    assert_eq!(summary.extracting, 0);
    assert_eq!(summary.stalled, 0);
    assert!((summary.progress - 50.0).abs() < f64::EPSILON);

    store.stall_job::<Downloads>(d2).await.unwrap();
    assert_eq!(store.job_summary("r1").await.unwrap().stalled, 1);
}

#[tokio::test]
async fn test_repository_traits_delegate_to_store() {
    use std::sync::Arc;

    let store = Arc::new(Store::in_memory().await.unwrap());
    let subscriptions: Arc<dyn SubscriptionRepository> = store.clone();
    let assets: Arc<dyn AssetRepository> = store.clone();
    let links: Arc<dyn SymbolicLinkRepository> = store;

    subscriptions.save(&descriptor("r1")).await.unwrap();
    assert_eq!(subscriptions.list().await.unwrap().len(), 1);
    assert_eq!(assets.assets_for_release("r1").await.unwrap().len(), 2);
    assert_eq!(subscriptions.mission_scripts("r1").await.unwrap().len(), 1);

    let link = links.links_for_release("r1").await.unwrap().remove(0);
    links.set_installed_path(link.id, Some("/x")).await.unwrap();
    assert!(links.links_for_release("r1").await.unwrap()[0].is_installed());

    assert!(subscriptions.delete("r1").await.unwrap());
    assert!(subscriptions.find("r1").await.unwrap().is_none());
}
