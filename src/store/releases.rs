// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release, asset, link and mission-script rows.

use sqlx::types::Json;

use super::{Store, now_millis};
use crate::error::{StoreError, StoreResult};
use crate::model::{Asset, MissionScript, Release, ReleaseDescriptor, SymbolicLink};

impl Store {
    /// Persists a descriptor and its child rows in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ReleaseExists` if the release id is taken.
    pub async fn save_release(&self, descriptor: &ReleaseDescriptor) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM releases WHERE release_id = ?1")
                .bind(&descriptor.release_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_some() {
            return Err(StoreError::ReleaseExists(descriptor.release_id.clone()));
        }

        sqlx::query(
            "INSERT INTO releases (release_id, mod_id, mod_name, version, dependencies, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&descriptor.release_id)
        .bind(&descriptor.mod_id)
        .bind(&descriptor.mod_name)
        .bind(&descriptor.version)
        .bind(Json(&descriptor.dependencies))
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

        for (position, asset) in (0_i64..).zip(&descriptor.assets) {
            sqlx::query(
                "INSERT INTO release_assets (release_id, id, name, is_archive, urls, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&descriptor.release_id)
            .bind(&asset.id)
            .bind(&asset.name)
            .bind(asset.is_archive)
            .bind(Json(&asset.urls))
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        for link in &descriptor.symbolic_links {
            sqlx::query(
                "INSERT INTO release_symbolic_links (release_id, name, src, dest, dest_root)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&descriptor.release_id)
            .bind(&link.name)
            .bind(&link.src)
            .bind(&link.dest)
            .bind(link.dest_root.as_str())
            .execute(&mut *tx)
            .await?;
        }

        for script in &descriptor.mission_scripts {
            sqlx::query(
                "INSERT INTO release_mission_scripts (release_id, name, purpose, path, root, run_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&descriptor.release_id)
            .bind(&script.name)
            .bind(&script.purpose)
            .bind(&script.path)
            .bind(script.root.as_str())
            .bind(&script.run_on)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_release(&self, release_id: &str) -> StoreResult<Option<Release>> {
        let release = sqlx::query_as::<_, Release>(
            "SELECT release_id, mod_id, mod_name, version, dependencies
             FROM releases WHERE release_id = ?1",
        )
        .bind(release_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(release)
    }

    /// Every release, oldest first.
    pub async fn list_releases(&self) -> StoreResult<Vec<Release>> {
        let releases = sqlx::query_as::<_, Release>(
            "SELECT release_id, mod_id, mod_name, version, dependencies
             FROM releases ORDER BY created_at, release_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(releases)
    }

    /// Assets in descriptor order.
    pub async fn release_assets(&self, release_id: &str) -> StoreResult<Vec<Asset>> {
        let assets = sqlx::query_as::<_, Asset>(
            "SELECT id, name, is_archive, urls
             FROM release_assets WHERE release_id = ?1 ORDER BY position",
        )
        .bind(release_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assets)
    }

    pub async fn release_links(&self, release_id: &str) -> StoreResult<Vec<SymbolicLink>> {
        let links = sqlx::query_as::<_, SymbolicLink>(
            "SELECT id, release_id, name, src, dest, dest_root, installed_path
             FROM release_symbolic_links WHERE release_id = ?1 ORDER BY id",
        )
        .bind(release_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    /// Records (or clears, with `None`) where a link was created.
    pub async fn set_link_installed_path(
        &self,
        link_id: i64,
        installed_path: Option<&str>,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE release_symbolic_links SET installed_path = ?1 WHERE id = ?2")
            .bind(installed_path)
            .bind(link_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn release_mission_scripts(&self, release_id: &str) -> StoreResult<Vec<MissionScript>> {
        let scripts = sqlx::query_as::<_, MissionScript>(
            "SELECT name, purpose, path, root, run_on
             FROM release_mission_scripts WHERE release_id = ?1 ORDER BY id",
        )
        .bind(release_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(scripts)
    }

    /// Deletes a release; child rows cascade. Returns false if it was unknown.
    pub async fn delete_release(&self, release_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM releases WHERE release_id = ?1")
            .bind(release_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
