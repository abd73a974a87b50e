// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Release lifecycle commands.
//!
//! ```text
//! install <descriptor.json>  --> SubscriptionService::add
//! remove  <release-id>       --> SubscriptionService::remove
//! enable  <release-id>       --> SubscriptionService::enable
//! disable <release-id>       --> SubscriptionService::disable
//! ```

use anyhow::Context;

use crate::cli::release::{InstallArgs, ReleaseArgs};
use crate::config::Config;
use crate::daemon::Daemon;
use crate::error::Result;
use crate::model::ReleaseDescriptor;

/// Reads a release descriptor file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid descriptor.
pub async fn read_descriptor(args: &InstallArgs) -> Result<ReleaseDescriptor> {
    let json = tokio::fs::read_to_string(&args.descriptor)
        .await
        .with_context(|| format!("failed to read {}", args.descriptor.display()))?;
    let descriptor = ReleaseDescriptor::from_json(&json)
        .with_context(|| format!("invalid release descriptor {}", args.descriptor.display()))?;
    Ok(descriptor)
}

/// # Errors
///
/// Returns an error if the descriptor is invalid, the release already
/// exists, or its jobs cannot be queued.
pub async fn run_install_command(args: &InstallArgs, config: &Config) -> Result<()> {
    let descriptor = read_descriptor(args).await?;
    let daemon = Daemon::from_config(config).await?;

    let result = daemon.subscriptions().add(&descriptor).await;
    daemon.close().await;
    let plan = result?;

    println!(
        "queued {}: {} download(s), {} extraction(s)",
        descriptor.release_id, plan.downloads, plan.extracts
    );
    Ok(())
}

/// # Errors
///
/// Returns an error if the release is unknown or cannot be removed.
pub async fn run_remove_command(args: &ReleaseArgs, config: &Config) -> Result<()> {
    let daemon = Daemon::from_config(config).await?;
    let result = daemon.subscriptions().remove(&args.release_id).await;
    daemon.close().await;
    result?;

    println!("removed {}", args.release_id);
    Ok(())
}

/// # Errors
///
/// Returns an error if the release is unknown or a link path is invalid.
pub async fn run_enable_command(args: &ReleaseArgs, config: &Config) -> Result<()> {
    let daemon = Daemon::from_config(config).await?;
    let result = daemon.subscriptions().enable(&args.release_id).await;
    daemon.close().await;

    println!("enabled {}: {} link(s) created", args.release_id, result?);
    Ok(())
}

/// # Errors
///
/// Returns an error if the release is unknown.
pub async fn run_disable_command(args: &ReleaseArgs, config: &Config) -> Result<()> {
    let daemon = Daemon::from_config(config).await?;
    let result = daemon.subscriptions().disable(&args.release_id).await;
    daemon.close().await;

    println!("disabled {}: {} link(s) removed", args.release_id, result?);
    Ok(())
}
