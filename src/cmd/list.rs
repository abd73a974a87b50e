// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! List command implementation for dropzone-rs.
//!
//! ```text
//! list            table, one row per release
//! list --json     InstalledRelease array
//! list --watch    one progress bar per release, redrawn every --interval
//!                 until every release has settled
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::cli::release::ListArgs;
use crate::config::Config;
use crate::daemon::Daemon;
use crate::error::Result;
use crate::model::{InstalledRelease, ReleaseStatus};
use crate::subscription::SubscriptionService;

/// Main handler for list command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub async fn run_list_command(args: &ListArgs, config: &Config) -> Result<()> {
    let daemon = Daemon::from_config(config).await?;

    let result = if args.watch {
        watch(daemon.subscriptions(), Duration::from_secs(args.interval)).await
    } else {
        print_once(daemon.subscriptions(), args.json).await
    };

    daemon.close().await;
    result
}

async fn print_once(subscriptions: &SubscriptionService, json: bool) -> Result<()> {
    let releases = subscriptions.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&releases)?);
    } else if releases.is_empty() {
        println!("No releases installed");
    } else {
        for line in format_table(&releases) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Aligned table with a header row.
#[must_use]
pub fn format_table(releases: &[InstalledRelease]) -> Vec<String> {
    let id_width = releases
        .iter()
        .map(|r| r.release_id.len())
        .chain(std::iter::once("RELEASE".len()))
        .max()
        .unwrap_or(0);
    let name_width = releases
        .iter()
        .map(|r| r.mod_name.len())
        .chain(std::iter::once("MOD".len()))
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!(
        "{:<id_width$}  {:<name_width$}  {:<10}  {:<11}  {:>8}",
        "RELEASE", "MOD", "VERSION", "STATUS", "PROGRESS"
    )];
    lines.extend(releases.iter().map(|r| {
        format!(
            "{:<id_width$}  {:<name_width$}  {:<10}  {:<11}  {:>7.1}%",
            r.release_id,
            r.mod_name,
            r.version,
            r.status.to_string(),
            r.progress_percent
        )
    }));
    lines
}

/// True once no job of the release is left to run.
#[must_use]
pub const fn is_settled(status: ReleaseStatus) -> bool {
    !matches!(
        status,
        ReleaseStatus::Queued | ReleaseStatus::Downloading | ReleaseStatus::Extracting
    )
}

fn bar_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template(
                "{prefix:.bold} [{wide_bar:.cyan/blue}] {pos:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        })
        .clone()
}

/// Whole percent for a progress bar position.
fn bar_position(percent: f64) -> u64 {
    (0u8..=100)
        .rev()
        .find(|&n| f64::from(n) <= percent)
        .map_or(0, u64::from)
}

async fn watch(subscriptions: &SubscriptionService, interval: Duration) -> Result<()> {
    let multi = MultiProgress::new();
    let mut bars: HashMap<String, ProgressBar> = HashMap::new();

    loop {
        let releases = subscriptions.list().await?;

        bars.retain(|id, bar| {
            let present = releases.iter().any(|r| &r.release_id == id);
            if !present {
                bar.finish_and_clear();
            }
            present
        });

        for release in &releases {
            let bar = bars.entry(release.release_id.clone()).or_insert_with(|| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(bar_style());
                bar.set_prefix(format!("{} {}", release.release_id, release.version));
                bar
            });
            bar.set_position(bar_position(release.progress_percent));
            bar.set_message(release.status.to_string());
        }

        if releases.iter().all(|r| is_settled(r.status)) {
            for bar in bars.values() {
                bar.finish();
            }
            return Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                for bar in bars.values() {
                    bar.abandon();
                }
                return Ok(());
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}
