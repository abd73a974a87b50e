// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `serve`: run both queues until Ctrl+C.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::daemon::Daemon;
use crate::error::Result;

/// Runs the daemon in the foreground.
///
/// Jobs interrupted by Ctrl+C stay `IN_PROGRESS` and resume on the next
/// start.
///
/// # Errors
///
/// Returns an error if the daemon cannot be built from `config`.
pub async fn run_serve_command(config: &Config) -> Result<()> {
    let daemon = Daemon::from_config(config).await?;

    let shutdown = CancellationToken::new();
    let signal = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Received Ctrl+C, stopping queues...");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "cannot listen for Ctrl+C"),
            }
        })
    };

    daemon.run(shutdown).await;
    signal.abort();
    daemon.close().await;

    info!("daemon stopped");
    Ok(())
}
