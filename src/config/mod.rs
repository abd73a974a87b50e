// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for dropzone-rs.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. dropzone.toml (cwd, optional)
//! 3. --config files
//! 4. DROPZONE_* env vars
//! 5. --set overrides
//! 6. dedicated CLI flags
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! DROPZONE_PATHS__WORKING_DIR=/srv/dz  → paths.working_dir = "/srv/dz"
//! DROPZONE_QUEUE__MAX_ATTEMPTS=5       → queue.max_attempts = 5
//! DROPZONE_GLOBAL__JSON_LOG=true       → global.json_log = true
//! ```

pub mod loader;
pub mod paths;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Result;

pub use loader::ConfigLoader;
pub use paths::PathsConfig;
pub use types::{GlobalConfig, QueueConfig, ToolsConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Working directory, database and destination roots.
    pub paths: PathsConfig,
    /// External executables.
    pub tools: ToolsConfig,
    /// Queue retry and polling settings.
    pub queue: QueueConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dropzone_rs::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file("/etc/dropzone/dropzone.toml")
    ///     .add_toml_file_optional("dropzone.toml")
    ///     .with_env_prefix("DROPZONE")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Resolve derived paths and validate queue settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue settings are out of range.
    pub fn resolve_and_validate(&mut self) -> Result<()> {
        if self.paths.working_dir.is_some() {
            self.paths.resolve()?;
        }
        self.queue.validate()?;
        Ok(())
    }

    /// Format configuration options for display, aligned on `=`.
    ///
    /// Unset paths print as empty values.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_paths_options(&mut options);
        self.format_tools_options(&mut options);
        self.format_queue_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global.log_file.display().to_string(),
        );
        options.insert("global.json_log".into(), self.global.json_log.to_string());
    }

    fn format_paths_options(&self, options: &mut BTreeMap<String, String>) {
        let fmt = |p: &Option<PathBuf>| {
            p.as_ref()
                .map_or_else(String::new, |p| p.display().to_string())
        };

        options.insert("paths.working_dir".into(), fmt(&self.paths.working_dir));
        options.insert("paths.database".into(), fmt(&self.paths.database));
        options.insert(
            "paths.dcs_working_dir".into(),
            fmt(&self.paths.dcs_working_dir),
        );
        options.insert(
            "paths.dcs_install_dir".into(),
            fmt(&self.paths.dcs_install_dir),
        );
    }

    fn format_tools_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("tools.wget".into(), self.tools.wget.display().to_string());
        options.insert("tools.7z".into(), self.tools.sevenz.display().to_string());
    }

    fn format_queue_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "queue.max_attempts".into(),
            self.queue.max_attempts.to_string(),
        );
        options.insert(
            "queue.retry_delay_secs".into(),
            self.queue.retry_delay_secs.to_string(),
        );
        options.insert(
            "queue.download_poll_secs".into(),
            self.queue.download_poll_secs.to_string(),
        );
        options.insert(
            "queue.extract_poll_secs".into(),
            self.queue.extract_poll_secs.to_string(),
        );
    }
}
