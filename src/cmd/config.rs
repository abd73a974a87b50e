// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Config-related commands for dropzone-rs.

use crate::cli::global::GlobalOptions;
use crate::config::{Config, ConfigLoader};
use crate::error::Result;

/// Default configuration file, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "dropzone.toml";

/// Environment variable prefix (`DROPZONE_SECTION__KEY`).
pub const ENV_PREFIX: &str = "DROPZONE";

/// Assembles every configuration source named by the global options.
///
/// # Errors
///
/// Returns an error if a `--set` option or CLI override is malformed.
pub fn build_config_loader(global: &GlobalOptions) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new();
    if !global.no_default_config {
        loader = loader.add_toml_file_optional(DEFAULT_CONFIG_FILE);
    }
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    loader = loader.with_env_prefix(ENV_PREFIX);

    for option in global.to_config_overrides() {
        loader = loader.set_option(&option)?;
    }
    Ok(loader)
}

/// Loads the configuration for a command.
///
/// # Errors
///
/// Returns an error if a source is missing or malformed, or if the merged
/// configuration is invalid.
pub fn load_config(global: &GlobalOptions) -> Result<Config> {
    build_config_loader(global)?.build()
}

/// Display current configuration options, then the files they came from.
pub fn run_options_command(config: &Config, loaded_files: &[String]) {
    for line in config.format_options() {
        println!("{line}");
    }
    if !loaded_files.is_empty() {
        println!();
        for line in loaded_files {
            println!("{line}");
        }
    }
}
