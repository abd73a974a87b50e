// dropzone-rs: Dropzone Install Daemon
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Serve | Install | Remove | Enable | Disable | List | Options
//! ```

use std::process::ExitCode;

use dropzone_rs::cli::{self, Command};
use dropzone_rs::cmd::config::{build_config_loader, run_options_command};
use dropzone_rs::cmd::list::run_list_command;
use dropzone_rs::cmd::release::{
    run_disable_command, run_enable_command, run_install_command, run_remove_command,
};
use dropzone_rs::cmd::serve::run_serve_command;
use dropzone_rs::config::{Config, GlobalConfig};
use dropzone_rs::logging::{LogConfig, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let command = match &cli.command {
        Some(Command::Version) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Some(command) => command,
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            return ExitCode::FAILURE;
        }
    };

    let (config, loaded_files) = match load_config(&cli.global) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&build_log_config(&config.global)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Command::Options => {
            run_options_command(&config, &loaded_files);
            Ok(())
        }
        Command::Serve => run_serve_command(&config).await,
        Command::Install(args) => run_install_command(args, &config).await,
        Command::Remove(args) => run_remove_command(args, &config).await,
        Command::Enable(args) => run_enable_command(args, &config).await,
        Command::Disable(args) => run_disable_command(args, &config).await,
        Command::List(args) => run_list_command(args, &config).await,
        Command::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(
    global: &cli::global::GlobalOptions,
) -> dropzone_rs::error::Result<(Config, Vec<String>)> {
    let loader = build_config_loader(global)?;
    let loaded_files = loader.format_loaded_files();
    Ok((loader.build()?, loaded_files))
}

fn build_log_config(global: &GlobalConfig) -> LogConfig {
    LogConfig::builder()
        .with_console_level(global.output_log_level)
        .with_file_level(global.file_log_level)
        .maybe_with_log_file(
            (!global.log_file.as_os_str().is_empty()).then(|| global.log_file.display().to_string()),
        )
        .with_json_file(global.json_log)
        .build()
}
