// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dumpbot - scheduled MySQL dumps delivered to Telegram.
//!
//! This is the binary entry point for the dumpbot agent.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dumpbot_config::{ConfigError, DumpbotConfig};

/// Dumpbot - scheduled MySQL dumps delivered to Telegram.
#[derive(Parser, Debug)]
#[command(name = "dumpbot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Poll for commands and run the backup schedule (default).
    Serve,
    /// Run one backup plus retention, then exit.
    Once,
    /// Run one retention pass, then exit.
    Sweep,
    /// Validate the configuration and print it with secrets removed.
    CheckConfig,
}

fn load(path: Option<&Path>) -> Result<DumpbotConfig, Vec<ConfigError>> {
    match path {
        Some(path) => dumpbot_config::load_and_validate_path(path),
        None => dumpbot_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            dumpbot_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Commands::Serve);
    if command != Commands::CheckConfig {
        serve::init_tracing(&config.agent.log_level);
    }

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Once => serve::run_once(config).await,
        Commands::Sweep => serve::run_sweep(config).await,
        Commands::CheckConfig => serve::check_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dumpbot: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc can advance the epoch; the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["dumpbot"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["dumpbot", "once", "--config", "/tmp/d.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Once));
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/d.toml")));
    }

    #[test]
    fn check_config_is_kebab_case() {
        let cli = Cli::try_parse_from(["dumpbot", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
