// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leadflow - role-based lead management service.
//!
//! This is the binary entry point: `serve` runs the HTTP gateway,
//! `bootstrap-admin` seeds the first Super Admin, and `config check`
//! validates the layered configuration.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod bootstrap;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use leadflow_config::{ConfigError, LeadflowConfig};

/// Leadflow - role-based lead management service.
#[derive(Parser, Debug)]
#[command(name = "leadflow", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Create or promote the initial Super Admin account.
    BootstrapAdmin {
        /// Overrides `bootstrap.admin_email`.
        #[arg(long)]
        email: Option<String>,
        /// Overrides `bootstrap.admin_name`.
        #[arg(long)]
        name: Option<String>,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration, reporting every problem found.
    Check,
}

fn load(path: Option<&PathBuf>) -> Result<LeadflowConfig, Vec<ConfigError>> {
    match path {
        Some(path) => leadflow_config::load_and_validate_path(path),
        None => leadflow_config::load_and_validate(),
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leadflow={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            leadflow_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.service.log_level);
            serve::run_serve(config).await
        }
        Some(Commands::BootstrapAdmin { email, name }) => {
            init_tracing(&config.service.log_level);
            bootstrap::run_bootstrap_admin(config, email, name).await
        }
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => {
            println!(
                "leadflow: config OK (service.name={}, database={})",
                config.service.name, config.storage.database_path
            );
            Ok(())
        }
        None => {
            println!("leadflow: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::parse_from(["leadflow", "bootstrap-admin", "--email", "root@acme.io"]);
        match cli.command {
            Some(Commands::BootstrapAdmin { email, name }) => {
                assert_eq!(email.as_deref(), Some("root@acme.io"));
                assert!(name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(["leadflow", "config", "check", "--config", "/tmp/x.toml"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommand::Check
            })
        ));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
    }

    #[test]
    #[serial]
    fn env_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leadflow.toml");
        std::fs::write(&path, "[gateway]\nport = 9000\n").unwrap();

        // SAFETY: env mutation is confined to #[serial] tests.
        unsafe { std::env::set_var("LEADFLOW_GATEWAY_PORT", "9100") };
        let loaded = load(Some(&path));
        unsafe { std::env::remove_var("LEADFLOW_GATEWAY_PORT") };

        assert_eq!(loaded.unwrap().gateway.port, 9100);
    }

    #[test]
    #[serial]
    fn invalid_file_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leadflow.toml");
        std::fs::write(&path, "[intake]\nmax_emails = 0\n").unwrap();

        let errors = load(Some(&path)).unwrap_err();
        assert!(!errors.is_empty());
    }
}
