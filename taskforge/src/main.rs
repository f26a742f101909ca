//! `TaskForge` — cross-platform CLI task manager.
//!
//! Keeps a local task collection on disk and optionally mirrors it to a
//! remote paste service for transfer between machines.
//!
//! ```bash
//! # Add and list tasks
//! cargo run --bin taskforge -- add "Buy milk" --priority low --due tomorrow
//! cargo run --bin taskforge -- list --all
//!
//! # Push the list to the paste service and pull it elsewhere
//! cargo run --bin taskforge -- sync create
//! cargo run --bin taskforge -- sync import https://rubis.app/s/<id>
//! ```

use clap::Parser;

use taskforge::cli::Cli;
use taskforge::commands;
use taskforge::config::Config;
use taskforge::remote::RubisClient;
use taskforge::store::TaskStore;
use taskforge::sync::SyncManager;

fn main() {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            Config::default()
        }
    };

    tracing::debug!(data_dir = %config.data_dir.display(), "taskforge starting");

    let mut store = TaskStore::open(&config.data_dir);
    let client = match RubisClient::new(&config.api_base_url, config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error initializing remote client: {e}");
            std::process::exit(1);
        }
    };
    let mut sync = SyncManager::open(config.sync_state_file.clone(), client);

    commands::dispatch(cli.command, &mut store, &mut sync, &config);
}

/// Initialize stderr logging with the resolved log level.
///
/// Stdout belongs to the rendered command output, so diagnostics go to
/// stderr.
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
