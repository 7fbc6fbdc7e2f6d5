use anyhow::Result;
use clap::{Parser, Subcommand};

use auditlog::cli::{
    handle_change_command, handle_config, handle_export_command, handle_forget_user,
    handle_request_command, ChangeCommands, ExportCommands, RequestCommands,
};
use auditlog::config::settings::{global, install_global};
use auditlog::config::{AuditPaths, AuditSettings};
use auditlog::storage::JsonlAuditStore;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "AUDITLOG_LOG";

#[derive(Parser)]
#[command(
    name = "auditlog",
    version,
    about = "Browse and export recorded entity changes",
    long_about = "auditlog reads the change and request records written by the \
                  auditlog library and lets you inspect, filter and export them \
                  from the command line."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse recorded changes
    #[command(subcommand)]
    Changes(ChangeCommands),

    /// Browse logged requests
    #[command(subcommand)]
    Requests(RequestCommands),

    /// Export audit records
    #[command(subcommand)]
    Export(ExportCommands),

    /// Remove a user's identity from every record
    ForgetUser {
        /// User identifier
        user: String,
    },

    /// Show current configuration and paths
    Config,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let paths = AuditPaths::new()?;
    install_global(AuditSettings::load_or_default(&paths)?)?;
    let store = JsonlAuditStore::open(&paths)?;
    tracing::debug!(data_dir = %paths.base_dir().display(), "opened audit store");

    match cli.command {
        Some(Commands::Changes(cmd)) => handle_change_command(&store, cmd)?,
        Some(Commands::Requests(cmd)) => handle_request_command(&store, cmd)?,
        Some(Commands::Export(cmd)) => handle_export_command(&store, cmd)?,
        Some(Commands::ForgetUser { user }) => handle_forget_user(&store, &user)?,
        Some(Commands::Config) => handle_config(&paths, global()),
        None => {
            println!("auditlog - change tracking for persisted entities");
            println!();
            println!("Run 'auditlog --help' for usage information.");
        }
    }

    Ok(())
}
