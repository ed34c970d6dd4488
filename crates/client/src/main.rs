use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

pub(crate) mod config;
pub(crate) mod page;

#[derive(Parser)]
#[command(
    name = "campushub-client",
    version,
    about = "Live message thread and notification menu of the campus resource hub"
)]
struct Cli {
    /// Path to the YAML page configuration
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Follow the configured thread and read replies from stdin (default)
    Watch,
    /// Open the notification menu once and print it
    Notifications,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::from_yaml_file(&cli.config)?;
    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => page::run_all(&config).await?,
        Command::Notifications => page::open_notifications_once(&config).await?,
    }

    Ok(())
}
