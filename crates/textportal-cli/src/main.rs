use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use textportal_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "textportal")]
#[command(author, version, about = "Text-only news and weather portal served from a page cache")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to $TEXTPORTAL_CONFIG or ~/.config/textportal/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve cached pages over HTTP and accept regeneration triggers
    Serve,
    /// Rebuild and publish both pages once
    Regenerate,
    /// Show freshness of the published pages
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the trigger body to configure in an external scheduler
    TriggerPayload,
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.general.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Needs neither config nor logging
    if let Some(Commands::TriggerPayload) = cli.command {
        return commands::trigger_payload::run();
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let config = Arc::new(config);

    init_logging(&config);

    match cli.command {
        Some(Commands::Serve) | None => commands::serve::run(config).await,
        Some(Commands::Regenerate) => commands::regenerate::run(&config).await,
        Some(Commands::Status { json }) => commands::status::run(&config, json).await,
        Some(Commands::TriggerPayload) => commands::trigger_payload::run(),
    }
}
