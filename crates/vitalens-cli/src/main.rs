//! VitaLens CLI - meal uploads and nutrition insights
//!
//! A command-line front end for the VitaLens backend: sign in, upload meal
//! photos and files, and read daily totals, summaries and insights.

mod commands;
mod output;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vitalens_core::{AppServices, ClientConfig, StoreBackend};

#[derive(Parser)]
#[command(name = "vitalens")]
#[command(author, version, about = "Meal uploads and nutrition insights CLI", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: table (default) or json
    #[arg(long, global = true, default_value = "table")]
    format: output::OutputFormat,

    /// Suppress progress messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log requests and session changes to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Backend base URL (or set VITALENS_API_URL env var)
    #[arg(long, env = "VITALENS_API_URL", global = true)]
    api_url: Option<String>,

    /// Credential store: keyring, file or memory (or set VITALENS_STORE env var)
    #[arg(long, env = "VITALENS_STORE", global = true)]
    store: Option<StoreBackend>,

    /// Request timeout in seconds (or set VITALENS_TIMEOUT_SECS env var)
    #[arg(long, env = "VITALENS_TIMEOUT_SECS", global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign out and inspect the session
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },

    /// Upload meals for analysis
    Meal {
        #[command(subcommand)]
        action: commands::meal::MealAction,
    },

    /// Daily totals, period summaries and insights
    Nutrition {
        #[command(subcommand)]
        action: commands::nutrition::NutritionAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

impl Cli {
    /// Effective client configuration: defaults, then flags/env
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(url) = &self.api_url {
            config = config.with_base_url(url.trim());
        }
        if let Some(backend) = self.store {
            config = config.with_store_backend(backend);
        }
        if let Some(secs) = self.timeout.filter(|s| *s > 0) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Message shown for a failed command
fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<vitalens_core::Error>() {
        Some(core) => core.user_message(),
        None => format!("{:#}", err),
    }
}

/// Open the store and wire the services for commands that need them
fn connect(
    config: ClientConfig,
    format: output::OutputFormat,
    quiet: bool,
) -> Result<commands::Context> {
    let services = AppServices::connect(&config)?;
    Ok(commands::Context {
        services,
        config,
        format,
        quiet,
    })
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.client_config();
    let (format, quiet) = (cli.format, cli.quiet);

    match cli.command {
        Commands::Auth { action } => {
            commands::auth::execute(&connect(config, format, quiet)?, action).await
        }
        Commands::Meal { action } => {
            commands::meal::execute(&connect(config, format, quiet)?, action).await
        }
        Commands::Nutrition { action } => {
            commands::nutrition::execute(&connect(config, format, quiet)?, action).await
        }
        // Config inspection needs no store or backend
        Commands::Config { action } => commands::config::execute(&config, format, action),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        log::debug!("{:?}", err);
        output::print_error(&error_message(&err));
        std::process::exit(1);
    }
}
