// src/main.rs

//! sheetwatch CLI
//!
//! Long-running watcher entry point. `watch` polls forever; `check` runs
//! exactly one cycle and exits.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sheetwatch::{
    dedup,
    error::Result,
    models::Config,
    notify::TelegramNotifier,
    pipeline,
    utils::http,
};

/// sheetwatch - Google Sheet row-alert watcher
#[derive(Parser, Debug)]
#[command(
    name = "sheetwatch",
    version,
    about = "Watches a Google Sheet for flagged rows and sends Telegram alerts"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the sheet on the configured interval, forever
    Watch,

    /// Run exactly one poll cycle and exit
    Check,

    /// Validate the configuration file
    Validate,

    /// Print the chat ID of every message the bot receives
    ChatIds,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configuration problems are the only fatal errors; everything past
    // startup is retried on the next cycle instead.
    let config = Config::load(&cli.config)?;
    config.validate()?;

    let client = http::create_client(&config.watcher)?;

    match cli.command {
        Command::Watch => {
            log::info!("Monitoring sheet: {}", config.sheet.export_url());
            log::info!("Service line: {}", config.filter.service_line);

            let mut store = dedup::open_store(&config).await?;
            let notifier = TelegramNotifier::new(client.clone(), config.telegram.token.as_str());
            pipeline::run_watch(&config, &client, store.as_mut(), &notifier).await?;
        }
        Command::Check => {
            let mut store = dedup::open_store(&config).await?;
            let notifier = TelegramNotifier::new(client.clone(), config.telegram.token.as_str());
            pipeline::run_cycle(&config, &client, store.as_mut(), &notifier).await?;
        }
        Command::Validate => {
            println!("Configuration OK");
            println!("  sheet: {}", config.sheet.export_url());
            println!(
                "  filter: {} = \"{}\", {} = \"{}\"",
                config.filter.status_column,
                config.filter.status_value,
                config.filter.service_column,
                config.filter.service_line
            );
            println!("  destinations: {}", config.telegram.chat_ids.len());
        }
        Command::ChatIds => {
            let notifier = TelegramNotifier::new(client, config.telegram.token.as_str());
            notifier.print_chat_ids().await?;
        }
    }

    Ok(())
}
