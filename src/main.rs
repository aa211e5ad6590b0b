//! evb - EditVideoBot command-line client
//!
//! Submits media files with edit commands to the EditVideoBot API,
//! downloads the results and shows account statistics.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use evb::cli::{Args, Commands};
use evb::commands::{parse_sequence, COMMAND_TABLE};
use evb::config::Config;
use evb::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Commands => print_command_table(),
        Commands::InitConfig { output } => {
            if output.exists() {
                bail!("{} already exists", output.display());
            }
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::Stats => {
            let mut session = open_session(&config, args.api_key)?;
            let stats = with_spinner("Fetching stats", session.stats()).await;
            session.close();

            println!("{}", serde_json::to_string_pretty(&stats?)?);
        }
        Commands::Edit { input, commands, ext, output } => {
            let commands = parse_sequence(&commands)?;
            let extension = ext
                .or_else(|| input.extension().and_then(|e| e.to_str()).map(str::to_string))
                .unwrap_or_else(|| config.edit.default_extension.clone());
            let media = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let mut session = open_session(&config, args.api_key)?;
            let outcome = run_edit(&session, media, &commands, &extension, output).await;
            session.close();
            outcome?;
        }
    }

    Ok(())
}

async fn run_edit(
    session: &Session,
    media: Vec<u8>,
    commands: &[evb::Command],
    extension: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let result = with_spinner("Editing", session.edit(media, commands, extension)).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(output) = output {
        let media = with_spinner("Downloading", result.download()).await?;
        tokio::fs::write(&output, &media)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Saved {} bytes to {}", media.len(), output.display());
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load evb.toml from current directory first
            if Path::new("evb.toml").exists() {
                info!("Found evb.toml in current directory, loading...");
                Config::from_file("evb.toml")?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

fn open_session(config: &Config, api_key: Option<String>) -> Result<Session> {
    let Some(api_key) = api_key.or_else(|| config.api.api_key.clone()) else {
        bail!("No API key: pass --api-key, set EVB_API_KEY, or add api.api_key to the config file");
    };

    let mut session = Session::from_config(&config.api, &api_key)?;
    session.open()?;
    Ok(session)
}

async fn with_spinner<T>(message: &str, future: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = future.await;
    spinner.finish_and_clear();
    output
}

fn print_command_table() {
    println!("{:<14} {:<14} {}", "Command", "Value", "Description");
    println!("{}", "-".repeat(80));
    for spec in COMMAND_TABLE {
        println!("{:<14} {:<14} {}", spec.name, spec.value_type.to_string(), spec.description);
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".evb").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "evb.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr; stdout carries results
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
