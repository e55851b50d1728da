//! molt-bot - Autoposter daemon for Moltbook
//!
//! Runs the like / follow / reply / post tasks on their intervals until
//! interrupted, or once with `--once`.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use libmoltbot::logging::{LogFormat, LoggingConfig};
use libmoltbot::pacing::{Shutdown, TokioSleeper};
use libmoltbot::platforms::moltbook::MoltbookClient;
use libmoltbot::platforms::Platform;
use libmoltbot::{BotError, Config, Credentials, Scheduler, StatsSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "molt-bot")]
#[command(version)]
#[command(about = "Autoposter daemon for Moltbook")]
#[command(long_about = "\
molt-bot - Autoposter daemon for Moltbook

DESCRIPTION:
    molt-bot likes, follows, replies and posts on Moltbook on behalf of an
    agent. Each action runs on its own interval, in the fixed order
    like, follow, reply, post. Rate limits are honored and no item is
    liked, replied to, or followed twice.

USAGE:
    # Run continuously (logs to stderr)
    molt-bot

    # Run every enabled task once and print the stats
    molt-bot --once

    # Machine-readable stats, JSON logs
    molt-bot --once --format json --log-format json

    # Check the credentials against the API
    molt-bot --whoami

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current request)

CONFIGURATION:
    Configuration file: ~/.config/moltbot/config.toml (or MOLTBOT_CONFIG)
    Credentials file:   ~/.config/moltbook/credentials.json (or MOLTBOT_CREDENTIALS)

    [auto_like]
    enabled = true
    interval_seconds = 60
    max_per_run = 5

    [auto_reply]
    enabled = true
    keywords = [\"AI\", \"rust\"]

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime or configuration error
    2 - Authentication rejected by Moltbook
    3 - Invalid input
")]
struct Cli {
    /// Run every enabled task once and exit
    #[arg(long)]
    once: bool,

    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    poll_interval: Option<u64>,

    /// Path to config.toml
    #[arg(short, long, value_name = "PATH", env = "MOLTBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to credentials.json
    #[arg(long, value_name = "PATH", env = "MOLTBOT_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format: text, json or pretty (overrides MOLTBOT_LOG_FORMAT)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Output format for the stats report
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the agent's profile and exit
    #[arg(long, conflicts_with = "once")]
    whoami: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = LoggingConfig::from_env(cli.log_format, cli.verbose).init() {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

/// Exit code of the library error behind `e`, 1 otherwise
fn exit_code(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<BotError>()
        .map(BotError::exit_code)
        .unwrap_or(1)
}

async fn run(cli: Cli) -> Result<()> {
    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(seconds) = cli.poll_interval {
        if seconds == 0 {
            return Err(BotError::InvalidInput(
                "--poll-interval must be greater than zero".to_string(),
            )
            .into());
        }
        config.scheduler.poll_interval_seconds = seconds;
    }

    let credentials =
        Credentials::load(cli.credentials.as_deref()).context("Failed to load credentials")?;

    let shutdown = Shutdown::new();
    setup_signal_handlers(shutdown.clone())?;

    let client = MoltbookClient::from_config(
        &config.api,
        &credentials,
        Arc::new(TokioSleeper),
        shutdown.clone(),
    )?;

    if cli.whoami {
        let profile = client.user_info(&credentials.agent_name).await?;
        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
            OutputFormat::Text => {
                println!("username: {}", profile.username);
                if let Some(name) = &profile.display_name {
                    println!("display name: {}", name);
                }
                if let Some(count) = profile.follower_count {
                    println!("followers: {}", count);
                }
            }
        }
        return Ok(());
    }

    let mut scheduler =
        Scheduler::from_config(&config, Arc::new(client), credentials.agent_name.clone())
            .with_shutdown(shutdown);

    info!(
        "molt-bot starting as {} ({} mode)",
        credentials.agent_name,
        if cli.once { "once" } else { "continuous" }
    );

    let outcome = if cli.once {
        scheduler.run_once().await
    } else {
        scheduler.run_forever().await
    };

    // Stats are reported even when the run ended with an error
    print_stats(&scheduler.stats(), cli.format)?;
    outcome?;

    info!("molt-bot stopped");
    Ok(())
}

fn print_stats(snapshot: &StatsSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&snapshot.to_json())?),
        OutputFormat::Text => println!("Stats: {}", snapshot),
    }
    Ok(())
}

/// Set the shutdown flag on SIGINT / SIGTERM
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Shutdown) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;

    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!(signal, "Received shutdown signal, stopping gracefully...");
            shutdown.trigger();
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(shutdown: Shutdown) -> Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping gracefully...");
            shutdown.trigger();
        }
    });
    Ok(())
}
