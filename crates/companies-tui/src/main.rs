//! `companies-tui`: live terminal view of the company directory.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `companies-core`'s [`ViewStream`](companies_core::ViewStream). One
//! screen: a header, a horizontal strip of the most recent companies, and
//! the full list below it.
//!
//! Logs are written to a file (default `/tmp/companies-tui.log`) to avoid
//! corrupting the terminal UI. A background data bridge task forwards
//! every projected state into the TUI action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use companies_config::{ConfigError, Profile};
use companies_core::{Feed, FeedConfig, SystemOpener, TlsVerification};

use crate::app::App;

/// Live terminal view of a company directory.
#[derive(Parser, Debug)]
#[command(name = "companies-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "COMPANIES_PROFILE")]
    profile: Option<String>,

    /// Database root URL (overrides the profile)
    #[arg(short = 'u', long, env = "COMPANIES_URL")]
    url: Option<String>,

    /// Collection path below the database root
    #[arg(long, env = "COMPANIES_COLLECTION")]
    collection: Option<String>,

    /// Read token passed as `?auth=`
    #[arg(long, env = "COMPANIES_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Log file path (defaults to /tmp/companies-tui.log)
    #[arg(long, default_value = "/tmp/companies-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Nothing may go to stdout/stderr while the
/// terminal is in raw mode. The returned guard flushes on drop.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "companies_tui={log_level},companies_core={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("companies-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the feed from the shared config file plus flag overrides.
///
/// Priority: CLI flags > env > profile > defaults.
fn build_feed_config(cli: &Cli) -> Result<FeedConfig> {
    let cfg = companies_config::load_config_or_default();

    let (name, mut profile) = match cfg.active_profile(cli.profile.as_deref()) {
        Ok((name, profile)) => (name.to_owned(), profile.clone()),
        Err(ConfigError::NoDatabase | ConfigError::UnknownProfile { .. })
            if cli.url.is_some() && cli.profile.is_none() =>
        {
            ("default".to_owned(), Profile::new(String::new()))
        }
        Err(ConfigError::NoDatabase) => {
            return Err(eyre!(
                "No database configured. Pass --url or create a profile in {}",
                companies_config::config_path().display()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(ref url) = cli.url {
        profile.database_url.clone_from(url);
    }
    if let Some(ref collection) = cli.collection {
        profile.collection.clone_from(collection);
    }

    let auth = match cli.token {
        Some(ref token) => Some(SecretString::from(token.clone())),
        None => companies_config::resolve_auth_token(&profile, &name),
    };

    let mut feed = companies_config::feed_config(&profile, &cfg.defaults, auth)?;
    if cli.insecure {
        feed.tls = TlsVerification::DangerAcceptInvalid;
    }
    Ok(feed)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    // Configuration errors surface before raw mode
    let config = build_feed_config(&cli)?;
    info!(
        url = %config.database_url,
        collection = %config.collection,
        "starting companies-tui"
    );

    let feed = Feed::new(config)?;
    let mut app = App::new(feed, Arc::new(SystemOpener));
    app.run().await?;

    Ok(())
}
