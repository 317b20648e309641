//! reissue - command-line client for token-authenticated backends.
//!
//! Main entry point for the CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{auth, config, request, status};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// reissue - authenticated requests with automatic token reissue
#[derive(Parser)]
#[command(name = "reissue")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "REISSUE_API_URL")]
    pub server: Option<String>,

    /// Path to the client config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login(auth::LoginArgs),

    /// Register an account and store the session
    Signup(auth::SignupArgs),

    /// Clear stored tokens
    Logout,

    /// Show stored session state
    Status,

    /// Reissue the access token now
    Refresh,

    /// Send an authenticated request
    Request(request::RequestArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "reissue=debug,reissue_client=debug,reissue_config=debug,info"
    } else {
        "reissue=info,reissue_client=info,warn"
    };

    let log_dir = reissue_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "reissue.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "reissue=trace,reissue_client=trace,reissue_config=trace,info",
                )),
        )
        .init();

    // Resolve config: file, then environment, then flags
    let config_path = cli.config.clone().or_else(reissue_config::client_config_path);
    let mut client_config = reissue_config::load_client_config_from(config_path.as_deref())?;
    client_config.apply_env()?;
    if let Some(server) = cli.server {
        client_config.base_url = Some(server);
    }
    client_config.validate()?;

    let ctx = commands::Context {
        config: client_config,
        config_path,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Login(args) => auth::login(args, &ctx).await,
        Commands::Signup(args) => auth::signup(args, &ctx).await,
        Commands::Logout => auth::logout(&ctx).await,
        Commands::Status => status::run(&ctx).await,
        Commands::Refresh => auth::refresh(&ctx).await,
        Commands::Request(args) => request::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx),
    }
}
