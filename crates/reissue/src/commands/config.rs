//! Config command - configuration management.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show configuration and token file paths
    Path,

    /// Write the effective configuration to the config file
    Init,
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(ctx),
        ConfigCommand::Init => cmd_init(ctx),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    } else {
        print!("{}", ctx.config.to_yaml()?);
    }
    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    let config = ctx.config_path.as_ref().map(|p| p.display().to_string());
    let tokens = ctx.config.token_path().map(|p| p.display().to_string());

    if ctx.json_output {
        let output = serde_json::json!({ "config": config, "tokens": tokens });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let unknown = "(could not determine config directory)".to_string();
        println!("Config: {}", config.unwrap_or_else(|| unknown.clone()));
        println!("Tokens: {}", tokens.unwrap_or(unknown));
    }
    Ok(())
}

fn cmd_init(ctx: &Context) -> Result<()> {
    let path = ctx
        .config_path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }

    reissue_config::save_client_config_to(&ctx.config, path)?;
    println!("Created {}", path.display());
    Ok(())
}
