//! Status command - shows the stored session.

use anyhow::Result;
use console::{Style, style};

use super::auth::SessionOutput;
use super::{Context, describe, mask};

/// Run the status command.
pub async fn run(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let session = client.session().await.map_err(describe)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&SessionOutput::from(&session))?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let token = |t: &Option<String>| match t {
        Some(t) => mask(t),
        None => "not set".to_string(),
    };

    println!();
    println!("{}", style("Session").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("Server:"), client.base_url());
    println!(
        "  {} {}",
        dim.apply_to("Status:"),
        if session.is_authenticated() {
            style("logged in").green()
        } else {
            style("logged out").yellow()
        }
    );
    println!("  {} {}", dim.apply_to("Access token:"), token(&session.access_token));
    println!("  {} {}", dim.apply_to("Refresh token:"), token(&session.refresh_token));
    if ctx.verbose
        && let Ok(path) = ctx.token_path()
    {
        println!("  {} {}", dim.apply_to("Token file:"), path.display());
    }
    println!();

    Ok(())
}
