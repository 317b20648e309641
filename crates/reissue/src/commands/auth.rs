//! Session commands - login, signup, logout, refresh.

use anyhow::{Context as _, Result};
use clap::Args;
use console::style;
use serde::Serialize;

use reissue_client::{LoginRequest, Session, SignupRequest};

use super::{Context, describe, mask};

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account id
    pub auth_id: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "REISSUE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Arguments for the signup command.
#[derive(Args, Debug)]
pub struct SignupArgs {
    /// Account id
    pub auth_id: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "REISSUE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,
}

/// Session summary for JSON output. Tokens are always masked.
#[derive(Debug, Serialize)]
pub(crate) struct SessionOutput {
    pub authenticated: bool,
    pub can_refresh: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl From<&Session> for SessionOutput {
    fn from(session: &Session) -> Self {
        Self {
            authenticated: session.is_authenticated(),
            can_refresh: session.can_refresh(),
            access_token: session.access_token.as_deref().map(mask),
            refresh_token: session.refresh_token.as_deref().map(mask),
        }
    }
}

fn password(given: Option<String>) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

fn print_session(ctx: &Context, session: &Session, headline: &str) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&SessionOutput::from(session))?);
    } else {
        println!("{} {}", style("✓").green(), headline);
        if ctx.verbose
            && let Some(access) = &session.access_token
        {
            println!("  Access token: {}", mask(access));
        }
    }
    Ok(())
}

/// Run the login command.
pub async fn login(args: LoginArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let request = LoginRequest::new(args.auth_id, password(args.password)?);

    let session = client.auth().login(&request).await.map_err(|e| {
        if e.is_not_found() {
            anyhow::anyhow!("Unknown account or wrong password")
        } else {
            describe(e)
        }
    })?;

    print_session(ctx, &session, "Logged in")
}

/// Run the signup command.
pub async fn signup(args: SignupArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let request = SignupRequest {
        auth_id: args.auth_id,
        password: password(args.password)?,
        name: args.name,
        email: args.email,
    };

    let session = client.auth().signup(&request).await.map_err(describe)?;
    print_session(ctx, &session, "Account created")
}

/// Run the logout command.
pub async fn logout(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    client.auth().logout().await.map_err(describe)?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "logged_out": true }));
    } else {
        println!("Logged out. Stored tokens removed.");
    }
    Ok(())
}

/// Run the refresh command.
pub async fn refresh(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    client.refresh().await.map_err(describe)?;

    let session = client.session().await.map_err(describe)?;
    print_session(ctx, &session, "Session reissued")
}
