//! Request command - send an authenticated request.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use reqwest::Method;

use reissue_client::ApiRequest;

use super::{Context, describe};

/// Arguments for the request command.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the base URL
    pub path: String,

    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Send without stored credentials
    #[arg(long)]
    pub anonymous: bool,
}

/// Build the request descriptor from command-line arguments.
fn build_request(args: &RequestArgs) -> Result<ApiRequest> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{}'", args.method))?;

    let mut request = ApiRequest::new(method, args.path.clone());
    if let Some(data) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("--data must be valid JSON")?;
        request = request.with_json(&body)?;
    }
    if args.anonymous {
        request = request.without_credentials();
    }
    Ok(request)
}

/// Run the request command.
pub async fn run(args: RequestArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let request = build_request(&args)?;

    tracing::debug!(method = %request.method, path = %request.path, "sending request");
    let response = client.send(request).await.map_err(describe)?;

    let body = response.text();
    let pretty = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok());

    if ctx.json_output {
        let body = serde_json::from_str::<serde_json::Value>(&body)
            .unwrap_or(serde_json::Value::String(body));
        let output = serde_json::json!({
            "status": response.status.as_u16(),
            "body": body,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if ctx.verbose {
            eprintln!("HTTP {}", response.status);
        }
        println!("{}", pretty.unwrap_or(body));
    }

    if !response.is_success() {
        bail!("Request failed with status {}", response.status);
    }
    Ok(())
}
