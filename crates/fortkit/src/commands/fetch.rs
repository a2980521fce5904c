//! Fetch command - sends one request through the authenticated client.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use console::Style;
use serde::Serialize;

use fortkit_client::{ApiRequest, Error as ClientError, EpicClient};
use reqwest::Method;

use super::{Context, client_config, manifest_resolver, parse_headers};

/// Arguments for the fetch command.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL to request
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Bearer token for the Authorization header
    #[arg(long, env = "FORTKIT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Extra header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body, sent as-is
    #[arg(short, long)]
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
struct FetchOutput {
    status: u16,
    body: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct FetchErrorOutput {
    status: Option<u16>,
    error_code: Option<String>,
    message: String,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let request = build_request(&args)?;

    let client = EpicClient::builder()
        .config(client_config(&loaded.config)?)
        .user_agent_source(Arc::new(manifest_resolver(&loaded.config, None)))
        .build()?;

    tracing::debug!(method = %request.method, url = %request.url, "sending request");

    match client.send(request).await {
        Ok(response) => {
            if ctx.json_output {
                let body = serde_json::from_slice(&response.body)
                    .unwrap_or_else(|_| serde_json::Value::String(response.text().into_owned()));
                let output = FetchOutput {
                    status: response.status.as_u16(),
                    body,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let green = Style::new().green();
                eprintln!("{}", green.apply_to(response.status.to_string()));
                println!("{}", response.text());
            }
            Ok(())
        }
        Err(e) => {
            if ctx.json_output {
                let output = FetchErrorOutput {
                    status: e.status(),
                    error_code: e.error_code().map(str::to_string),
                    message: e.to_string(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Err(describe(e))
        }
    }
}

fn build_request(args: &FetchArgs) -> Result<ApiRequest> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;
    let mut request = ApiRequest::parse(method, &args.url)
        .with_context(|| format!("invalid URL '{}'", args.url))?;

    let pairs = args
        .headers
        .iter()
        .map(|h| {
            h.split_once(':')
                .with_context(|| format!("header '{}' must be NAME:VALUE", h))
        })
        .collect::<Result<Vec<_>>>()?;
    request.headers.extend(parse_headers(pairs)?);

    if let Some(token) = &args.token {
        request = request.bearer(token)?;
    }
    if let Some(data) = &args.data {
        request = request.body(data.as_bytes());
    }

    Ok(request)
}

fn describe(e: ClientError) -> anyhow::Error {
    if e.is_credential_error() {
        anyhow::Error::new(e).context("access token rejected and no refresh flow is available")
    } else {
        anyhow::Error::new(e)
    }
}
