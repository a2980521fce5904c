//! User-agent command - prints the user-agent sent with API requests.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use fortkit_manifest::Platform;

use super::{Context, manifest_resolver};

/// Arguments for the user-agent command.
#[derive(Args, Debug)]
pub struct UserAgentArgs {
    /// Treat the host as this platform (windows, macos, linux)
    #[arg(long)]
    pub platform: Option<Platform>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum UserAgentSource {
    Manifest,
    Fallback,
}

#[derive(Debug, Serialize)]
struct UserAgentOutput {
    user_agent: String,
    source: UserAgentSource,
}

/// Run the user-agent command.
pub async fn run(args: UserAgentArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let resolver = manifest_resolver(&loaded.config, args.platform);

    let user_agent = resolver.resolve_user_agent().await;
    let source = match resolver.cached() {
        Some(Some(manifest)) if manifest.has_user_agent() => UserAgentSource::Manifest,
        _ => UserAgentSource::Fallback,
    };

    if ctx.json_output {
        let output = UserAgentOutput { user_agent, source };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", user_agent);
        if ctx.verbose {
            eprintln!("source: {:?}", source);
        }
    }

    Ok(())
}
