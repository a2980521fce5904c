//! Manifest command - shows the installed game's launcher manifest.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use fortkit_manifest::{Platform, VersionManifest};

use super::{Context, manifest_resolver};

/// Arguments for the manifest command.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Treat the host as this platform (windows, macos, linux)
    #[arg(long)]
    pub platform: Option<Platform>,
}

#[derive(Debug, Serialize)]
struct ManifestOutput<'a> {
    platform: Platform,
    supported: bool,
    directory: String,
    manifest: Option<&'a VersionManifest>,
}

/// Run the manifest command.
pub async fn run(args: ManifestArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let resolver = manifest_resolver(&loaded.config, args.platform);

    let manifest = resolver.resolve_manifest().await?;

    if ctx.json_output {
        let output = ManifestOutput {
            platform: resolver.platform(),
            supported: resolver.is_supported_platform(),
            directory: resolver.config().directory.display().to_string(),
            manifest: manifest.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();

    let Some(manifest) = manifest else {
        if resolver.is_supported_platform() {
            println!(
                "No {} manifest found in {}",
                resolver.config().product_name,
                resolver.config().directory.display()
            );
        } else {
            println!(
                "Manifest lookup is not supported on {} (only {})",
                resolver.platform(),
                resolver.config().supported_platform
            );
        }
        return Ok(());
    };

    println!("{}", style(&resolver.config().product_name).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("Version:"), manifest.app_version_string);
    println!("  {} {}", dim.apply_to("User-Agent:"), manifest.user_agent);
    println!("  {} {}", dim.apply_to("Namespace:"), manifest.namespace);
    println!("  {} {}", dim.apply_to("Install:"), manifest.install_location);
    println!("  {} {}", dim.apply_to("Executable:"), manifest.executable_location);
    if !manifest.launch_command.is_empty() {
        println!("  {} {}", dim.apply_to("Launch args:"), manifest.launch_command);
    }

    Ok(())
}
