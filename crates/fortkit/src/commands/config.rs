//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;

use fortkit_config::{ConfigSource, FortkitConfig, HttpSection, ManifestSection};

use super::{Context, client_config, display_path, manifest_config};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the merged configuration and where it was loaded from
    Show,

    /// Show the user configuration file path
    Path,

    /// Write a config file with the default settings
    Init {
        /// Create project-local config (./fortkit.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Merged configuration for JSON output.
#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    sources: Vec<SourceOutput>,
    warnings: &'a [String],
    config: &'a FortkitConfig,
}

#[derive(Debug, Serialize)]
struct SourceOutput {
    path: String,
    loaded: bool,
}

impl From<&ConfigSource> for SourceOutput {
    fn from(source: &ConfigSource) -> Self {
        Self {
            path: source.path.display().to_string(),
            loaded: source.loaded,
        }
    }
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(ctx),
        ConfigCommand::Init { local } => cmd_init(ctx, local),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let config = &loaded.config;

    if ctx.json_output {
        let output = ShowOutput {
            sources: loaded.sources.iter().map(SourceOutput::from).collect(),
            warnings: &loaded.warnings,
            config,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();

    println!("{}", style("fortkit configuration").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    println!("Config files (later overrides earlier):");
    for source in &loaded.sources {
        let status = if source.loaded {
            green.apply_to("✓ loaded").to_string()
        } else {
            dim.apply_to("· not found").to_string()
        };
        println!("  {} {}", status, source.path.display());
    }
    println!();

    // Effective values, defaults filled in
    let http = client_config(config)?;
    let manifest = manifest_config(config);

    println!("HTTP:");
    println!("  {} {}", dim.apply_to("protected domain:"), http.protected_domain);
    println!("  {} {}s", dim.apply_to("timeout:"), http.timeout.as_secs());
    for (name, value) in &http.default_headers {
        println!(
            "  {} {}: {}",
            dim.apply_to("header:"),
            name,
            value.to_str().unwrap_or("<binary>")
        );
    }
    println!();

    println!("Manifest:");
    println!("  {} {}", dim.apply_to("directory:"), manifest.directory.display());
    println!("  {} {}", dim.apply_to("product:"), manifest.product_name);
    println!("  {} .{}", dim.apply_to("extension:"), manifest.extension);
    println!("  {} {}", dim.apply_to("fallback UA:"), manifest.fallback_user_agent);
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for warning in &loaded.warnings {
            println!("  ⚠ {}", warning);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        println!("{}", config.to_toml()?);
    }

    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    let path = ctx.user_config_path();

    if ctx.json_output {
        let output = serde_json::json!({ "path": path });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if path.is_some() {
        println!("{}", display_path(path.as_deref()));
    } else {
        eprintln!("Could not determine config directory");
    }

    Ok(())
}

fn cmd_init(ctx: &Context, local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("fortkit.toml")
    } else {
        ctx.user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    fortkit_config::save_config(&default_config(), &path)?;
    println!("✓ Created config file: {}", path.display());

    Ok(())
}

/// The built-in defaults written out as an explicit config.
fn default_config() -> FortkitConfig {
    let http = fortkit_client::ClientConfig::default();
    let manifest = fortkit_manifest::ManifestConfig::default();

    FortkitConfig {
        http: Some(HttpSection {
            protected_domain: Some(http.protected_domain),
            timeout_secs: Some(http.timeout.as_secs()),
            headers: Default::default(),
        }),
        manifest: Some(ManifestSection {
            directory: Some(manifest.directory),
            product_name: Some(manifest.product_name),
            extension: Some(manifest.extension),
            fallback_user_agent: Some(manifest.fallback_user_agent),
        }),
    }
}
