//! CLI command handlers.

pub mod config;
pub mod fetch;
pub mod manifest;
pub mod user_agent;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context as _, Result};
use fortkit_client::ClientConfig;
use fortkit_config::{FortkitConfig, LoadedConfig};
use fortkit_manifest::{ManifestConfig, ManifestResolver, Platform};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Explicit user config directory.
    pub config_dir: Option<PathBuf>,
}

impl Context {
    /// Discover and merge config layers, logging any layer that failed to load.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let loaded = fortkit_config::load_config_with_options(None, self.config_dir.as_deref())?;
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }
        Ok(loaded)
    }

    /// Path of the user config file.
    pub fn user_config_path(&self) -> Option<PathBuf> {
        match &self.config_dir {
            Some(dir) => Some(dir.join("config.toml")),
            None => fortkit_config::user_config_path(),
        }
    }
}

/// Manifest resolver settings from config, defaults for anything unset.
pub fn manifest_config(config: &FortkitConfig) -> ManifestConfig {
    let mut resolved = ManifestConfig::default();
    if let Some(section) = &config.manifest {
        if let Some(dir) = &section.directory {
            resolved.directory = dir.clone();
        }
        if let Some(name) = &section.product_name {
            resolved.product_name = name.clone();
        }
        if let Some(ext) = &section.extension {
            resolved.extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(ua) = &section.fallback_user_agent {
            resolved.fallback_user_agent = ua.clone();
        }
    }
    resolved
}

/// Build a resolver, optionally pretending to run on another platform.
pub fn manifest_resolver(config: &FortkitConfig, platform: Option<Platform>) -> ManifestResolver {
    let resolver = ManifestResolver::new(manifest_config(config));
    match platform {
        Some(platform) => resolver.with_platform(platform),
        None => resolver,
    }
}

/// Client pipeline settings from config, defaults for anything unset.
pub fn client_config(config: &FortkitConfig) -> Result<ClientConfig> {
    let mut resolved = ClientConfig::default();
    if let Some(http) = &config.http {
        if let Some(domain) = &http.protected_domain {
            resolved.protected_domain = domain.clone();
        }
        if let Some(secs) = http.timeout_secs {
            if secs == 0 {
                anyhow::bail!("http.timeout_secs must be greater than zero");
            }
            resolved.timeout = Duration::from_secs(secs);
        }
        resolved.default_headers = parse_headers(
            http.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
    }
    Ok(resolved)
}

/// Parse `name`/`value` pairs into a header map.
pub fn parse_headers<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let header_name = HeaderName::from_str(name.trim())
            .with_context(|| format!("invalid header name '{}'", name))?;
        let header_value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("invalid value for header '{}'", name))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// Display helper for an optional path.
pub fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string())
}
