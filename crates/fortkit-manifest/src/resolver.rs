//! Manifest resolution and user-agent derivation.
//!
//! The resolver scans the launcher manifest directory once and keeps the
//! outcome for its own lifetime. A miss is cached as well, so an install that
//! appears later is only picked up by a new resolver (in practice, a restart).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::{ManifestError, Result};
use crate::fs::{LocalFs, SharedManifestFs};
use crate::manifest::{ManifestRecord, VersionManifest};
use crate::platform::Platform;

/// Where the Epic Games Launcher keeps its `.item` manifests.
pub const DEFAULT_MANIFEST_DIR: &str = "C:/ProgramData/Epic/EpicGamesLauncher/Data/Manifests";

/// Product whose manifest provides the user-agent.
pub const DEFAULT_PRODUCT_NAME: &str = "Fortnite";

/// Extension of launcher manifest files (without the dot).
pub const DEFAULT_EXTENSION: &str = "item";

/// Known-good user-agent used when no installed version can be found.
pub const FALLBACK_USER_AGENT: &str = "Fortnite/++Fortnite+Release-38.10-CL-47888945-Windows";

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    pub directory: PathBuf,
    pub product_name: String,
    pub extension: String,
    pub fallback_user_agent: String,
    /// The only platform on which the launcher directory is consulted.
    pub supported_platform: Platform,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_MANIFEST_DIR),
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            fallback_user_agent: FALLBACK_USER_AGENT.to_string(),
            supported_platform: Platform::Windows,
        }
    }
}

/// Lazily resolves and caches the installed product's version manifest.
#[derive(Debug)]
pub struct ManifestResolver {
    config: ManifestConfig,
    platform: Platform,
    fs: SharedManifestFs,
    cache: OnceCell<Option<Arc<VersionManifest>>>,
}

impl ManifestResolver {
    /// Create a resolver over the local filesystem for the running platform.
    pub fn new(config: ManifestConfig) -> Self {
        Self {
            config,
            platform: Platform::current(),
            fs: Arc::new(LocalFs),
            cache: OnceCell::new(),
        }
    }

    /// Use a different filesystem implementation.
    pub fn with_fs(mut self, fs: SharedManifestFs) -> Self {
        self.fs = fs;
        self
    }

    /// Pretend to run on `platform`.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_supported_platform(&self) -> bool {
        self.platform == self.config.supported_platform
    }

    /// Cached outcome, if resolution has already completed.
    ///
    /// `Some(None)` means a lookup ran and found nothing.
    pub fn cached(&self) -> Option<Option<Arc<VersionManifest>>> {
        self.cache.get().cloned()
    }

    /// Resolve the installed product's manifest.
    ///
    /// Returns `Ok(None)` on unsupported platforms and when no entry matches.
    /// Unreadable or malformed entries are skipped. Only a failure to list the
    /// directory is an error, and that outcome is not cached.
    pub async fn resolve_manifest(&self) -> Result<Option<Arc<VersionManifest>>> {
        if !self.is_supported_platform() {
            tracing::debug!(
                platform = %self.platform,
                "manifest lookup skipped on unsupported platform"
            );
            return Ok(None);
        }

        self.cache.get_or_try_init(|| self.scan()).await.cloned()
    }

    /// User-agent derived from the installed manifest, or the fallback.
    pub async fn resolve_user_agent(&self) -> String {
        match self.resolve_manifest().await {
            Ok(Some(manifest)) if manifest.has_user_agent() => manifest.user_agent.clone(),
            Ok(Some(_)) => {
                tracing::debug!("manifest has no version, using fallback user-agent");
                self.config.fallback_user_agent.clone()
            }
            Ok(None) => self.config.fallback_user_agent.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "manifest lookup failed, using fallback user-agent");
                self.config.fallback_user_agent.clone()
            }
        }
    }

    async fn scan(&self) -> Result<Option<Arc<VersionManifest>>> {
        let dir = &self.config.directory;
        let mut names =
            self.fs
                .list_entries(dir)
                .await
                .map_err(|source| ManifestError::ListDirectory {
                    path: dir.display().to_string(),
                    source,
                })?;

        let suffix = format!(".{}", self.config.extension);
        names.retain(|name| name.ends_with(&suffix));
        names.sort();

        for name in names {
            let path = self.fs.join(dir, &name);
            match self.load_entry(&path).await {
                Ok(record) if record.is_product(&self.config.product_name) => {
                    let manifest = VersionManifest::from_record(record, &self.config.product_name);
                    tracing::info!(
                        path = %path.display(),
                        version = %manifest.app_version_string,
                        "resolved product manifest"
                    );
                    return Ok(Some(Arc::new(manifest)));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load manifest entry, skipping"
                    );
                }
            }
        }

        tracing::debug!(
            dir = %dir.display(),
            product = %self.config.product_name,
            "no matching manifest found"
        );
        Ok(None)
    }

    async fn load_entry(&self, path: &Path) -> Result<ManifestRecord> {
        let content = self
            .fs
            .read_text(path)
            .await
            .map_err(|source| ManifestError::ReadEntry {
                path: path.display().to_string(),
                source,
            })?;

        ManifestRecord::parse(&content).map_err(|source| ManifestError::ParseEntry {
            path: path.display().to_string(),
            source,
        })
    }
}
